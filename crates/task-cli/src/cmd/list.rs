//! `task-cli list`: print tasks, optionally filtered by status.

use super::Context;
use crate::output::{OutputMode, Renderable, pretty_kv, pretty_rule, render_list};
use chrono::{DateTime, SecondsFormat, Utc};
use clap::Args;
use std::io::{self, Write};
use task_core::Task;
use tracing::debug;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show tasks with this status: todo, in-progress, done.
    pub status: Option<String>,

    /// Words after the status are accepted and ignored.
    #[arg(hide = true)]
    pub rest: Vec<String>,
}

pub fn run_list(args: &ListArgs, ctx: &Context) -> anyhow::Result<()> {
    if !args.rest.is_empty() {
        debug!(ignored = ?args.rest, "ignoring extra list arguments");
    }
    let tasks = ctx.store.list(args.status.as_deref())?;

    if tasks.is_empty() && ctx.output == OutputMode::Pretty {
        println!("No tasks found.");
        return Ok(());
    }
    render_list(&tasks, ctx.output)?;
    Ok(())
}

fn stamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl Renderable for Task {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        pretty_kv(w, "ID", &self.id)?;
        pretty_kv(w, "Description", &self.description)?;
        pretty_kv(w, "Status", self.status.as_str())?;
        pretty_kv(w, "Created", stamp(&self.created_at))?;
        pretty_kv(w, "Updated", stamp(&self.updated_at))?;
        pretty_rule(w)
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *w, self)?;
        writeln!(w)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(
            w,
            "{}  {}  {}  {}  {}",
            self.id,
            self.status,
            stamp(&self.created_at),
            stamp(&self.updated_at),
            self.description
        )
    }

    fn table_headers() -> &'static [&'static str] {
        &["ID", "STATUS", "CREATED", "UPDATED", "DESCRIPTION"]
    }
}
