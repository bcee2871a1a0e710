//! `task-cli add`: append a new `todo` task.

use super::{Context, join_words};
use crate::output::{render, write_success};
use clap::Args;

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task description; every remaining word is part of it, even ones
    /// that look like flags.
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "DESCRIPTION"
    )]
    pub description: Vec<String>,
}

pub fn run_add(args: &AddArgs, ctx: &Context) -> anyhow::Result<()> {
    let task = ctx.store.add(&join_words(&args.description))?;

    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }
    render(ctx.output, &task, |t, w| {
        write_success(w, &format!("Task added successfully (ID: {})", t.id))
    })
}
