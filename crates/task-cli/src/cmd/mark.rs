//! `task-cli mark-in-progress` / `task-cli mark-done`: set a task's status.

use super::{Context, report_mutation};
use clap::Args;
use task_core::{Status, TaskUpdate};

#[derive(Args, Debug)]
pub struct MarkArgs {
    /// Task ID to transition.
    pub id: String,
}

pub fn run_mark(args: &MarkArgs, status: Status, ctx: &Context) -> anyhow::Result<()> {
    let task = ctx.store.update(&args.id, TaskUpdate::Status(status))?;
    report_mutation(
        ctx,
        "mark",
        &args.id,
        task.as_ref(),
        &format!("Task {} marked as {status}", args.id),
    )
}
