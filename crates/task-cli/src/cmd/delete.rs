//! `task-cli delete`: remove a task from the list.

use super::{Context, report_mutation};
use clap::Args;

#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Task ID to delete.
    pub id: String,
}

pub fn run_delete(args: &DeleteArgs, ctx: &Context) -> anyhow::Result<()> {
    let removed = ctx.store.delete(&args.id)?;
    report_mutation(
        ctx,
        "delete",
        &args.id,
        removed.as_ref(),
        &format!("Task {} deleted", args.id),
    )
}
