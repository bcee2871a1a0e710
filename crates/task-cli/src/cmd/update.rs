//! `task-cli update`: replace a task's description.

use super::{Context, join_words, report_mutation};
use clap::Args;
use task_core::TaskUpdate;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Task ID to update.
    pub id: String,

    /// New description; every remaining word is part of it. Omitting it
    /// clears the description.
    #[arg(
        num_args = 0..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "DESCRIPTION"
    )]
    pub description: Vec<String>,
}

pub fn run_update(args: &UpdateArgs, ctx: &Context) -> anyhow::Result<()> {
    let update = TaskUpdate::Description(join_words(&args.description));
    let task = ctx.store.update(&args.id, update)?;
    report_mutation(
        ctx,
        "update",
        &args.id,
        task.as_ref(),
        &format!("Task {} updated", args.id),
    )
}
