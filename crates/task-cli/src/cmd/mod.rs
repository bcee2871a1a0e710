pub mod add;
pub mod completions;
pub mod delete;
pub mod list;
pub mod mark;
pub mod update;

use crate::output::{OutputMode, render, render_warning, write_success};
use serde::Serialize;
use task_core::{Task, TaskStore};

/// Everything a command handler needs besides its own arguments.
#[derive(Debug)]
pub struct Context {
    pub store: TaskStore,
    pub output: OutputMode,
    pub quiet: bool,
}

/// JSON payload for commands that target one task by id.
#[derive(Debug, Serialize)]
pub struct MutationReport<'a> {
    pub action: &'static str,
    pub id: &'a str,
    pub matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<&'a Task>,
}

/// Report the outcome of an id-targeted mutation.
///
/// An unmatched id is not an error: human modes get a warning on stderr,
/// JSON gets `"matched": false`, and the exit status stays zero.
pub fn report_mutation(
    ctx: &Context,
    action: &'static str,
    id: &str,
    task: Option<&Task>,
    confirmation: &str,
) -> anyhow::Result<()> {
    let report = MutationReport {
        action,
        id,
        matched: task.is_some(),
        task,
    };

    if !report.matched {
        render_warning(ctx.output, &format!("no task with id '{id}'"))?;
    }

    if ctx.quiet && !ctx.output.is_json() {
        return Ok(());
    }

    render(ctx.output, &report, |r, w| {
        if r.matched {
            write_success(w, confirmation)
        } else {
            Ok(())
        }
    })
}

/// Join positional words the way a shell user typed them.
pub fn join_words(words: &[String]) -> String {
    words.join(" ")
}
