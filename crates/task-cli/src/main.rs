#![forbid(unsafe_code)]

mod cmd;
mod output;

use anyhow::Context as _;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Args, CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error};
use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use task_core::config;
use task_core::error::ErrorCode;
use task_core::{Status, TaskStore};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "task-cli: track tasks in a local JSON file",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Task file to use (overrides TASK_CLI_FILE and the config file).
    #[arg(long, global = true, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (alias for --format json).
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Suppress success confirmations.
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Task(TaskCommand),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    task-cli completions bash"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

#[derive(Subcommand, Debug)]
enum TaskCommand {
    #[command(
        about = "Add a new task",
        after_help = "EXAMPLES:\n    # Add a task\n    task-cli add Buy groceries\n\n    # Emit machine-readable output\n    task-cli --json add Buy groceries"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        about = "Replace a task's description",
        after_help = "EXAMPLES:\n    # Reword a task\n    task-cli update 8337423512038847 Buy groceries and cook dinner"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(
        about = "Mark a task as in progress",
        after_help = "EXAMPLES:\n    task-cli mark-in-progress 8337423512038847"
    )]
    MarkInProgress(cmd::mark::MarkArgs),

    #[command(
        about = "Mark a task as done",
        after_help = "EXAMPLES:\n    task-cli mark-done 8337423512038847"
    )]
    MarkDone(cmd::mark::MarkArgs),

    #[command(
        about = "Delete a task",
        after_help = "EXAMPLES:\n    task-cli delete 8337423512038847"
    )]
    Delete(cmd::delete::DeleteArgs),

    #[command(
        about = "List tasks",
        long_about = "List all tasks, or only those with the given status (todo, in-progress, done).",
        after_help = "EXAMPLES:\n    # Everything\n    task-cli list\n\n    # Only finished work\n    task-cli list done\n\n    # Emit machine-readable output\n    task-cli list --json"
    )]
    List(cmd::list::ListArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("TASK_CLI_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "task_core=debug,task_cli=debug,info"
        } else {
            "task_core=warn,task_cli=warn,error"
        })
    });

    let format = env::var("TASK_CLI_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_ansi(std::io::stderr().is_terminal())
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

/// How a failed argument parse is reported.
#[derive(Debug, PartialEq, Eq)]
enum ParseFailure {
    /// `--help` / `--version`: clap's own output, exit 0.
    Informational,
    /// Missing command or required argument: usage on stdout, exit 1.
    Usage,
    /// Unrecognized command: a diagnostic on stdout, exit 0.
    UnknownCommand(String),
    /// Anything else: clap's default error, exit 2.
    Other,
}

fn classify_parse_error(err: &clap::Error) -> ParseFailure {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ParseFailure::Informational,
        ErrorKind::MissingRequiredArgument
        | ErrorKind::MissingSubcommand
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => ParseFailure::Usage,
        ErrorKind::InvalidSubcommand => {
            let name = match err.get(ContextKind::InvalidSubcommand) {
                Some(ContextValue::String(name)) => name.clone(),
                _ => String::new(),
            };
            ParseFailure::UnknownCommand(name)
        }
        _ => ParseFailure::Other,
    }
}

fn handle_parse_error(err: &clap::Error) -> ExitCode {
    match classify_parse_error(err) {
        ParseFailure::Informational => {
            let _ = err.print();
            ExitCode::SUCCESS
        }
        ParseFailure::Usage => {
            println!("{}", err.render());
            ExitCode::FAILURE
        }
        ParseFailure::UnknownCommand(name) => {
            println!("Unknown command: {name}");
            ExitCode::SUCCESS
        }
        ParseFailure::Other => {
            let _ = err.print();
            ExitCode::from(2)
        }
    }
}

fn build_context(global: &GlobalArgs) -> anyhow::Result<cmd::Context> {
    let config = config::load_user_config().context(ErrorCode::ConfigParseError)?;
    let output = output::resolve_output_mode(global.format, global.json, config.output.as_deref());
    let path = config::resolve_store_path(global.file.as_deref(), &config)?;
    debug!(path = %path.display(), ?output, "resolved task file");

    Ok(cmd::Context {
        store: TaskStore::new(path).with_lock_timeout(config.store.lock_timeout()),
        output,
        quiet: global.quiet,
    })
}

fn run_task_command(command: &TaskCommand, ctx: &cmd::Context) -> anyhow::Result<()> {
    match command {
        TaskCommand::Add(args) => cmd::add::run_add(args, ctx),
        TaskCommand::Update(args) => cmd::update::run_update(args, ctx),
        TaskCommand::MarkInProgress(args) => cmd::mark::run_mark(args, Status::InProgress, ctx),
        TaskCommand::MarkDone(args) => cmd::mark::run_mark(args, Status::Done, ctx),
        TaskCommand::Delete(args) => cmd::delete::run_delete(args, ctx),
        TaskCommand::List(args) => cmd::list::run_list(args, ctx),
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return handle_parse_error(&err),
    };

    init_tracing(cli.global.verbose);

    // Until the config file is read, errors render per the flags alone.
    let mut output = output::resolve_output_mode(cli.global.format, cli.global.json, None);

    let result = match &cli.command {
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
        Commands::Task(command) => build_context(&cli.global).and_then(|ctx| {
            output = ctx.output;
            run_task_command(command, &ctx)
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = render_error(output, &CliError::from_anyhow(&err));
            ExitCode::FAILURE
        }
    }
}
