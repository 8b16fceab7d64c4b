use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use relocate_core::{ExecutionResult, Session, TaskId};
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod config;
mod credentials;
mod output;
mod state;
mod todoist;

use config::load_config;
use todoist::TodoistClient;

#[derive(Parser, Debug)]
#[command(
    name = "relocate",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("RELOCATE_BUILD_SHA"), ")"),
    about = "Move today's tasks (with their subtasks) under a task in another project"
)]
struct Cli {
    #[command(flatten)]
    remote: RemoteArgs,

    /// Log debug output to stderr (RUST_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct RemoteArgs {
    /// Bearer token (default: the variable named by config `todoist.token_env`)
    #[arg(long, global = true)]
    token: Option<String>,

    /// API base URL (default: config `todoist.base_url`)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Send project and parent in one update call
    #[arg(long, global = true)]
    combined_updates: bool,

    /// Calendar date treated as today, YYYY-MM-DD (default: current UTC date)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tasks due today and their subtasks (move sources)
    Today,

    /// List top-level tasks (move destinations)
    Destinations,

    /// Move a today task and its subtasks under a destination task
    Move {
        /// Id of the task to move
        source: String,

        /// Id of the new parent task
        destination: String,

        /// Print the planned updates without applying them
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Print the execution result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Configuration file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config to ~/.relocate/config.toml
    Init,

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = load_config()?;
                println!("# {}", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::Today => {
            let mut session = open_session(&cli.remote)?;
            let snapshot = session.reload(today(&cli.remote)).await?;
            print!("{}", output::today_list(snapshot));
        }

        Command::Destinations => {
            let mut session = open_session(&cli.remote)?;
            let snapshot = session.reload(today(&cli.remote)).await?;
            print!("{}", output::destination_list(snapshot));
        }

        Command::Move {
            source,
            destination,
            dry_run,
            json,
        } => {
            let source = TaskId::new(source);
            let destination = TaskId::new(destination);
            run_move(&cli.remote, &source, &destination, dry_run, json).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn today(args: &RemoteArgs) -> NaiveDate {
    args.today.unwrap_or_else(|| Utc::now().date_naive())
}

fn open_session(args: &RemoteArgs) -> Result<Session<TodoistClient>> {
    let cfg = load_config()?.todoist;
    let token = credentials::resolve_token(args.token.clone(), &cfg.token_env);
    if token.is_none() {
        tracing::warn!(token_env = %cfg.token_env, "no access token configured");
    }

    let mode = if args.combined_updates {
        relocate_core::UpdateMode::Combined
    } else {
        cfg.update_mode()
    };
    let base_url = args.base_url.clone().unwrap_or(cfg.base_url);

    let client = TodoistClient::new(
        base_url,
        token,
        mode,
        Duration::from_secs(cfg.timeout_secs),
    )
    .context("building HTTP client")?;
    Ok(Session::new(client))
}

async fn run_move(
    args: &RemoteArgs,
    source: &TaskId,
    destination: &TaskId,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let day = today(args);
    let mut session = open_session(args)?;
    session.reload(day).await.context("loading tasks")?;

    if dry_run {
        let intents = session.plan(source, destination)?;
        let snapshot = session.snapshot()?;
        print!("{}", output::plan_summary(&intents, snapshot));
        return Ok(());
    }

    // Keep the pre-move snapshot for naming tasks in the report.
    let before = session.snapshot()?.clone();
    let status = |msg: &str| {
        let _ = write_status(msg, json, &mut std::io::stdout(), &mut std::io::stderr());
    };

    status("Moving...");
    let result = session.move_task(source, destination).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", output::result_summary(&result, &before));
    }

    match result {
        ExecutionResult::Succeeded { .. } => {
            status("Moved. Refreshing...");
            session.reload(day).await.context("refreshing after move")?;
            status("Move complete.");
            Ok(())
        }
        ExecutionResult::Failed { completed, .. } => {
            if let Err(e) = session.reload(day).await {
                tracing::warn!(error = %e, "refresh after failed move also failed");
            }
            bail!(
                "move stopped after {} completed update(s); review the tasks above and retry",
                completed.len()
            )
        }
    }
}

/// Progress lines go to stdout, or to stderr when stdout carries the JSON result.
fn write_status(
    msg: &str,
    json: bool,
    stdout: &mut impl Write,
    stderr: &mut impl Write,
) -> std::io::Result<()> {
    let out: &mut dyn Write = if json { stderr } else { stdout };
    writeln!(out, "{msg}")
}
