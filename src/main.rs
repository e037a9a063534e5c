use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxwatch::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for fxwatch::AppCommand {
    fn from(cmd: Commands) -> fxwatch::AppCommand {
        match cmd {
            Commands::Run { dry_run } => fxwatch::AppCommand::Run { dry_run },
            Commands::Watch {
                interval_minutes,
                dry_run,
            } => fxwatch::AppCommand::Watch {
                interval_minutes,
                dry_run,
            },
            Commands::History { limit } => fxwatch::AppCommand::History { limit },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch rates once and report if they changed
    Run {
        /// Always report, never store the fetched rates
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a rates update on a fixed interval until interrupted
    Watch {
        /// Minutes between updates
        #[arg(short, long, default_value_t = 30)]
        interval_minutes: u64,

        /// Always report, never store the fetched rates
        #[arg(long)]
        dry_run: bool,
    },
    /// Display stored rates with their metrics
    History {
        /// Show only the most recent N rates
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxwatch::cli::setup::setup(),
        Some(cmd) => fxwatch::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
