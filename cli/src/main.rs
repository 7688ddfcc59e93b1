mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about = "Combat log analysis")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one event log and print a JSON report
    Analyze {
        /// JSON array of events
        #[arg(short, long)]
        events: PathBuf,
        /// TOML analysis config
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
    /// Analyze several event logs in parallel
    Batch {
        /// JSON event files
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
    },
}

fn run(cli: &Cli) -> Result<(), String> {
    match &cli.command {
        Commands::Analyze {
            events,
            config,
            pretty,
        } => commands::analyze(events, config.as_deref(), *pretty),
        Commands::Batch {
            files,
            config,
            pretty,
        } => commands::batch(files, config.as_deref(), *pretty),
    }
}

fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
