//! Command-line entry point for herald
//!
//! - `run`: deliver the configured list, resuming from its checkpoint
//! - `check`: load and validate the list without sending anything
//! - `status`: show the checkpoint of the configured list
//! - `reset`: forget the checkpoint so the next run starts over

#[cfg(not(any(target_os = "macos", unix)))]
compile_error!("Only macos and unix are currently supported");

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use herald::{Herald, exit_code, find_config_file};
use herald_checkpoint::ListKey;
use herald_common::logging;

/// Resumable bulk dispatch to Telegram
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(about = "Resumable bulk dispatch to Telegram", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Deliver every item not yet covered by the checkpoint
    Run,
    /// Load and validate the item list only
    Check,
    /// Show checkpoint progress for the configured list
    Status,
    /// Clear the checkpoint for the configured list
    Reset,
}

fn load_config(cli: &Cli) -> anyhow::Result<Herald> {
    let path = find_config_file(cli.config.as_deref())?;
    Herald::from_file(&path)
}

async fn execute(cli: Cli) -> anyhow::Result<u8> {
    let herald = load_config(&cli)?;

    match cli.command {
        Commands::Run => {
            let summary = herald.run().await?;
            println!("{summary}");
            Ok(exit_code(&summary.status))
        }
        Commands::Check => {
            let list = herald.load()?;
            println!(
                "{}: {} items OK (checkpoint {})",
                list.label(),
                list.len(),
                ListKey::derive(&list)
            );
            Ok(0)
        }
        Commands::Status => {
            let (list, key, checkpoint) = herald.status().await?;
            let next = checkpoint.next_index().min(list.len());

            println!("List:           {} ({} items)", list.label(), list.len());
            println!("Checkpoint:     {key}");
            match checkpoint.last_completed() {
                Some(index) => println!("Last completed: #{index}"),
                None => println!("Last completed: none"),
            }
            println!("Remaining:      {}", list.len() - next);
            if !checkpoint.failed().is_empty() {
                println!("Failed items:   {:?}", checkpoint.failed());
            }
            Ok(0)
        }
        Commands::Reset => {
            let key = herald.reset().await?;
            println!("Cleared checkpoint {key}");
            Ok(0)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    match execute(Cli::parse()).await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
