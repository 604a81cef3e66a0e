// Ledger Node - Entry point

use clap::Parser;
use staking_ledger::cli::runner::{run_query, run_replay, run_table};
use staking_ledger::cli::{Cli, Commands};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_filter = if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_str()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay(cmd) => {
            let summary = run_replay(&cmd).map_err(|e| {
                error!("Replay error: {}", e);
                anyhow::anyhow!("Replay error: {}", e)
            })?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Commands::Query(cmd) => {
            let response = run_query(&cmd).map_err(|e| {
                error!("Query error: {}", e);
                anyhow::anyhow!("Query error: {}", e)
            })?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Table(cmd) => {
            let entries = run_table(&cmd)?;
            for entry in entries {
                println!("{}\t{}", entry.block, entry.rate);
            }
        }
    }

    Ok(())
}
