// CLI - Command Line Interface for the ledger node
// Principle: Simple, clear, composable commands

pub mod config;
pub mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ledger node - staking, vote locks and storage collateral
#[derive(Parser, Debug)]
#[command(name = "ledger-node")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic staking and storage-collateral ledger")]
#[command(long_about = r#"
Replays blocks of transactions against the staking ledger and answers
read-only queries on the resulting state.

Replay blocks and persist the state:
  ledger-node replay --config ledger.json --blocks blocks.json --db ./data

Query a persisted state:
  ledger-node query --config ledger.json --db ./data --method cfx_getVoteList --address 0x...

Print the accumulated interest table:
  ledger-node table --len 10
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", env = "LEDGER_LOG")]
    pub log_level: String,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply blocks of transactions to the ledger
    Replay(ReplayCmd),

    /// Answer one RPC query against a persisted ledger
    Query(QueryCmd),

    /// Print accumulated interest table entries
    Table(TableCmd),
}

/// Replay blocks
#[derive(Parser, Debug)]
pub struct ReplayCmd {
    /// Ledger configuration (JSON)
    #[arg(long, env = "LEDGER_CONFIG")]
    pub config: PathBuf,

    /// Blocks to apply (JSON array of blocks)
    #[arg(long)]
    pub blocks: PathBuf,

    /// Database path (state is committed after every block)
    #[arg(short = 'd', long, env = "LEDGER_DB")]
    pub db: Option<PathBuf>,
}

/// Query a persisted ledger
#[derive(Parser, Debug)]
pub struct QueryCmd {
    /// Ledger configuration (JSON)
    #[arg(long, env = "LEDGER_CONFIG")]
    pub config: PathBuf,

    /// Database path
    #[arg(short = 'd', long, env = "LEDGER_DB")]
    pub db: PathBuf,

    /// RPC method (e.g. cfx_getStakingBalance)
    #[arg(long)]
    pub method: String,

    /// Account address
    #[arg(long)]
    pub address: Option<String>,
}

/// Print the interest table
#[derive(Parser, Debug)]
pub struct TableCmd {
    /// Number of entries
    #[arg(long, default_value = "10")]
    pub len: usize,

    /// Blocks per year
    #[arg(long, default_value = "63072000")]
    pub epoch_blocks: u64,
}
