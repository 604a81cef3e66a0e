// Runner - Exécution des commandes du ledger
// Principle: Load, apply, commit, report

use crate::cli::config::load_blocks;
use crate::cli::{QueryCmd, ReplayCmd, TableCmd};
use crate::execution::{apply_block, ExecutionError, LedgerState, ReceiptStatus};
use crate::genesis::{ConfigError, LedgerConfig};
use crate::rpc::{AccountView, DepositInfo, JsonRpcRequest, JsonRpcResponse, RpcMethods, VoteStakeInfo};
use crate::staking::{InterestRateTable, StakingError};
use crate::storage::{Database, StateError, StateStore};
use crate::types::{Address, BlockNumber, Drip, Transaction};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Résultat d'un replay
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySummary {
    pub block_number: BlockNumber,
    pub executed: usize,
    pub failed: usize,
    pub not_executed: usize,
    pub accounts: Vec<AccountSummary>,
}

/// État final d'un compte
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub address: Address,
    #[serde(flatten)]
    pub account: AccountView,
    pub deposit_list: Vec<DepositInfo>,
    pub vote_list: Vec<VoteStakeInfo>,
}

impl AccountSummary {
    fn of(state: &LedgerState, address: Address) -> Self {
        let staking = state.staking();
        Self {
            address,
            account: AccountView::new(
                &state.account(&address),
                staking.query_staking_balance(&address),
                state.collateral().collateral_of(&address),
            ),
            deposit_list: staking
                .query_deposit_list(&address)
                .iter()
                .map(|record| DepositInfo::from_record(record, staking.table()))
                .collect(),
            vote_list: staking
                .query_vote_list(&address)
                .iter()
                .map(VoteStakeInfo::from)
                .collect(),
        }
    }
}

/// Entrée de la table d'intérêts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableEntry {
    pub block: BlockNumber,
    pub rate: Drip,
}

fn open_store(path: &Path) -> Result<StateStore, RunnerError> {
    std::fs::create_dir_all(path)
        .map_err(|e| RunnerError::Io(format!("Failed to create data dir: {}", e)))?;
    let db = Database::open(path).map_err(StateError::from)?;
    Ok(StateStore::new(db))
}

fn load_config(path: &Path) -> Result<LedgerConfig, RunnerError> {
    let path = path
        .to_str()
        .ok_or_else(|| RunnerError::Io(format!("Non UTF-8 path: {}", path.display())))?;
    Ok(LedgerConfig::from_file(path)?)
}

/// Rejoue les blocs d'un fichier et résume l'état final
pub fn run_replay(cmd: &ReplayCmd) -> Result<ReplaySummary, RunnerError> {
    let config = load_config(&cmd.config)?;
    let blocks = load_blocks(&cmd.blocks)?;

    let store = cmd.db.as_deref().map(open_store).transpose()?;
    let mut state = match &store {
        Some(store) => store.load_or_genesis(config)?,
        None => LedgerState::genesis(config)?,
    };
    info!(blocks = blocks.len(), start = state.block_number(), "replaying blocks");

    let (mut executed, mut failed, mut not_executed) = (0, 0, 0);
    for block in &blocks {
        let txs: Vec<Transaction> = block.transactions.iter().map(|tx| tx.to_transaction()).collect();
        let receipts = apply_block(&mut state, block.number, &txs)?;

        for receipt in &receipts {
            match receipt.status {
                ReceiptStatus::Success => {
                    executed += 1;
                    info!(
                        block = block.number,
                        tx = %receipt.tx_hash,
                        fee = %receipt.fee_paid,
                        interest = %receipt.interest_paid,
                        "transaction executed"
                    );
                }
                ReceiptStatus::Failed => {
                    failed += 1;
                    warn!(block = block.number, tx = %receipt.tx_hash, error = ?receipt.error, "transaction failed");
                }
                ReceiptStatus::NotExecuted => {
                    not_executed += 1;
                    warn!(block = block.number, tx = %receipt.tx_hash, error = ?receipt.error, "transaction not executed");
                }
            }
        }

        if let Some(store) = &store {
            store.commit(&state)?;
        }
    }

    let accounts = state
        .accounts()
        .map(|(address, _)| AccountSummary::of(&state, *address))
        .collect();

    Ok(ReplaySummary {
        block_number: state.block_number(),
        executed,
        failed,
        not_executed,
        accounts,
    })
}

/// Répond à une requête RPC sur l'état persisté
pub fn run_query(cmd: &QueryCmd) -> Result<JsonRpcResponse, RunnerError> {
    let config = load_config(&cmd.config)?;
    let store = open_store(&cmd.db)?;
    let state = store
        .load(config)?
        .ok_or_else(|| RunnerError::EmptyDatabase(cmd.db.display().to_string()))?;

    let params = match &cmd.address {
        Some(address) => serde_json::json!([address]),
        None => serde_json::json!([]),
    };
    Ok(RpcMethods::new(&state).handle_request(JsonRpcRequest::new(1, &cmd.method, params)))
}

/// Premières entrées de la table d'intérêts cumulés
pub fn run_table(cmd: &TableCmd) -> Result<Vec<TableEntry>, RunnerError> {
    let table = InterestRateTable::compute(cmd.epoch_blocks, cmd.len)?;
    (0..table.len())
        .map(|block| {
            Ok(TableEntry {
                block,
                rate: table.rate_at(block)?,
            })
        })
        .collect()
}

/// Runner errors
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] StateError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Interest table error: {0}")]
    Table(#[from] StakingError),

    #[error("No ledger state in {0}")]
    EmptyDatabase(String),
}
