// State - Persistance de l'état du ledger
use super::db::{Batch, Database, DatabaseError};
use crate::execution::{ExecutionError, LedgerState};
use crate::genesis::LedgerConfig;
use crate::staking::{InterestRateTable, StakingAccount};
use crate::types::{AccountInfo, Address, BlockNumber, Drip};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

const PREFIX_ACCOUNT: &[u8] = b"account:";
const PREFIX_STAKING: &[u8] = b"staking:";
const PREFIX_COLLATERAL: &[u8] = b"collateral:";
const KEY_BEST_BLOCK: &[u8] = b"best_block";
const KEY_INTEREST_TABLE: &[u8] = b"interest_table";

fn key(prefix: &[u8], address: &Address) -> Vec<u8> {
    [prefix, address.as_bytes()].concat()
}

fn parse_address(suffix: &[u8]) -> Result<Address, StateError> {
    let bytes: [u8; 20] = suffix
        .try_into()
        .map_err(|_| StateError::InvalidKey(hex::encode(suffix)))?;
    Ok(Address::from_bytes(bytes))
}

/// Stockage persistant d'un `LedgerState`.
///
/// Chaque adresse est une clé par préfixe (`account:`, `staking:`,
/// `collateral:`), plus `best_block` et les checkpoints de la table
/// d'intérêts. Un commit est un seul batch RocksDB: l'état relu est
/// toujours celui d'un bloc complet.
pub struct StateStore {
    db: Database,
}

impl StateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Dernier bloc persisté
    pub fn best_block(&self) -> Result<Option<BlockNumber>, StateError> {
        Ok(self.db.read(KEY_BEST_BLOCK)?)
    }

    /// Persiste l'état complet de façon atomique
    pub fn commit(&self, state: &LedgerState) -> Result<(), StateError> {
        let mut batch = Batch::new();

        self.stage(
            &mut batch,
            PREFIX_ACCOUNT,
            state.accounts().map(|(address, info)| (*address, info)),
        )?;
        self.stage(
            &mut batch,
            PREFIX_STAKING,
            state.staking().accounts().map(|account| (account.address(), account)),
        )?;
        self.stage(
            &mut batch,
            PREFIX_COLLATERAL,
            state.collateral().entries().map(|(address, amount)| (*address, amount)),
        )?;
        batch.put(KEY_INTEREST_TABLE, state.staking().table())?;
        batch.put(KEY_BEST_BLOCK, &state.block_number())?;

        let ops = self.db.write(batch)?;
        info!(block = state.block_number(), ops, "ledger state committed");
        Ok(())
    }

    /// Écrit les entrées vivantes d'un préfixe et supprime les autres
    fn stage<'a, T: Serialize + 'a>(
        &self,
        batch: &mut Batch,
        prefix: &[u8],
        entries: impl Iterator<Item = (Address, &'a T)>,
    ) -> Result<(), StateError> {
        let mut live = BTreeSet::new();
        for (address, value) in entries {
            batch.put(&key(prefix, &address), value)?;
            live.insert(address);
        }
        for stored in self.db.keys_with_prefix(prefix)? {
            if !live.contains(&parse_address(&stored[prefix.len()..])?) {
                batch.delete(&stored);
            }
        }
        Ok(())
    }

    /// Recharge l'état persisté, `None` si la base est vide.
    ///
    /// Chaque compte de staking est vérifié: clé cohérente avec l'adresse,
    /// staking égal à la somme des dépôts, verrous actifs couverts.
    pub fn load(&self, config: LedgerConfig) -> Result<Option<LedgerState>, StateError> {
        let Some(best_block) = self.best_block()? else {
            return Ok(None);
        };

        let mut state = LedgerState::empty(config)?;
        if let Some(table) = self.stored_table(state.config())? {
            state.staking_mut().replace_table(table);
        }
        state.begin_block(best_block)?;

        for (suffix, info) in self.db.read_prefix::<AccountInfo>(PREFIX_ACCOUNT)? {
            state.set_account(parse_address(&suffix)?, info);
        }
        for (suffix, account) in self.db.read_prefix::<StakingAccount>(PREFIX_STAKING)? {
            let address = parse_address(&suffix)?;
            if account.address() != address {
                return Err(StateError::CorruptRecord {
                    address,
                    reason: format!("record belongs to {}", account.address()),
                });
            }
            if !account.check_invariants(best_block) {
                return Err(StateError::CorruptRecord {
                    address,
                    reason: "staking balance does not match deposits and locks".into(),
                });
            }
            state.staking_mut().insert_account(account);
        }
        for (suffix, amount) in self.db.read_prefix::<Drip>(PREFIX_COLLATERAL)? {
            state.collateral_mut().insert(parse_address(&suffix)?, amount);
        }

        debug!(best_block, "ledger state loaded");
        Ok(Some(state))
    }

    /// Table d'intérêts persistée, si elle correspond à la configuration
    fn stored_table(&self, config: &LedgerConfig) -> Result<Option<InterestRateTable>, StateError> {
        let Some(table) = self.db.read::<InterestRateTable>(KEY_INTEREST_TABLE)? else {
            return Ok(None);
        };
        let matches = table.is_consistent()
            && table.len() >= config.interest.table_len as u64
            && table.epoch_blocks() == config.interest.epoch_blocks
            && table.max_height() == config.interest.max_height;
        if !matches {
            warn!("stored interest table does not match configuration, recomputing");
            return Ok(None);
        }
        Ok(Some(table))
    }

    /// Recharge l'état persisté ou construit le genesis
    pub fn load_or_genesis(&self, config: LedgerConfig) -> Result<LedgerState, StateError> {
        match self.load(config.clone())? {
            Some(state) => Ok(state),
            None => {
                info!("empty database, building genesis state");
                Ok(LedgerState::genesis(config)?)
            }
        }
    }
}

/// Erreurs de l'état persisté
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Erreur de base de données: {0}")]
    Database(#[from] DatabaseError),

    #[error("Clé invalide: {0}")]
    InvalidKey(String),

    #[error("Enregistrement corrompu pour {address}: {reason}")]
    CorruptRecord { address: Address, reason: String },

    #[error("État invalide: {0}")]
    Execution(#[from] ExecutionError),
}
