// State - État du ledger en mémoire (balances, staking, collatéral)
use super::ExecutionError;
use crate::contracts::{CollateralAccountant, StakingLedger};
use crate::genesis::LedgerConfig;
use crate::staking::{InterestRateTable, StakingAccount};
use crate::types::{AccountInfo, Address, BlockNumber, Drip};
use std::collections::BTreeMap;
use tracing::info;

/// État complet du ledger.
///
/// Appliqué strictement séquentiellement, une transaction à la fois, dans
/// l'ordre canonique des blocs. Aucune synchronisation interne.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerState {
    config: LedgerConfig,
    accounts: BTreeMap<Address, AccountInfo>,
    staking: StakingLedger,
    collateral: CollateralAccountant,
    block_number: BlockNumber,
}

impl LedgerState {
    /// Construit l'état genesis depuis la configuration
    pub fn genesis(config: LedgerConfig) -> Result<Self, ExecutionError> {
        let mut state = Self::empty(config)?;

        for account in state.config.genesis.accounts.clone() {
            state
                .accounts
                .insert(account.address, AccountInfo::with_balance(account.balance));
        }

        info!(
            accounts = state.accounts.len(),
            table_len = state.staking.table().len(),
            "ledger genesis built"
        );
        Ok(state)
    }

    /// État vide (sans comptes genesis), utilisé au rechargement
    pub fn empty(config: LedgerConfig) -> Result<Self, ExecutionError> {
        config.validate()?;
        let table = InterestRateTable::with_max_height(
            config.interest.epoch_blocks,
            config.interest.table_len,
            config.interest.max_height,
        )?;

        Ok(Self {
            staking: StakingLedger::new(table, config.min_deposit),
            collateral: CollateralAccountant::new(config.collateral_unit_in_drip),
            accounts: BTreeMap::new(),
            block_number: 0,
            config,
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn block_number(&self) -> BlockNumber {
        self.block_number
    }

    /// Passe au bloc `height` (et allonge la table d'intérêts si besoin)
    pub fn begin_block(&mut self, height: BlockNumber) -> Result<(), ExecutionError> {
        if height < self.block_number {
            return Err(ExecutionError::BlockOutOfOrder {
                current: self.block_number,
                received: height,
            });
        }
        self.staking.ensure_height(height)?;
        self.block_number = height;
        Ok(())
    }

    pub fn account(&self, address: &Address) -> AccountInfo {
        self.accounts.get(address).cloned().unwrap_or_default()
    }

    pub fn balance(&self, address: &Address) -> Drip {
        self.accounts
            .get(address)
            .map(|a| a.balance)
            .unwrap_or_default()
    }

    pub fn set_account(&mut self, address: Address, info: AccountInfo) {
        self.accounts.insert(address, info);
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &AccountInfo)> {
        self.accounts.iter()
    }

    pub fn staking(&self) -> &StakingLedger {
        &self.staking
    }

    pub fn staking_mut(&mut self) -> &mut StakingLedger {
        &mut self.staking
    }

    pub fn collateral(&self) -> &CollateralAccountant {
        &self.collateral
    }

    pub fn collateral_mut(&mut self) -> &mut CollateralAccountant {
        &mut self.collateral
    }

    /// Restaure la hauteur courante (chargement depuis le stockage)
    pub fn set_block_number(&mut self, height: BlockNumber) {
        self.block_number = height;
    }

    /// Capture l'état des adresses touchées par une transaction
    pub fn checkpoint(&self, addresses: &[Address]) -> Checkpoint {
        Checkpoint {
            entries: addresses
                .iter()
                .map(|address| CheckpointEntry {
                    address: *address,
                    account: self.accounts.get(address).cloned(),
                    staking: self.staking.get_account(address).cloned(),
                    collateral: self.collateral.collateral_of(address),
                })
                .collect(),
        }
    }

    /// Revient à un checkpoint: annule toute mutation des adresses capturées
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        for entry in checkpoint.entries {
            match entry.account {
                Some(info) => {
                    self.accounts.insert(entry.address, info);
                }
                None => {
                    self.accounts.remove(&entry.address);
                }
            }
            match entry.staking {
                Some(account) => self.staking.insert_account(account),
                None => self.staking.remove_account(&entry.address),
            }
            self.collateral.insert(entry.address, entry.collateral);
        }
    }
}

/// Copie de l'état de quelques adresses, pour annuler une transaction échouée
#[derive(Debug, Clone)]
pub struct Checkpoint {
    entries: Vec<CheckpointEntry>,
}

#[derive(Debug, Clone)]
struct CheckpointEntry {
    address: Address,
    account: Option<AccountInfo>,
    staking: Option<StakingAccount>,
    collateral: Drip,
}
