// Staking - Contrat interne de staking (dépôt, retrait, verrou de vote)
use crate::staking::{
    DepositRecord, InterestRateTable, StakingAccount, StakingError, VoteLockRecord,
};
use crate::types::{Address, BlockNumber, Drip};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Registre de staking: tous les comptes de staking + table d'intérêts
///
/// # Thread Safety
/// Pas de synchronisation interne. Les transactions sont appliquées
/// séquentiellement dans l'ordre canonique du bloc: un seul écrivain.
///
/// Chaque `apply_*` travaille sur une copie du compte et ne l'écrit qu'en cas
/// de succès: une transaction rejetée ne modifie rien.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingLedger {
    accounts: BTreeMap<Address, StakingAccount>,
    table: InterestRateTable,
    min_deposit: Drip,
}

impl StakingLedger {
    pub fn new(table: InterestRateTable, min_deposit: Drip) -> Self {
        Self {
            accounts: BTreeMap::new(),
            table,
            min_deposit,
        }
    }

    pub fn table(&self) -> &InterestRateTable {
        &self.table
    }

    /// Remplace la table d'intérêts (relue depuis le stockage)
    pub fn replace_table(&mut self, table: InterestRateTable) {
        self.table = table;
    }

    /// Allonge la table d'intérêts jusqu'à `height`
    pub fn ensure_height(&mut self, height: BlockNumber) -> Result<(), StakingError> {
        self.table.extend_to(height)
    }

    /// Dépose `amount` dans le staking de `address`
    pub fn apply_deposit(
        &mut self,
        address: Address,
        amount: Drip,
        block: BlockNumber,
    ) -> Result<(), StakingError> {
        if amount.is_zero() || amount < self.min_deposit {
            return Err(StakingError::InvalidAmount);
        }

        let mut account = self.account_or_default(&address);
        account.deposit(amount, block)?;

        debug!(%address, %amount, block, "staking deposit");
        self.accounts.insert(address, account);
        Ok(())
    }

    /// Retire `amount` du staking de `address`.
    /// Retourne (nouvelle balance de staking, intérêts payés).
    pub fn apply_withdraw(
        &mut self,
        address: Address,
        amount: Drip,
        block: BlockNumber,
    ) -> Result<(Drip, Drip), StakingError> {
        let mut account = self.account_or_default(&address);
        let interest = account.withdraw(amount, block, &self.table)?;
        let new_balance = account.staking_balance();

        info!(%address, %amount, %interest, block, "staking withdraw");
        self.accounts.insert(address, account);
        Ok((new_balance, interest))
    }

    /// Verrouille `amount` du staking de `address` jusqu'à `unlock_block`
    pub fn apply_vote_lock(
        &mut self,
        address: Address,
        amount: Drip,
        unlock_block: BlockNumber,
        block: BlockNumber,
    ) -> Result<(), StakingError> {
        let mut account = self.account_or_default(&address);
        account.vote_lock(amount, unlock_block, block)?;

        debug!(%address, %amount, unlock_block, block, "vote lock");
        self.accounts.insert(address, account);
        Ok(())
    }

    /// Balance de staking
    pub fn query_staking_balance(&self, address: &Address) -> Drip {
        self.accounts
            .get(address)
            .map(StakingAccount::staking_balance)
            .unwrap_or_default()
    }

    /// Verrous de vote, dans l'ordre de création
    pub fn query_vote_list(&self, address: &Address) -> Vec<VoteLockRecord> {
        self.accounts
            .get(address)
            .map(|a| a.locks().all_locks().to_vec())
            .unwrap_or_default()
    }

    /// Dépôts, du plus ancien au plus récent
    pub fn query_deposit_list(&self, address: &Address) -> Vec<DepositRecord> {
        self.accounts
            .get(address)
            .map(|a| a.deposits().records().to_vec())
            .unwrap_or_default()
    }

    /// Montant retirable à `block`
    pub fn query_withdrawable(&self, address: &Address, block: BlockNumber) -> Drip {
        self.accounts
            .get(address)
            .map(|a| a.withdrawable(block))
            .unwrap_or_default()
    }

    pub fn get_account(&self, address: &Address) -> Option<&StakingAccount> {
        self.accounts.get(address)
    }

    /// Restaure un compte (chargement depuis le stockage)
    pub fn insert_account(&mut self, account: StakingAccount) {
        self.accounts.insert(account.address(), account);
    }

    pub fn remove_account(&mut self, address: &Address) {
        self.accounts.remove(address);
    }

    pub fn accounts(&self) -> impl Iterator<Item = &StakingAccount> {
        self.accounts.values()
    }

    /// Staking total, tous comptes confondus
    pub fn total_staked(&self) -> Drip {
        self.accounts
            .values()
            .fold(Drip::zero(), |acc, a| acc.saturating_add(a.staking_balance()))
    }

    fn account_or_default(&self, address: &Address) -> StakingAccount {
        self.accounts
            .get(address)
            .cloned()
            .unwrap_or_else(|| StakingAccount::new(*address))
    }
}
