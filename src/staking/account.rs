// StakingAccount - Balance de staking + dépôts + verrous d'un compte
use super::deposit::DepositLedger;
use super::interest::InterestRateTable;
use super::vote_lock::VoteLockLedger;
use super::StakingError;
use crate::types::{Address, BlockNumber, Drip};
use serde::{Deserialize, Serialize};

/// Compte de staking.
///
/// INVARIANT: `staking_balance == deposits.total_deposited()`
/// INVARIANT: `locks.locked_amount(b) <= staking_balance` pour tout bloc `b`
/// postérieur à la dernière mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingAccount {
    address: Address,
    staking_balance: Drip,
    deposits: DepositLedger,
    locks: VoteLockLedger,
}

impl StakingAccount {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            staking_balance: Drip::zero(),
            deposits: DepositLedger::new(),
            locks: VoteLockLedger::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn staking_balance(&self) -> Drip {
        self.staking_balance
    }

    pub fn deposits(&self) -> &DepositLedger {
        &self.deposits
    }

    pub fn locks(&self) -> &VoteLockLedger {
        &self.locks
    }

    /// Montant retirable à `at_block`
    pub fn withdrawable(&self, at_block: BlockNumber) -> Drip {
        self.staking_balance
            .saturating_sub(self.locks.locked_amount(at_block))
    }

    /// Dépose `amount` dans le staking
    pub fn deposit(&mut self, amount: Drip, at_block: BlockNumber) -> Result<(), StakingError> {
        if amount.is_zero() {
            return Err(StakingError::InvalidAmount);
        }
        let new_balance = self
            .staking_balance
            .checked_add(amount)
            .ok_or(StakingError::ArithmeticOverflow)?;

        self.deposits.deposit(amount, at_block)?;
        self.staking_balance = new_balance;
        Ok(())
    }

    /// Retire `amount` du staking et retourne les intérêts dus.
    /// Les intérêts sont crédités par l'appelant sur la balance libre.
    pub fn withdraw(
        &mut self,
        amount: Drip,
        at_block: BlockNumber,
        table: &InterestRateTable,
    ) -> Result<Drip, StakingError> {
        if amount.is_zero() {
            return Err(StakingError::InvalidAmount);
        }

        let available = self.withdrawable(at_block);
        if amount > available {
            return Err(StakingError::WithdrawalExceedsAvailable {
                requested: amount,
                available,
            });
        }

        let interest = self.deposits.withdraw(amount, at_block, table)?;
        // amount <= available <= staking_balance
        self.staking_balance -= amount;
        self.locks.prune_expired(at_block);
        Ok(interest)
    }

    /// Verrouille `amount` du staking jusqu'à `unlock_block`
    pub fn vote_lock(
        &mut self,
        amount: Drip,
        unlock_block: BlockNumber,
        at_block: BlockNumber,
    ) -> Result<(), StakingError> {
        if amount > self.staking_balance {
            return Err(StakingError::LockExceedsBalance {
                requested: amount,
                balance: self.staking_balance,
            });
        }

        let mut locks = self.locks.clone();
        locks.vote_lock(amount, unlock_block, at_block)?;

        // Les verrous s'additionnent entre hauteurs: le total actif ne doit
        // jamais dépasser le staking, sinon le retirable deviendrait négatif.
        if locks.locked_amount(at_block) > self.staking_balance {
            return Err(StakingError::LockExceedsBalance {
                requested: amount,
                balance: self.staking_balance,
            });
        }

        self.locks = locks;
        Ok(())
    }

    /// Vérifie les invariants du compte (utilisé par les tests et au chargement)
    pub fn check_invariants(&self, at_block: BlockNumber) -> bool {
        self.staking_balance == self.deposits.total_deposited()
            && self.locks.locked_amount(at_block) <= self.staking_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tokens;
    use primitive_types::U256;

    fn account() -> StakingAccount {
        StakingAccount::new(Address::from_bytes([7; 20]))
    }

    fn e17(n: u64) -> Drip {
        U256::from(n) * U256::exp10(17)
    }

    fn table() -> InterestRateTable {
        InterestRateTable::production().unwrap()
    }

    #[test]
    fn test_deposit_updates_balance_and_list() {
        let mut acc = account();
        acc.deposit(tokens(1), 2).unwrap();
        assert_eq!(acc.staking_balance(), tokens(1));
        assert_eq!(acc.deposits().len(), 1);
        assert!(acc.check_invariants(2));
    }

    #[test]
    fn test_deposit_overflow() {
        let mut acc = account();
        acc.deposit(U256::MAX, 1).unwrap();
        let before = acc.clone();
        assert_eq!(acc.deposit(U256::one(), 2), Err(StakingError::ArithmeticOverflow));
        assert_eq!(acc, before);
    }

    #[test]
    fn test_withdraw_respects_lock() {
        let table = table();
        let mut acc = account();
        acc.deposit(tokens(1), 2).unwrap();
        acc.withdraw(e17(5), 3, &table).unwrap();
        acc.vote_lock(e17(4), 100_000, 4).unwrap();

        assert_eq!(acc.withdrawable(5), e17(1));

        let before = acc.clone();
        assert_eq!(
            acc.withdraw(e17(5), 5, &table),
            Err(StakingError::WithdrawalExceedsAvailable {
                requested: e17(5),
                available: e17(1),
            })
        );
        assert_eq!(acc, before);

        assert!(acc.withdraw(e17(1) + U256::one(), 6, &table).is_err());
        assert_eq!(acc, before);

        acc.withdraw(e17(1), 7, &table).unwrap();
        assert_eq!(acc.staking_balance(), e17(4));
        assert_eq!(acc.withdrawable(7), U256::zero());
        assert!(acc.check_invariants(7));
    }

    #[test]
    fn test_lock_releases_after_unlock_block() {
        let table = table();
        let mut acc = account();
        acc.deposit(tokens(1), 1).unwrap();
        acc.vote_lock(tokens(1), 10, 1).unwrap();

        assert!(acc.withdraw(tokens(1), 9, &table).is_err());
        acc.withdraw(tokens(1), 10, &table).unwrap();
        assert_eq!(acc.staking_balance(), U256::zero());
        assert!(acc.locks().is_empty());
    }

    #[test]
    fn test_lock_exceeding_balance_rejected() {
        let mut acc = account();
        acc.deposit(e17(5), 1).unwrap();
        let before = acc.clone();

        assert_eq!(
            acc.vote_lock(e17(6), 100, 1),
            Err(StakingError::LockExceedsBalance { requested: e17(6), balance: e17(5) })
        );
        assert_eq!(acc, before);
    }

    #[test]
    fn test_cumulative_locks_bounded_by_balance() {
        let mut acc = account();
        acc.deposit(e17(5), 1).unwrap();
        acc.vote_lock(e17(4), 100, 1).unwrap();

        // 4 + 2 > 5 at distinct heights
        assert!(matches!(
            acc.vote_lock(e17(2), 200, 1),
            Err(StakingError::LockExceedsBalance { .. })
        ));
        // Same height only raises to max(4, 5)
        acc.vote_lock(e17(5), 100, 1).unwrap();
        assert_eq!(acc.locks().locked_amount(1), e17(5));
        assert!(acc.check_invariants(1));
    }

    #[test]
    fn test_invalid_lock_leaves_account_unchanged() {
        let mut acc = account();
        acc.deposit(tokens(1), 1).unwrap();
        let before = acc.clone();
        assert!(matches!(acc.vote_lock(tokens(1), 5, 5), Err(StakingError::InvalidLock { .. })));
        assert_eq!(acc, before);
    }
}
