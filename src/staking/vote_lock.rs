// Vote lock - Verrous de vote sur le staking
//
// Politique de fusion:
// - même hauteur de déverrouillage: le verrou existant passe à max(existant, demandé)
// - nouvelle hauteur: un nouveau verrou est ajouté, les montants s'additionnent
// Les verrous expirés sont élagués à chaque mutation réussie.
use super::StakingError;
use crate::types::{BlockNumber, Drip};
use serde::{Deserialize, Serialize};

/// Un verrou: montant bloqué jusqu'à `unlock_block` (exclus)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteLockRecord {
    pub amount: Drip,
    pub unlock_block: BlockNumber,
}

impl VoteLockRecord {
    /// Le verrou est-il encore actif à `at_block`?
    pub fn is_active(&self, at_block: BlockNumber) -> bool {
        self.unlock_block > at_block
    }
}

/// Verrous d'un compte, dans l'ordre de création
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteLockLedger {
    records: Vec<VoteLockRecord>,
}

impl VoteLockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Verrouille `amount` jusqu'à `unlock_block`
    pub fn vote_lock(
        &mut self,
        amount: Drip,
        unlock_block: BlockNumber,
        current_block: BlockNumber,
    ) -> Result<(), StakingError> {
        if unlock_block <= current_block {
            return Err(StakingError::InvalidLock {
                unlock_block,
                current_block,
            });
        }
        if amount.is_zero() {
            return Err(StakingError::InvalidAmount);
        }

        let total = self
            .locked_amount(current_block)
            .checked_add(amount)
            .ok_or(StakingError::ArithmeticOverflow)?;

        self.prune_expired(current_block);

        match self
            .records
            .iter_mut()
            .find(|r| r.unlock_block == unlock_block)
        {
            Some(existing) => existing.amount = existing.amount.max(amount),
            None => {
                tracing::trace!(%total, unlock_block, "new vote lock height");
                self.records.push(VoteLockRecord {
                    amount,
                    unlock_block,
                });
            }
        }

        Ok(())
    }

    /// Montant verrouillé à `at_block`: somme des verrous encore actifs
    pub fn locked_amount(&self, at_block: BlockNumber) -> Drip {
        self.records
            .iter()
            .filter(|r| r.is_active(at_block))
            .fold(Drip::zero(), |acc, r| acc.saturating_add(r.amount))
    }

    /// Tous les verrous, dans l'ordre de création
    pub fn all_locks(&self) -> &[VoteLockRecord] {
        &self.records
    }

    /// Retire les verrous expirés à `at_block`
    pub fn prune_expired(&mut self, at_block: BlockNumber) {
        self.records.retain(|r| r.is_active(at_block));
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    fn drip(n: u64) -> Drip {
        U256::from(n)
    }

    #[test]
    fn test_unlock_must_be_in_future() {
        let mut ledger = VoteLockLedger::new();
        assert_eq!(
            ledger.vote_lock(drip(10), 5, 5),
            Err(StakingError::InvalidLock { unlock_block: 5, current_block: 5 })
        );
        assert_eq!(
            ledger.vote_lock(drip(10), 4, 5),
            Err(StakingError::InvalidLock { unlock_block: 4, current_block: 5 })
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_zero_lock_rejected() {
        let mut ledger = VoteLockLedger::new();
        assert_eq!(ledger.vote_lock(U256::zero(), 10, 1), Err(StakingError::InvalidAmount));
    }

    #[test]
    fn test_locked_amount_expires() {
        let mut ledger = VoteLockLedger::new();
        ledger.vote_lock(drip(400), 100_000, 4).unwrap();

        assert_eq!(ledger.locked_amount(4), drip(400));
        assert_eq!(ledger.locked_amount(99_999), drip(400));
        assert_eq!(ledger.locked_amount(100_000), U256::zero());
    }

    #[test]
    fn test_same_height_takes_max() {
        let mut ledger = VoteLockLedger::new();
        ledger.vote_lock(drip(400), 100, 1).unwrap();
        ledger.vote_lock(drip(300), 100, 2).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.locked_amount(2), drip(400));

        ledger.vote_lock(drip(500), 100, 3).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.locked_amount(3), drip(500));
    }

    #[test]
    fn test_new_height_is_additive() {
        let mut ledger = VoteLockLedger::new();
        ledger.vote_lock(drip(400), 100, 1).unwrap();
        ledger.vote_lock(drip(100), 200, 1).unwrap();

        assert_eq!(
            ledger.all_locks(),
            &[
                VoteLockRecord { amount: drip(400), unlock_block: 100 },
                VoteLockRecord { amount: drip(100), unlock_block: 200 },
            ]
        );
        assert_eq!(ledger.locked_amount(1), drip(500));
        assert_eq!(ledger.locked_amount(150), drip(100));
        assert_eq!(ledger.locked_amount(200), U256::zero());
    }

    /// Regression guard: a dominating-lock policy would report max(400, 100) here.
    #[test]
    fn test_locks_at_distinct_heights_are_not_max_merged() {
        let mut ledger = VoteLockLedger::new();
        ledger.vote_lock(drip(400), 100, 1).unwrap();
        ledger.vote_lock(drip(100), 50, 1).unwrap();

        let dominating = drip(400).max(drip(100));
        assert_ne!(ledger.locked_amount(1), dominating);
        assert_eq!(ledger.locked_amount(1), drip(500));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_expired_locks_pruned_on_mutation() {
        let mut ledger = VoteLockLedger::new();
        ledger.vote_lock(drip(10), 20, 1).unwrap();
        ledger.vote_lock(drip(20), 40, 1).unwrap();

        ledger.vote_lock(drip(30), 60, 25).unwrap();
        assert_eq!(
            ledger.all_locks(),
            &[
                VoteLockRecord { amount: drip(20), unlock_block: 40 },
                VoteLockRecord { amount: drip(30), unlock_block: 60 },
            ]
        );
    }

    #[test]
    fn test_relock_expired_height_creates_fresh_record() {
        let mut ledger = VoteLockLedger::new();
        ledger.vote_lock(drip(10), 20, 1).unwrap();
        ledger.vote_lock(drip(5), 30, 25).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.locked_amount(25), drip(5));
    }
}
