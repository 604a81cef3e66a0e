// Deposit - Liste ordonnée des dépôts d'un compte (retrait FIFO)
use super::interest::InterestRateTable;
use super::StakingError;
use crate::types::{BlockNumber, Drip};
use serde::{Deserialize, Serialize};

/// Un dépôt: montant restant et hauteur du dépôt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositRecord {
    pub amount: Drip,
    pub deposit_block: BlockNumber,
}

/// Dépôts d'un compte, du plus ancien au plus récent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositLedger {
    records: Vec<DepositRecord>,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute un dépôt en fin de liste
    pub fn deposit(&mut self, amount: Drip, at_block: BlockNumber) -> Result<(), StakingError> {
        if amount.is_zero() {
            return Err(StakingError::InvalidAmount);
        }
        self.total_deposited()
            .checked_add(amount)
            .ok_or(StakingError::ArithmeticOverflow)?;

        self.records.push(DepositRecord {
            amount,
            deposit_block: at_block,
        });
        Ok(())
    }

    /// Consomme `amount` en commençant par le dépôt le plus ancien.
    /// Retourne la somme des intérêts des portions consommées.
    ///
    /// La liste n'est modifiée qu'une fois le calcul complet: en cas d'erreur elle reste intacte.
    pub fn withdraw(
        &mut self,
        amount: Drip,
        at_block: BlockNumber,
        table: &InterestRateTable,
    ) -> Result<Drip, StakingError> {
        if amount.is_zero() {
            return Err(StakingError::InvalidAmount);
        }

        let available = self.total_deposited();
        if available < amount {
            return Err(StakingError::InsufficientDeposit {
                requested: amount,
                available,
            });
        }

        let mut remaining = amount;
        let mut interest = Drip::zero();
        let mut consumed = 0usize;
        let mut head = None;

        for record in &self.records {
            if remaining.is_zero() {
                break;
            }

            let take = remaining.min(record.amount);
            let earned = table.interest(take, record.deposit_block, at_block)?;
            interest = interest
                .checked_add(earned)
                .ok_or(StakingError::ArithmeticOverflow)?;
            remaining -= take;

            if take == record.amount {
                consumed += 1;
            } else {
                head = Some(DepositRecord {
                    amount: record.amount - take,
                    deposit_block: record.deposit_block,
                });
            }
        }

        self.records.drain(..consumed);
        if let Some(partial) = head {
            self.records[0] = partial;
        }

        Ok(interest)
    }

    /// Somme des montants restants (bornée par construction à 2^256 - 1)
    pub fn total_deposited(&self) -> Drip {
        self.records
            .iter()
            .fold(Drip::zero(), |acc, r| acc.saturating_add(r.amount))
    }

    pub fn records(&self) -> &[DepositRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
