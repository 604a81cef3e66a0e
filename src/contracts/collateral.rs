// Collateral - Collatéral de stockage réservé sur la balance
use crate::types::{Address, Drip, COLLATERAL_UNIT_IN_DRIP};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Comptabilité du collatéral de stockage.
///
/// INVARIANT: `collateral[address] == unités occupées × unit_in_drip`.
/// Le collatéral est réservé (ni dépensable ni brûlé).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralAccountant {
    unit_in_drip: Drip,
    collateral: BTreeMap<Address, Drip>,
}

impl CollateralAccountant {
    pub fn new(unit_in_drip: Drip) -> Self {
        Self {
            unit_in_drip,
            collateral: BTreeMap::new(),
        }
    }

    pub fn unit_in_drip(&self) -> Drip {
        self.unit_in_drip
    }

    /// Collatéral exigé pour `units` unités de stockage
    pub fn collateral_for(&self, units: u64) -> Result<Drip, CollateralError> {
        self.unit_in_drip
            .checked_mul(Drip::from(units))
            .ok_or(CollateralError::ArithmeticOverflow)
    }

    /// Réserve le collatéral de `units` unités pour `address`.
    /// Retourne le montant réservé; la balance est débitée par l'appelant.
    pub fn charge_for_storage(&mut self, address: Address, units: u64) -> Result<Drip, CollateralError> {
        let charged = self.collateral_for(units)?;
        let current = self.collateral_of(&address);
        let updated = current
            .checked_add(charged)
            .ok_or(CollateralError::ArithmeticOverflow)?;

        if !charged.is_zero() {
            tracing::debug!(%address, units, %charged, "storage collateral charged");
            self.collateral.insert(address, updated);
        }
        Ok(charged)
    }

    /// Collatéral courant de `address`
    pub fn collateral_of(&self, address: &Address) -> Drip {
        self.collateral.get(address).copied().unwrap_or_default()
    }

    /// Restaure une entrée (chargement depuis le stockage ou annulation)
    pub fn insert(&mut self, address: Address, collateral: Drip) {
        if collateral.is_zero() {
            self.collateral.remove(&address);
        } else {
            self.collateral.insert(address, collateral);
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Address, &Drip)> {
        self.collateral.iter()
    }

    /// Collatéral total réservé
    pub fn total(&self) -> Drip {
        self.collateral
            .values()
            .fold(Drip::zero(), |acc, c| acc.saturating_add(*c))
    }
}

impl Default for CollateralAccountant {
    fn default() -> Self {
        Self::new(Drip::from(COLLATERAL_UNIT_IN_DRIP))
    }
}

/// Erreurs de collatéral
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollateralError {
    #[error("Dépassement arithmétique du collatéral")]
    ArithmeticOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;
    use primitive_types::U256;

    fn alice() -> Address {
        Address::from_bytes([1; 20])
    }

    #[test]
    fn test_deployment_collateral_is_exact() {
        let mut accountant = CollateralAccountant::default();
        let units = 512 * 11 + 64;

        let c0 = accountant.collateral_of(&alice());
        let charged = accountant.charge_for_storage(alice(), units).unwrap();
        let c1 = accountant.collateral_of(&alice());

        assert_eq!(charged, U256::from(units) * U256::from(COLLATERAL_UNIT_IN_DRIP));
        assert_eq!(c1 - c0, U256::from(5_696u64) * U256::from(976_562_500_000_000u64));
    }

    #[test]
    fn test_charges_accumulate() {
        let mut accountant = CollateralAccountant::default();
        accountant.charge_for_storage(alice(), 10).unwrap();
        accountant.charge_for_storage(alice(), 6).unwrap();
        assert_eq!(
            accountant.collateral_of(&alice()),
            U256::from(16u64) * U256::from(COLLATERAL_UNIT_IN_DRIP)
        );
        assert_eq!(accountant.total(), accountant.collateral_of(&alice()));
    }

    #[test]
    fn test_zero_units_charges_nothing() {
        let mut accountant = CollateralAccountant::default();
        assert_eq!(accountant.charge_for_storage(alice(), 0).unwrap(), U256::zero());
        assert_eq!(accountant.entries().count(), 0);
    }

    #[test]
    fn test_overflow_leaves_collateral_unchanged() {
        let mut accountant = CollateralAccountant::new(U256::MAX / U256::from(2u64));
        accountant.charge_for_storage(alice(), 2).unwrap();
        let before = accountant.collateral_of(&alice());
        assert_eq!(
            accountant.charge_for_storage(alice(), 1),
            Err(CollateralError::ArithmeticOverflow)
        );
        assert_eq!(accountant.collateral_of(&alice()), before);
    }
}
