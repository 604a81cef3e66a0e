// Gas - Facturation des transactions
// Le gas maximal est prélevé avant l'appel, le solde est remboursé après.
use crate::types::Drip;

/// Limite de gas par défaut d'un bloc
pub const DEFAULT_BLOCK_GAS_LIMIT: u64 = 30_000_000;

/// Table des coûts
pub mod costs {
    /// Transfert de valeur
    pub const TRANSFER: u64 = 21_000;

    /// Appel du contrat interne de staking
    pub const STAKING_CALL: u64 = 41_000;

    /// Écriture d'une entrée de liste (dépôt ou verrou)
    pub const STAKING_RECORD_WRITE: u64 = 5_000;

    /// Création de contrat, plus un coût par unité de stockage
    pub const CONTRACT_CREATE: u64 = 53_000;
    pub const STORAGE_UNIT: u64 = 20;
}

/// Gas facturé en fin d'exécution.
///
/// Succès: au plus un quart de la limite est remboursé, soit
/// `max(gas_used, gas_limit - gas_limit / 4)`.
/// Échec: toute la limite est facturée.
pub fn charged_gas(gas_limit: u64, gas_used: u64, succeeded: bool) -> u64 {
    if !succeeded {
        return gas_limit;
    }
    let floor = gas_limit - gas_limit / 4;
    gas_used.clamp(floor, gas_limit)
}

/// Règlement d'une transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settlement {
    pub gas_charged: u64,
    pub fee: Drip,
}

/// Compteur de gas d'une transaction
#[derive(Debug, Clone)]
pub struct GasMeter {
    limit: u64,
    used: u64,
    price: u64,
}

impl GasMeter {
    pub fn new(limit: u64, price: u64) -> Self {
        Self {
            limit,
            used: 0,
            price,
        }
    }

    /// Consomme `amount`; en cas d'échec rien n'est consommé
    pub fn consume(&mut self, amount: u64) -> Result<(), GasError> {
        let used = self.used.checked_add(amount).ok_or(GasError::Overflow)?;
        if used > self.limit {
            return Err(GasError::OutOfGas {
                needed: amount,
                remaining: self.remaining(),
            });
        }
        self.used = used;
        Ok(())
    }

    /// Coût d'un déploiement occupant `units` unités de stockage
    pub fn consume_deployment(&mut self, units: u64) -> Result<(), GasError> {
        let storage = costs::STORAGE_UNIT
            .checked_mul(units)
            .ok_or(GasError::Overflow)?;
        let total = costs::CONTRACT_CREATE
            .checked_add(storage)
            .ok_or(GasError::Overflow)?;
        self.consume(total)
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Gas et frais finalement facturés
    pub fn settle(&self, succeeded: bool) -> Settlement {
        let gas_charged = charged_gas(self.limit, self.used, succeeded);
        Settlement {
            gas_charged,
            fee: Drip::from(gas_charged) * Drip::from(self.price),
        }
    }
}

/// Gas cumulé d'un bloc
#[derive(Debug)]
pub struct BlockGasMeter {
    limit: u64,
    used: u64,
}

impl BlockGasMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    /// La limite de gas de la transaction tient-elle dans le reste du bloc?
    pub fn can_fit_transaction(&self, tx_gas_limit: u64) -> bool {
        tx_gas_limit <= self.remaining()
    }

    /// Enregistre le gas facturé à une transaction incluse
    pub fn record_transaction(&mut self, gas_charged: u64) -> Result<(), GasError> {
        if gas_charged > self.remaining() {
            return Err(GasError::BlockGasLimitExceeded {
                limit: self.limit,
                used: self.used.saturating_add(gas_charged),
            });
        }
        self.used += gas_charged;
        Ok(())
    }

    pub fn remaining(&self) -> u64 {
        self.limit.saturating_sub(self.used)
    }

    pub fn used(&self) -> u64 {
        self.used
    }
}

/// Erreurs de gas
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GasError {
    #[error("Gas insuffisant: besoin de {needed}, reste {remaining}")]
    OutOfGas { needed: u64, remaining: u64 },

    #[error("Limite de gas du bloc dépassée: limite {limit}, utilisé {used}")]
    BlockGasLimitExceeded { limit: u64, used: u64 },

    #[error("Dépassement dans le calcul du gas")]
    Overflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_is_all_or_nothing() {
        let mut meter = GasMeter::new(50_000, 1);
        meter.consume(costs::TRANSFER).unwrap();
        assert_eq!(meter.remaining(), 29_000);

        assert_eq!(
            meter.consume(costs::TRANSFER * 2),
            Err(GasError::OutOfGas {
                needed: 42_000,
                remaining: 29_000
            })
        );
        assert_eq!(meter.used(), costs::TRANSFER);
    }

    #[test]
    fn test_charged_gas_refunds_at_most_a_quarter() {
        // Limite énorme, faible usage: 3/4 de la limite
        assert_eq!(charged_gas(3_000_000, 41_000, true), 2_250_000);
        assert_eq!(charged_gas(100_000, 90_000, true), 90_000);
        assert_eq!(charged_gas(3_000_000, 41_000, false), 3_000_000);
    }

    #[test]
    fn test_settle_applies_price() {
        let mut meter = GasMeter::new(1_000, 10);
        meter.consume(100).unwrap();

        assert_eq!(
            meter.settle(true),
            Settlement {
                gas_charged: 750,
                fee: Drip::from(7_500u64)
            }
        );
        assert_eq!(meter.settle(false).fee, Drip::from(10_000u64));
    }

    #[test]
    fn test_deployment_cost_scales_with_storage() {
        let mut meter = GasMeter::new(u64::MAX, 1);
        meter.consume_deployment(5_696).unwrap();
        assert_eq!(meter.used(), costs::CONTRACT_CREATE + 5_696 * costs::STORAGE_UNIT);

        assert_eq!(
            GasMeter::new(u64::MAX, 1).consume_deployment(u64::MAX),
            Err(GasError::Overflow)
        );
    }

    #[test]
    fn test_block_meter_tracks_charged_gas() {
        let mut block = BlockGasMeter::new(10_000);
        assert!(block.can_fit_transaction(10_000));

        block.record_transaction(7_500).unwrap();
        assert!(!block.can_fit_transaction(3_000));
        assert!(block.can_fit_transaction(2_500));
        assert!(matches!(
            block.record_transaction(3_000),
            Err(GasError::BlockGasLimitExceeded { .. })
        ));
        assert_eq!(block.used(), 7_500);
    }
}
