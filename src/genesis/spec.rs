// Spécification du genesis: comptes et balances initiales
use super::config::ConfigError;
use crate::types::{Address, Drip};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Spécification du genesis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisSpec {
    /// Comptes initiaux avec leurs balances
    #[serde(default)]
    pub accounts: Vec<GenesisAccount>,
}

/// Compte dans le genesis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: Address,
    pub balance: Drip,
}

impl GenesisSpec {
    pub fn builder() -> GenesisBuilder {
        GenesisBuilder::default()
    }

    /// Somme des balances initiales
    pub fn total_coin(&self) -> Result<Drip, ConfigError> {
        self.accounts.iter().try_fold(Drip::zero(), |acc, a| {
            acc.checked_add(a.balance)
                .ok_or_else(|| ConfigError::Invalid("genesis total coin overflows".into()))
        })
    }

    /// Pas de doublon, pas de dépassement
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for account in &self.accounts {
            if !seen.insert(account.address) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate genesis account {}",
                    account.address
                )));
            }
        }
        self.total_coin().map(|_| ())
    }
}

/// Constructeur de genesis
#[derive(Debug, Default)]
pub struct GenesisBuilder {
    accounts: Vec<GenesisAccount>,
}

impl GenesisBuilder {
    pub fn account(mut self, address: Address, balance: Drip) -> Self {
        self.accounts.push(GenesisAccount { address, balance });
        self
    }

    pub fn build(self) -> GenesisSpec {
        GenesisSpec {
            accounts: self.accounts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tokens;
    use primitive_types::U256;

    #[test]
    fn test_total_coin() {
        let spec = GenesisSpec::builder()
            .account(Address::from_bytes([1; 20]), tokens(5))
            .account(Address::from_bytes([2; 20]), tokens(20))
            .build();
        assert_eq!(spec.total_coin().unwrap(), tokens(25));
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_duplicate_account_rejected() {
        let spec = GenesisSpec::builder()
            .account(Address::from_bytes([1; 20]), tokens(1))
            .account(Address::from_bytes([1; 20]), tokens(2))
            .build();
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_total_coin_overflow_rejected() {
        let spec = GenesisSpec::builder()
            .account(Address::from_bytes([1; 20]), U256::MAX)
            .account(Address::from_bytes([2; 20]), U256::one())
            .build();
        assert!(spec.total_coin().is_err());
    }
}
