// Configuration du ledger - passée explicitement, aucun état global
use super::spec::GenesisSpec;
use crate::execution::gas::DEFAULT_BLOCK_GAS_LIMIT;
use crate::staking::interest::{BLOCKS_PER_YEAR, DEFAULT_MAX_HEIGHT, DEFAULT_TABLE_LEN};
use crate::types::{BlockNumber, Drip, COLLATERAL_UNIT_IN_DRIP};
use serde::{Deserialize, Serialize};

/// Configuration complète du ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerConfig {
    /// Configuration de la table d'intérêts
    #[serde(default)]
    pub interest: InterestConfig,

    /// Collatéral par unité de stockage (Drip)
    #[serde(default = "default_collateral_unit")]
    pub collateral_unit_in_drip: Drip,

    /// Dépôt minimal accepté par le contrat de staking
    #[serde(default = "default_min_deposit")]
    pub min_deposit: Drip,

    /// Limite de gas par bloc
    #[serde(default = "default_block_gas_limit")]
    pub block_gas_limit: u64,

    /// Comptes initiaux
    #[serde(default)]
    pub genesis: GenesisSpec,
}

/// Configuration de la table d'intérêts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterestConfig {
    /// Nombre de blocs d'une année
    pub epoch_blocks: u64,

    /// Nombre d'entrées précalculées
    pub table_len: usize,

    /// Hauteur au-delà de laquelle un bloc est refusé
    #[serde(default = "default_max_height")]
    pub max_height: BlockNumber,
}

fn default_max_height() -> BlockNumber {
    DEFAULT_MAX_HEIGHT
}

impl Default for InterestConfig {
    fn default() -> Self {
        Self {
            epoch_blocks: BLOCKS_PER_YEAR,
            table_len: DEFAULT_TABLE_LEN,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

fn default_collateral_unit() -> Drip {
    Drip::from(COLLATERAL_UNIT_IN_DRIP)
}

fn default_min_deposit() -> Drip {
    Drip::one()
}

fn default_block_gas_limit() -> u64 {
    DEFAULT_BLOCK_GAS_LIMIT
}

impl LedgerConfig {
    /// Configuration de production avec le genesis donné
    pub fn with_genesis(genesis: GenesisSpec) -> Self {
        Self {
            genesis,
            ..Self::default()
        }
    }

    /// Vérifie la cohérence de la configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interest.epoch_blocks == 0 {
            return Err(ConfigError::Invalid("interest.epochBlocks must be > 0".into()));
        }
        if self.interest.table_len == 0 {
            return Err(ConfigError::Invalid("interest.tableLen must be > 0".into()));
        }
        if (self.interest.table_len - 1) as BlockNumber > self.interest.max_height {
            return Err(ConfigError::Invalid(
                "interest.tableLen must not exceed interest.maxHeight + 1".into(),
            ));
        }
        if self.block_gas_limit == 0 {
            return Err(ConfigError::Invalid("blockGasLimit must be > 0".into()));
        }
        self.genesis.validate()
    }

    /// Charge depuis un fichier JSON
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sauvegarde vers un fichier JSON
    pub fn to_file(&self, path: &str) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::Io(e.to_string()))
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            interest: InterestConfig::default(),
            collateral_unit_in_drip: default_collateral_unit(),
            min_deposit: default_min_deposit(),
            block_gas_limit: default_block_gas_limit(),
            genesis: GenesisSpec::default(),
        }
    }
}

/// Erreurs de configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Erreur d'entrée/sortie: {0}")]
    Io(String),

    #[error("Configuration illisible: {0}")]
    Parse(String),

    #[error("Configuration invalide: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{tokens, Address};
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.interest.epoch_blocks, 63_072_000);
        assert_eq!(config.interest.table_len, 1001);
        assert_eq!(config.collateral_unit_in_drip, Drip::from(976_562_500_000_000u64));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "genesis": { "accounts": [
                { "address": "0x0101010101010101010101010101010101010101", "balance": "0x4563918244f40000" }
            ] }
        }"#;
        let config: LedgerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.interest, InterestConfig::default());
        assert_eq!(config.genesis.accounts.len(), 1);
        assert_eq!(config.genesis.accounts[0].address, Address::from_bytes([1; 20]));
        assert_eq!(config.genesis.accounts[0].balance, tokens(5));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.json");
        let path = path.to_str().unwrap();

        let config = LedgerConfig::with_genesis(
            GenesisSpec::builder()
                .account(Address::from_bytes([3; 20]), tokens(20))
                .build(),
        );
        config.to_file(path).unwrap();
        assert_eq!(LedgerConfig::from_file(path).unwrap(), config);
    }

    #[test]
    fn test_invalid_interest_rejected() {
        let mut config = LedgerConfig::default();
        config.interest.epoch_blocks = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = LedgerConfig::default();
        config.interest.max_height = 10;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_max_height_defaults_when_absent() {
        let json = r#"{ "interest": { "epochBlocks": 100, "tableLen": 10 } }"#;
        let config: LedgerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.interest.max_height, DEFAULT_MAX_HEIGHT);
        config.validate().unwrap();
    }
}
