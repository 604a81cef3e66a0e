// CLI Configuration - Fichiers d'entrée du replay
// Principle: Clear mapping between user input and ledger transactions

use crate::genesis::ConfigError;
use crate::types::{Address, BlockNumber, Drip, Nonce, Transaction, TransactionCall, CONTRACT_DEFAULT_GAS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Bloc à rejouer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInput {
    pub number: BlockNumber,
    #[serde(default)]
    pub transactions: Vec<TransactionInput>,
}

/// Transaction telle qu'écrite dans le fichier de blocs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionInput {
    pub sender: Address,
    pub nonce: Nonce,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: Drip,
    #[serde(default = "default_gas")]
    pub gas: u64,
    #[serde(default = "default_gas_price")]
    pub gas_price: u64,
    #[serde(default)]
    pub storage_limit: u64,
    #[serde(default = "default_call")]
    pub call: TransactionCall,
}

fn default_gas() -> u64 {
    CONTRACT_DEFAULT_GAS
}

fn default_gas_price() -> u64 {
    1
}

fn default_call() -> TransactionCall {
    TransactionCall::Transfer
}

impl TransactionInput {
    pub fn to_transaction(&self) -> Transaction {
        let mut builder = Transaction::builder(self.sender)
            .nonce(self.nonce)
            .value(self.value)
            .gas(self.gas)
            .gas_price(self.gas_price)
            .storage_limit(self.storage_limit)
            .call(self.call.clone());
        if let Some(to) = self.to {
            builder = builder.to(to);
        }
        builder.build()
    }
}

/// Charge un fichier de blocs (tableau JSON), trié par hauteur croissante
pub fn load_blocks(path: &Path) -> Result<Vec<BlockInput>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
    let blocks: Vec<BlockInput> =
        serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    if let Some(pair) = blocks.windows(2).find(|pair| pair[1].number < pair[0].number) {
        return Err(ConfigError::Invalid(format!(
            "block {} listed after block {}",
            pair[1].number, pair[0].number
        )));
    }
    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{tokens, STAKING_CONTRACT_ADDRESS};
    use tempfile::TempDir;

    #[test]
    fn test_transaction_input_defaults() {
        let json = r#"{
            "sender": "0x0101010101010101010101010101010101010101",
            "nonce": 0,
            "call": { "type": "stakingDeposit", "amount": "0xde0b6b3a7640000" }
        }"#;
        let input: TransactionInput = serde_json::from_str(json).unwrap();
        let tx = input.to_transaction();

        assert_eq!(tx.gas(), CONTRACT_DEFAULT_GAS);
        assert_eq!(tx.gas_price(), 1);
        assert_eq!(tx.receiver(), Some(STAKING_CONTRACT_ADDRESS));
        assert_eq!(tx.call(), &TransactionCall::StakingDeposit { amount: tokens(1) });
    }

    #[test]
    fn test_load_blocks_rejects_unordered() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blocks.json");
        std::fs::write(&path, r#"[{ "number": 5 }, { "number": 3 }]"#).unwrap();

        assert!(matches!(load_blocks(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_blocks() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blocks.json");
        std::fs::write(&path, r#"[{ "number": 1, "transactions": [] }, { "number": 1 }]"#).unwrap();

        let blocks = load_blocks(&path).unwrap();
        assert_eq!(blocks.len(), 2);
        assert!(blocks[1].transactions.is_empty());
    }
}
