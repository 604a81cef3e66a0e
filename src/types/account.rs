// Account - Adresses et comptes du ledger
use super::primitives::{Drip, Nonce};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Adresse de compte (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address([u8; 20]);

impl Address {
    pub const ZERO: Address = Address([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

/// Contrat interne de staking
pub const STAKING_CONTRACT_ADDRESS: Address = Address([
    0x08, 0x88, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x02,
]);

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }
}

impl FromStr for Address {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|_| AccountError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 20] = bytes
            .try_into()
            .map_err(|_| AccountError::InvalidAddress(s.to_string()))?;
        Ok(Address(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// État d'un compte: balance dépensable + nonce.
/// Le staking et le collatéral sont tenus par leurs propres registres.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Nonce pour prévenir replay
    pub nonce: Nonce,

    /// Balance libre
    pub balance: Drip,
}

impl AccountInfo {
    pub fn with_balance(balance: Drip) -> Self {
        Self { nonce: 0, balance }
    }

    /// Débite la balance
    pub fn debit(&mut self, amount: Drip) -> Result<(), AccountError> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(AccountError::InsufficientBalance {
                available: self.balance,
                required: amount,
            })?;
        Ok(())
    }

    /// Crédite la balance
    pub fn credit(&mut self, amount: Drip) -> Result<(), AccountError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(AccountError::BalanceOverflow)?;
        Ok(())
    }
}

/// Erreurs de compte
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("Balance insuffisante: disponible={available}, requis={required}")]
    InsufficientBalance { available: Drip, required: Drip },

    #[error("Dépassement de la balance (256 bits)")]
    BalanceOverflow,

    #[error("Adresse invalide: {0}")]
    InvalidAddress(String),
}
