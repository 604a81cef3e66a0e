// Primitives - Types fondamentaux du ledger
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Hash universel (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash des données avec Blake3
    pub fn hash(data: &[u8]) -> Self {
        let hash = blake3::hash(data);
        Hash(*hash.as_bytes())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

/// Montant monétaire en Drip (entier non signé 256 bits)
pub type Drip = U256;

/// Numéro de bloc
pub type BlockNumber = u64;

/// Nonce pour prévenir replay attacks
pub type Nonce = u64;

/// 1 token = 10^18 Drip
pub const DRIP_PER_TOKEN: u64 = 1_000_000_000_000_000_000;

/// Collatéral réservé par unité de stockage: 1/1024 token
pub const COLLATERAL_UNIT_IN_DRIP: u64 = DRIP_PER_TOKEN / 1024;

/// Convertit un nombre de tokens entiers en Drip.
/// Overflow impossible: u64 × 10^18 < 2^128.
pub fn tokens(amount: u64) -> Drip {
    U256::from(amount) * U256::from(DRIP_PER_TOKEN)
}
