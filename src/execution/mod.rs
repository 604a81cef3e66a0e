// Execution - Application déterministe des transactions au ledger
// Principe: une transaction à la fois, dans l'ordre canonique du bloc

pub mod executor;
pub mod gas;
pub mod state;

pub use executor::{apply_block, Receipt, ReceiptStatus, TransactionExecutor};
pub use state::{Checkpoint, LedgerState};

use crate::contracts::CollateralError;
use crate::genesis::ConfigError;
use crate::staking::StakingError;
use crate::types::{AccountError, Address, BlockNumber, Drip, Nonce};
use gas::GasError;

/// Erreurs d'exécution.
///
/// Les variantes "non exécutées" (nonce, fonds pour le gas, place dans le
/// bloc) rejettent la transaction sans frais. Les autres sont levées après
/// prélèvement du gas: l'état est annulé mais le gas reste facturé.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExecutionError {
    #[error("Nonce invalide: attendu {expected}, reçu {got}")]
    NonceMismatch { expected: Nonce, got: Nonce },

    #[error("Fonds insuffisants pour gas + valeur: requis={required}, disponible={available}")]
    NotEnoughCash { required: Drip, available: Drip },

    #[error("Plus de place dans le bloc: gas demandé {requested}, restant {remaining}")]
    BlockGasLimitReached { requested: u64, remaining: u64 },

    #[error("Bloc {received} antérieur au bloc courant {current}")]
    BlockOutOfOrder {
        current: BlockNumber,
        received: BlockNumber,
    },

    #[error("Destinataire invalide pour {call}: {receiver:?}")]
    InvalidReceiver {
        call: &'static str,
        receiver: Option<Address>,
    },

    #[error("Le contrat de staking n'accepte pas de valeur")]
    ValueNotAccepted,

    #[error("Stockage demandé {units} supérieur à la limite {limit}")]
    ExceedsStorageLimit { units: u64, limit: u64 },

    #[error("Staking: {0}")]
    Staking(#[from] StakingError),

    #[error("Collatéral: {0}")]
    Collateral(#[from] CollateralError),

    #[error("Compte: {0}")]
    Account(#[from] AccountError),

    #[error("Gas: {0}")]
    Gas(#[from] GasError),

    #[error("Configuration: {0}")]
    Config(#[from] ConfigError),
}
