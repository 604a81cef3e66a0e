// Staking - Ledger de staking: dépôts, verrous de vote, intérêts
// Principe: arithmétique exacte, déterministe, rejouable

pub mod account;
pub mod deposit;
pub mod interest;
pub mod vote_lock;

pub use account::StakingAccount;
pub use deposit::{DepositLedger, DepositRecord};
pub use interest::InterestRateTable;
pub use vote_lock::{VoteLockLedger, VoteLockRecord};

use crate::types::{BlockNumber, Drip};

/// Erreurs du ledger de staking.
///
/// Toute erreur laisse le compte concerné strictement inchangé.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StakingError {
    #[error("Montant invalide (zéro ou sous le minimum)")]
    InvalidAmount,

    #[error("Dépôts insuffisants: demandé={requested}, disponible={available}")]
    InsufficientDeposit { requested: Drip, available: Drip },

    #[error("Retrait supérieur au montant retirable: demandé={requested}, retirable={available}")]
    WithdrawalExceedsAvailable { requested: Drip, available: Drip },

    #[error("Verrou supérieur au staking: demandé={requested}, staking={balance}")]
    LockExceedsBalance { requested: Drip, balance: Drip },

    #[error("Hauteur de déverrouillage {unlock_block} non future (bloc courant {current_block})")]
    InvalidLock {
        unlock_block: BlockNumber,
        current_block: BlockNumber,
    },

    #[error("Dépassement arithmétique (256 bits)")]
    ArithmeticOverflow,

    #[error("Bloc {block} hors de la table d'intérêts (hauteur couverte {covered})")]
    BlockBeyondInterestTable {
        block: BlockNumber,
        covered: BlockNumber,
    },

    #[error("Configuration d'intérêt invalide")]
    InvalidInterestConfig,
}
