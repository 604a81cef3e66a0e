// Contracts - Contrats internes du ledger
// Principe: pas de VM, tout est codé en dur et auditable

pub mod collateral;
pub mod staking;

pub use collateral::{CollateralAccountant, CollateralError};
pub use staking::StakingLedger;
