// Types fondamentaux du ledger

pub mod primitives;
pub mod account;
pub mod transaction;

pub use primitives::*;
pub use account::*;
pub use transaction::*;
