// Tests module
// Scenarios: staking deposit/withdraw/vote lock, storage collateral
// Invariants: ledger properties under random operation sequences
// Persistence: commit/reload through RocksDB

pub mod storage_collateral;
pub mod ledger_invariants;
