// Staking Ledger - Staking, verrous de vote et collatéral de stockage
// Principe: déterministe, séquentiel, tout-ou-rien par transaction

pub mod cli;
pub mod contracts;
pub mod execution;
pub mod genesis;
pub mod rpc;
pub mod staking;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;
