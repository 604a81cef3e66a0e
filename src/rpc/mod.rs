// RPC - Requêtes JSON-RPC sur l'état du ledger (sans transport)

pub mod methods;
pub mod types;

pub use methods::RpcMethods;
pub use types::*;
