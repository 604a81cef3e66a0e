// Genesis - Configuration du ledger et comptes initiaux
pub mod config;
pub mod spec;

pub use config::{ConfigError, InterestConfig, LedgerConfig};
pub use spec::{GenesisAccount, GenesisBuilder, GenesisSpec};
