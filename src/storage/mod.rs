// Storage - Couche de persistance (RocksDB)
// Principe: un commit par bloc, rechargement à l'identique

pub mod db;
pub mod state;

pub use db::{Batch, Database, DatabaseError};
pub use state::{StateError, StateStore};
