// Database - Clés/valeurs RocksDB, valeurs encodées en bincode
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Clone)]
pub struct Database {
    db: Arc<DB>,
}

impl Database {
    /// Ouvre la base, la crée si absente
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DatabaseError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_keep_log_file_num(5);
        opts.set_max_background_jobs(2);

        let db = DB::open(&opts, path).map_err(|e| DatabaseError::OpenFailed(e.to_string()))?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Lit et décode la valeur d'une clé
    pub fn read<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>, DatabaseError> {
        self.db
            .get_pinned(key)
            .map_err(|e| DatabaseError::ReadFailed(e.to_string()))?
            .map(|raw| decode(&raw))
            .transpose()
    }

    /// Clés sous `prefix`, triées
    pub fn keys_with_prefix(&self, prefix: &[u8]) -> Result<Vec<Vec<u8>>, DatabaseError> {
        Ok(self
            .raw_prefix(prefix)?
            .into_iter()
            .map(|(key, _)| key)
            .collect())
    }

    /// Entrées décodées sous `prefix`, le préfixe retiré des clés
    pub fn read_prefix<T: DeserializeOwned>(
        &self,
        prefix: &[u8],
    ) -> Result<Vec<(Vec<u8>, T)>, DatabaseError> {
        self.raw_prefix(prefix)?
            .into_iter()
            .map(|(key, raw)| decode(&raw).map(|value| (key[prefix.len()..].to_vec(), value)))
            .collect()
    }

    fn raw_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, DatabaseError> {
        let mode = IteratorMode::From(prefix, Direction::Forward);
        let mut out = Vec::new();
        for item in self.db.iterator(mode) {
            let (key, value) = item.map_err(|e| DatabaseError::ReadFailed(e.to_string()))?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.into_vec(), value.into_vec()));
        }
        Ok(out)
    }

    /// Applique un lot d'écritures de façon atomique
    pub fn write(&self, batch: Batch) -> Result<usize, DatabaseError> {
        let count = batch.len;
        self.db
            .write(batch.inner)
            .map_err(|e| DatabaseError::WriteFailed(e.to_string()))?;
        Ok(count)
    }
}

/// Lot d'écritures atomique
#[derive(Default)]
pub struct Batch {
    inner: WriteBatch,
    len: usize,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put<T: Serialize>(&mut self, key: &[u8], value: &T) -> Result<(), DatabaseError> {
        self.inner.put(key, encode(value)?);
        self.len += 1;
        Ok(())
    }

    pub fn delete(&mut self, key: &[u8]) {
        self.inner.delete(key);
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, DatabaseError> {
    bincode::serialize(value).map_err(|e| DatabaseError::SerializationFailed(e.to_string()))
}

fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, DatabaseError> {
    bincode::deserialize(data).map_err(|e| DatabaseError::DeserializationFailed(e.to_string()))
}

/// Erreurs de base de données
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Échec d'ouverture de la DB: {0}")]
    OpenFailed(String),

    #[error("Échec de lecture: {0}")]
    ReadFailed(String),

    #[error("Échec d'écriture: {0}")]
    WriteFailed(String),

    #[error("Sérialisation échouée: {0}")]
    SerializationFailed(String),

    #[error("Désérialisation échouée: {0}")]
    DeserializationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open() -> (TempDir, Database) {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path()).unwrap();
        (dir, db)
    }

    #[test]
    fn test_batch_put_and_delete() {
        let (_dir, db) = open();

        let mut batch = Batch::new();
        batch.put(b"stale", &1u64).unwrap();
        batch.put(b"height", &42u64).unwrap();
        assert_eq!(db.write(batch).unwrap(), 2);
        assert_eq!(db.read::<u64>(b"height").unwrap(), Some(42));

        let mut batch = Batch::new();
        batch.delete(b"stale");
        db.write(batch).unwrap();
        assert_eq!(db.read::<u64>(b"stale").unwrap(), None);
    }

    #[test]
    fn test_read_prefix_strips_prefix_and_stops() {
        let (_dir, db) = open();
        let mut batch = Batch::new();
        batch.put(b"a:2", &2u32).unwrap();
        batch.put(b"a:1", &1u32).unwrap();
        batch.put(b"b:1", &3u32).unwrap();
        db.write(batch).unwrap();

        let entries: Vec<(Vec<u8>, u32)> = db.read_prefix(b"a:").unwrap();
        assert_eq!(entries, vec![(b"1".to_vec(), 1), (b"2".to_vec(), 2)]);
        assert_eq!(db.keys_with_prefix(b"b:").unwrap(), vec![b"b:1".to_vec()]);
    }

    #[test]
    fn test_read_wrong_type_fails() {
        let (_dir, db) = open();
        let mut batch = Batch::new();
        batch.put(b"k", &1u8).unwrap();
        db.write(batch).unwrap();

        assert!(matches!(
            db.read::<u64>(b"k"),
            Err(DatabaseError::DeserializationFailed(_))
        ));
    }
}
