//! Backend selection and the storage factory.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::file::FileStore;
use crate::{RedbStore, SubordinateStore, TrustMarkStore};

const REDB_FILE: &str = "beacon.redb";

/// Which backend holds the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Embedded redb database, the default.
    #[default]
    Redb,
    /// Plain JSON files.
    Json,
}

impl std::str::FromStr for StorageBackend {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redb" => Ok(Self::Redb),
            "json" => Ok(Self::Json),
            other => Err(StorageError::UnknownBackend(other.to_string())),
        }
    }
}

/// Storage section of the server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    pub data_dir: PathBuf,
}

/// The opened storage handles, one per contract.
///
/// Both handles may point at the same backend instance; the split lets
/// consumers depend only on the contract they use.
#[derive(Clone)]
pub struct Stores {
    pub trust_marks: Arc<dyn TrustMarkStore>,
    pub subordinates: Arc<dyn SubordinateStore>,
}

/// Open the configured backend under `data_dir`.
pub fn open_storage(config: &StorageConfig) -> Result<Stores, StorageError> {
    fs::create_dir_all(&config.data_dir)?;
    match config.backend {
        StorageBackend::Redb => {
            let store = Arc::new(RedbStore::open(config.data_dir.join(REDB_FILE))?);
            Ok(Stores {
                trust_marks: store.clone(),
                subordinates: store,
            })
        }
        StorageBackend::Json => {
            let store = Arc::new(FileStore::open(&config.data_dir)?);
            Ok(Stores {
                trust_marks: store.clone(),
                subordinates: store,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::EntityId;
    use crate::record::Status;

    #[test]
    fn backend_parses_known_names() {
        assert_eq!("redb".parse::<StorageBackend>().unwrap(), StorageBackend::Redb);
        assert_eq!("json".parse::<StorageBackend>().unwrap(), StorageBackend::Json);
        assert!(matches!(
            "badger".parse::<StorageBackend>(),
            Err(StorageError::UnknownBackend(_))
        ));
    }

    #[test]
    fn factory_opens_both_backends() {
        for backend in [StorageBackend::Redb, StorageBackend::Json] {
            let dir = tempfile::tempdir().unwrap();
            let stores = open_storage(&StorageConfig {
                backend,
                data_dir: dir.path().to_path_buf(),
            })
            .unwrap();
            let rp = EntityId::new("https://rp.example.org").unwrap();
            stores
                .trust_marks
                .approve("https://ta.example.org/tm/x", &rp)
                .unwrap();
            assert_eq!(
                stores
                    .trust_marks
                    .status("https://ta.example.org/tm/x", &rp)
                    .unwrap(),
                Status::Active
            );
        }
    }

    #[test]
    fn config_defaults_to_redb() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"data_dir": "/tmp/beacon"}"#).unwrap();
        assert_eq!(config.backend, StorageBackend::Redb);
    }
}
