//! JSON file persistence for the account directory.
//!
//! Saves overwrite the whole store through a sibling temp file plus
//! rename, so a crash mid-write leaves the previously committed contents
//! intact for the next reader.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::error;

use crate::ledger::Directory;

/// Errors at the durable-storage boundary.
///
/// A `Corrupt` load is recovered locally by substituting an empty
/// directory (see [`Store::load_or_default`]); a failed save is not
/// recoverable here and must be retried or treated as fatal by the
/// caller, since a silently lost flush breaks durability of the last
/// completed mutation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("store {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Handle on the durable store file.
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the store. A missing file is an empty directory; an unreadable
    /// or unparseable file is an error so the condition stays reportable.
    pub fn load(&self) -> Result<Directory, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Directory::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Read the store, substituting an empty directory on failure.
    ///
    /// Data loss is preferred over refusing to start, but the failure is
    /// logged rather than treated as "no data".
    pub fn load_or_default(&self) -> Directory {
        match self.load() {
            Ok(directory) => directory,
            Err(e) => {
                error!("{e}; starting with an empty directory");
                Directory::new()
            }
        }
    }

    /// Serialize the full directory and replace the store contents.
    pub fn save(&self, directory: &Directory) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(directory).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        let tmp = self.tmp_path();
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut path = self.path.as_os_str().to_os_string();
        path.push(".tmp");
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Amount;
    use crate::model::AccountClass;

    fn store_in(dir: &tempfile::TempDir) -> Store {
        Store::new(dir.path().join("bank.json"))
    }

    fn sample_directory() -> Directory {
        let mut directory = Directory::new();
        directory
            .open_account("Asha", "A1", "1234", AccountClass::Savings)
            .unwrap();
        directory
            .find_mut("A1")
            .unwrap()
            .deposit(Amount::from_scaled(100_000), "opening")
            .unwrap();
        directory
    }

    #[test]
    fn missing_store_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let directory = store.load().unwrap();
        assert!(directory.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let directory = sample_directory();

        store.save(&directory).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded, directory);
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&sample_directory()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, ["bank.json"]);
    }

    #[test]
    fn save_overwrites_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&sample_directory()).unwrap();
        store.save(&Directory::new()).unwrap();

        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn corrupt_store_is_an_error_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
    }

    #[test]
    fn overflowing_balance_is_corrupt_not_a_crash() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        // hand-edited balance one cent past the representable maximum
        let json = r#"{
            "A1": {"name":"Asha","account_number":"A1","pin":"1234","account_type":"savings","balance":"92233720368547758.08","transactions":[]}
        }"#;
        fs::write(store.path(), json).unwrap();

        assert!(matches!(store.load(), Err(StoreError::Corrupt { .. })));
        assert!(store.load_or_default().is_empty());
    }

    #[test]
    fn corrupt_store_recovers_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();

        assert!(store.load_or_default().is_empty());
    }

    #[test]
    fn missing_parent_directory_fails_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(dir.path().join("missing").join("bank.json"));
        assert!(matches!(
            store.save(&sample_directory()),
            Err(StoreError::Io { .. })
        ));
    }
}
