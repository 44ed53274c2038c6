use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::repository::error::StoreError;

/// A user's cached login for one connection instance. `password` holds ciphertext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub instance_id: u64,
    pub user_id: u64,
    pub username: String,
    pub password: String,
}

/// Persistence of cached credentials keyed by (instance id, user id).
///
/// Implementations keep at most one record per key: `insert` replaces whatever was
/// stored for the same pair.
pub trait CredentialStore: Send + Sync {
    fn get(&self, instance_id: u64, user_id: u64) -> Result<Option<Credential>, StoreError>;

    fn insert(&self, credential: Credential) -> Result<(), StoreError>;

    /// Remove the record for the pair if it belongs to `username`. Returns how many
    /// records were removed.
    fn delete(&self, instance_id: u64, user_id: u64, username: &str)
    -> Result<usize, StoreError>;
}

type CredentialKey = (u64, u64);

/// Process-local store, for hosts that keep credentials elsewhere and for tests.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    records: Mutex<HashMap<CredentialKey, Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, instance_id: u64, user_id: u64) -> Result<Option<Credential>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records.get(&(instance_id, user_id)).cloned())
    }

    fn insert(&self, credential: Credential) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        records.insert((credential.instance_id, credential.user_id), credential);
        Ok(())
    }

    fn delete(
        &self,
        instance_id: u64,
        user_id: u64,
        username: &str,
    ) -> Result<usize, StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let key = (instance_id, user_id);
        match records.get(&key) {
            Some(existing) if existing.username == username => {
                records.remove(&key);
                Ok(1)
            }
            _ => Ok(0),
        }
    }
}

/// Store backed by a JSON array on disk.
///
/// The whole file is rewritten on every change through a temporary file in the same
/// directory, so readers never see a partial write.
#[derive(Debug)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
    records: Mutex<Vec<Credential>>,
}

impl JsonFileCredentialStore {
    /// Open the store at `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match fs::read(&path) {
            Ok(raw) if raw.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(raw) => serde_json::from_slice(&raw)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(err.into()),
        };
        debug!(path = %path.display(), records = records.len(), "opened credential file");
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, records: &[Credential]) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, records)?;
            writer.flush()?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        Ok(())
    }
}

impl CredentialStore for JsonFileCredentialStore {
    fn get(&self, instance_id: u64, user_id: u64) -> Result<Option<Credential>, StoreError> {
        let records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .iter()
            .find(|c| c.instance_id == instance_id && c.user_id == user_id)
            .cloned())
    }

    fn insert(&self, credential: Credential) -> Result<(), StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let mut next = records.clone();
        next.retain(|c| !(c.instance_id == credential.instance_id && c.user_id == credential.user_id));
        next.push(credential);
        self.persist(&next)?;
        *records = next;
        Ok(())
    }

    fn delete(
        &self,
        instance_id: u64,
        user_id: u64,
        username: &str,
    ) -> Result<usize, StoreError> {
        let mut records = self.records.lock().map_err(|_| StoreError::Poisoned)?;
        let before = records.len();
        let next: Vec<Credential> = records
            .iter()
            .filter(|c| {
                !(c.instance_id == instance_id && c.user_id == user_id && c.username == username)
            })
            .cloned()
            .collect();
        let removed = before - next.len();
        if removed > 0 {
            self.persist(&next)?;
            *records = next;
        }
        Ok(removed)
    }
}
