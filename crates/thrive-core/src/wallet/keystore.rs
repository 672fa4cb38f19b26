//! Keystore backends for wallet records.
//!
//! - `FileKeyStore`: pretty-printed JSON array, one entry per wallet
//! - `MemoryKeyStore`: process-local map, selected by `mem://` paths
//! - `RedbKeyStore`: ACID table of binary records (see `storage`)

use super::{WalletMetadata, WalletRecord};
use crate::ThriveError;
use crate::primitives::{MAX_KEYSTORE_FILE_SIZE, MEMORY_KEYSTORE_PREFIX};
use crate::storage::RedbKeyStore;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

/// Persistence for wallet records.
pub trait KeyStore: Send + Sync {
    /// Insert or replace a record by wallet id.
    fn store(&self, record: &WalletRecord) -> Result<(), ThriveError>;

    /// Load one record. Unknown ids yield `UnknownWallet`.
    fn load(&self, wallet_id: &str) -> Result<WalletRecord, ThriveError>;

    fn list_metadata(&self) -> Result<Vec<WalletMetadata>, ThriveError>;
}

// =============================================================================
// FILE
// =============================================================================

/// JSON file keystore.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<WalletRecord>, ThriveError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let size = std::fs::metadata(&self.path)
            .map_err(|e| ThriveError::IoError(e.to_string()))?
            .len();
        if size > MAX_KEYSTORE_FILE_SIZE {
            return Err(ThriveError::IoError(format!(
                "Keystore file is {} bytes, limit is {} bytes",
                size, MAX_KEYSTORE_FILE_SIZE
            )));
        }

        let text =
            std::fs::read_to_string(&self.path).map_err(|e| ThriveError::IoError(e.to_string()))?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&text).map_err(|e| ThriveError::DeserializationError(e.to_string()))
    }

    fn write_all(&self, records: &[WalletRecord]) -> Result<(), ThriveError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ThriveError::IoError(e.to_string()))?;
        }
        let text = serde_json::to_string_pretty(records)
            .map_err(|e| ThriveError::SerializationError(e.to_string()))?;
        std::fs::write(&self.path, text).map_err(|e| ThriveError::IoError(e.to_string()))
    }
}

impl KeyStore for FileKeyStore {
    fn store(&self, record: &WalletRecord) -> Result<(), ThriveError> {
        let mut records = self.read_all()?;
        match records
            .iter_mut()
            .find(|r| r.metadata.wallet_id == record.metadata.wallet_id)
        {
            Some(existing) => *existing = record.clone(),
            None => records.push(record.clone()),
        }
        self.write_all(&records)
    }

    fn load(&self, wallet_id: &str) -> Result<WalletRecord, ThriveError> {
        self.read_all()?
            .into_iter()
            .find(|r| r.metadata.wallet_id == wallet_id)
            .ok_or_else(|| ThriveError::UnknownWallet(wallet_id.to_string()))
    }

    fn list_metadata(&self) -> Result<Vec<WalletMetadata>, ThriveError> {
        Ok(self.read_all()?.into_iter().map(|r| r.metadata).collect())
    }
}

// =============================================================================
// MEMORY
// =============================================================================

/// In-memory keystore. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    records: Arc<Mutex<BTreeMap<String, WalletRecord>>>,
}

impl MemoryKeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared store registered under a `mem://` name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        static REGISTRY: LazyLock<Mutex<BTreeMap<String, MemoryKeyStore>>> =
            LazyLock::new(|| Mutex::new(BTreeMap::new()));

        REGISTRY
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(name.to_string())
            .or_default()
            .clone()
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, WalletRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyStore for MemoryKeyStore {
    fn store(&self, record: &WalletRecord) -> Result<(), ThriveError> {
        self.guard()
            .insert(record.metadata.wallet_id.clone(), record.clone());
        Ok(())
    }

    fn load(&self, wallet_id: &str) -> Result<WalletRecord, ThriveError> {
        self.guard()
            .get(wallet_id)
            .cloned()
            .ok_or_else(|| ThriveError::UnknownWallet(wallet_id.to_string()))
    }

    fn list_metadata(&self) -> Result<Vec<WalletMetadata>, ThriveError> {
        Ok(self.guard().values().map(|r| r.metadata.clone()).collect())
    }
}

// =============================================================================
// SELECTION
// =============================================================================

/// True when `path` names an in-memory keystore.
#[must_use]
pub fn is_memory_path(path: &str) -> bool {
    path.starts_with(MEMORY_KEYSTORE_PREFIX)
}

/// Open the backend a keystore path names.
///
/// `mem://name` selects a shared in-memory store, a `.redb` extension the
/// redb backend, anything else a JSON file.
pub fn open_keystore(path: &str) -> Result<Box<dyn KeyStore>, ThriveError> {
    if is_memory_path(path) {
        return Ok(Box::new(MemoryKeyStore::named(path)));
    }
    let file = Path::new(path);
    if file.extension().is_some_and(|ext| ext == "redb") {
        return Ok(Box::new(RedbKeyStore::open(file)?));
    }
    Ok(Box::new(FileKeyStore::new(file)))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::EncryptedPayload;
    use tempfile::tempdir;

    fn record(id: &str, label: &str) -> WalletRecord {
        WalletRecord {
            metadata: WalletMetadata {
                wallet_id: id.to_string(),
                label: label.to_string(),
                created_at: "t".to_string(),
            },
            accounts: Vec::new(),
            encrypted_seed: EncryptedPayload {
                ciphertext: "c".to_string(),
                salt: "s".to_string(),
                nonce: "n".to_string(),
                mac: "m".to_string(),
            },
        }
    }

    #[test]
    fn file_store_replaces_in_place() {
        let dir = tempdir().expect("tempdir");
        let store = FileKeyStore::new(dir.path().join("keys.json"));
        assert!(store.list_metadata().expect("empty").is_empty());

        store.store(&record("b", "first")).expect("store");
        store.store(&record("a", "second")).expect("store");
        store.store(&record("b", "renamed")).expect("replace");

        let labels: Vec<String> = store
            .list_metadata()
            .expect("list")
            .into_iter()
            .map(|m| m.label)
            .collect();
        assert_eq!(labels, vec!["renamed", "second"]);

        let text = std::fs::read_to_string(store.path()).expect("read");
        assert!(text.starts_with("[\n"));
        assert!(text.contains("\"encrypted_seed\""));
    }

    #[test]
    fn file_store_unknown_wallet() {
        let dir = tempdir().expect("tempdir");
        let store = FileKeyStore::new(dir.path().join("keys.json"));
        let err = store.load("x").expect_err("missing");
        assert_eq!(err.to_string(), "Unknown wallet_id: x");
    }

    #[test]
    fn named_memory_stores_are_shared() {
        let a = MemoryKeyStore::named("mem://shared-test");
        let b = MemoryKeyStore::named("mem://shared-test");
        a.store(&record("w", "label")).expect("store");
        assert_eq!(b.load("w").expect("load").metadata.label, "label");

        let other = MemoryKeyStore::named("mem://other-test");
        assert!(other.load("w").is_err());
    }

    #[test]
    fn open_selects_backend() {
        let dir = tempdir().expect("tempdir");

        let mem = open_keystore("mem://open-test").expect("mem");
        mem.store(&record("m", "memory")).expect("store");
        assert!(open_keystore("mem://open-test").expect("mem").load("m").is_ok());

        let redb_path = dir.path().join("keys.redb");
        let redb = open_keystore(redb_path.to_str().expect("utf8")).expect("redb");
        redb.store(&record("r", "redb")).expect("store");
        assert_eq!(redb.load("r").expect("load").metadata.label, "redb");

        let json_path = dir.path().join("keys.json");
        let json = open_keystore(json_path.to_str().expect("utf8")).expect("json");
        json.store(&record("j", "json")).expect("store");
        assert!(json_path.exists());
    }
}
