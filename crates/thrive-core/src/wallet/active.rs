//! Active account per wallet.
//!
//! Stored next to the keystore as `{keystore}.active.json`:
//! `{"wallets": {wallet_id: account_id}}` with sorted keys. In-memory
//! keystores keep their selection in process memory.

use super::Account;
use super::keystore::is_memory_path;
use crate::ThriveError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{LazyLock, Mutex, PoisonError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ActiveFile {
    #[serde(default)]
    wallets: BTreeMap<String, String>,
}

static MEMORY_ACTIVE: LazyLock<Mutex<BTreeMap<String, BTreeMap<String, String>>>> =
    LazyLock::new(|| Mutex::new(BTreeMap::new()));

#[derive(Debug, Clone)]
enum Backing {
    File(PathBuf),
    Memory(String),
}

/// Active account selection bound to one keystore path.
#[derive(Debug, Clone)]
pub struct ActiveAccounts {
    backing: Backing,
}

impl ActiveAccounts {
    #[must_use]
    pub fn for_keystore(keystore_path: &str) -> Self {
        let backing = if is_memory_path(keystore_path) {
            Backing::Memory(keystore_path.to_string())
        } else {
            Backing::File(PathBuf::from(format!("{}.active.json", keystore_path)))
        };
        Self { backing }
    }

    /// Every wallet's active account.
    pub fn all(&self) -> Result<BTreeMap<String, String>, ThriveError> {
        match &self.backing {
            Backing::Memory(key) => Ok(MEMORY_ACTIVE
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned()
                .unwrap_or_default()),
            Backing::File(path) => {
                if !path.exists() {
                    return Ok(BTreeMap::new());
                }
                let text =
                    std::fs::read_to_string(path).map_err(|e| ThriveError::IoError(e.to_string()))?;
                let file: ActiveFile = serde_json::from_str(&text)
                    .map_err(|e| ThriveError::DeserializationError(e.to_string()))?;
                Ok(file.wallets)
            }
        }
    }

    pub fn get(&self, wallet_id: &str) -> Result<Option<String>, ThriveError> {
        Ok(self.all()?.remove(wallet_id))
    }

    pub fn set(&self, wallet_id: &str, account_id: &str) -> Result<(), ThriveError> {
        match &self.backing {
            Backing::Memory(key) => {
                MEMORY_ACTIVE
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(key.clone())
                    .or_default()
                    .insert(wallet_id.to_string(), account_id.to_string());
                Ok(())
            }
            Backing::File(path) => {
                let mut wallets = self.all()?;
                wallets.insert(wallet_id.to_string(), account_id.to_string());
                let text = serde_json::to_string_pretty(&ActiveFile { wallets })
                    .map_err(|e| ThriveError::SerializationError(e.to_string()))?;
                std::fs::write(path, text).map_err(|e| ThriveError::IoError(e.to_string()))
            }
        }
    }
}

/// The active account if it still exists, otherwise the first account.
#[must_use]
pub fn resolve_active<'a>(accounts: &'a [Account], active_id: Option<&str>) -> Option<&'a Account> {
    active_id
        .and_then(|id| accounts.iter().find(|a| a.account_id == id))
        .or_else(|| accounts.first())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn account(id: &str) -> Account {
        Account {
            account_id: id.to_string(),
            label: id.to_uppercase(),
            derivation_path: format!("m/44'/0'/0'/0/{}", id.len()),
        }
    }

    #[test]
    fn resolve_prefers_active_then_first() {
        let accounts = vec![account("a"), account("bb")];
        assert_eq!(resolve_active(&accounts, Some("bb")).map(|a| a.label.as_str()), Some("BB"));
        assert_eq!(resolve_active(&accounts, Some("gone")).map(|a| a.label.as_str()), Some("A"));
        assert_eq!(resolve_active(&accounts, None).map(|a| a.label.as_str()), Some("A"));
        assert!(resolve_active(&[], Some("a")).is_none());
    }

    #[test]
    fn file_selection_persists_sorted() {
        let dir = tempdir().expect("tempdir");
        let keystore = dir.path().join("keys.json");
        let active = ActiveAccounts::for_keystore(keystore.to_str().expect("utf8"));

        assert_eq!(active.get("w1").expect("get"), None);
        active.set("w2", "acc-2").expect("set");
        active.set("w1", "acc-1").expect("set");

        let reopened = ActiveAccounts::for_keystore(keystore.to_str().expect("utf8"));
        assert_eq!(reopened.get("w1").expect("get"), Some("acc-1".to_string()));

        let text = std::fs::read_to_string(dir.path().join("keys.json.active.json")).expect("read");
        let w1 = text.find("\"w1\"").expect("w1");
        let w2 = text.find("\"w2\"").expect("w2");
        assert!(w1 < w2);
        assert!(text.contains("\"wallets\""));
    }

    #[test]
    fn memory_selection() {
        let active = ActiveAccounts::for_keystore("mem://active-test");
        active.set("w", "a").expect("set");
        assert_eq!(
            ActiveAccounts::for_keystore("mem://active-test")
                .get("w")
                .expect("get"),
            Some("a".to_string())
        );
    }
}
