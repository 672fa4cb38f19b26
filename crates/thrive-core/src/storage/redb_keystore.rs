//! # redb-backed Keystore
//!
//! Wallet records in a single redb table keyed by wallet id.
//!
//! Each write is one ACID transaction, so a crash never leaves a record
//! half-written. Values use the binary record format from `formats`.

use crate::formats::{record_from_bytes, record_to_bytes};
use crate::wallet::{KeyStore, WalletMetadata, WalletRecord};
use crate::ThriveError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for wallets: wallet_id -> encoded `WalletRecord`
const WALLETS: TableDefinition<&str, &[u8]> = TableDefinition::new("wallets");

fn io(e: impl std::fmt::Display) -> ThriveError {
    ThriveError::IoError(e.to_string())
}

/// A disk-backed keystore using redb.
pub struct RedbKeyStore {
    db: Database,
}

impl std::fmt::Debug for RedbKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbKeyStore").finish_non_exhaustive()
    }
}

impl RedbKeyStore {
    /// Open or create a keystore database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ThriveError> {
        let db = Database::create(path.as_ref()).map_err(io)?;

        {
            let write_txn = db.begin_write().map_err(io)?;
            let _ = write_txn.open_table(WALLETS).map_err(io)?;
            write_txn.commit().map_err(io)?;
        }

        Ok(Self { db })
    }

    fn read_all(&self) -> Result<Vec<WalletRecord>, ThriveError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(WALLETS).map_err(io)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(io)? {
            let (_, value) = entry.map_err(io)?;
            records.push(record_from_bytes(value.value())?);
        }
        Ok(records)
    }
}

impl KeyStore for RedbKeyStore {
    fn store(&self, record: &WalletRecord) -> Result<(), ThriveError> {
        let bytes = record_to_bytes(record)?;
        let write_txn = self.db.begin_write().map_err(io)?;
        {
            let mut table = write_txn.open_table(WALLETS).map_err(io)?;
            table
                .insert(record.metadata.wallet_id.as_str(), bytes.as_slice())
                .map_err(io)?;
        }
        write_txn.commit().map_err(io)
    }

    fn load(&self, wallet_id: &str) -> Result<WalletRecord, ThriveError> {
        let read_txn = self.db.begin_read().map_err(io)?;
        let table = read_txn.open_table(WALLETS).map_err(io)?;
        let value = table
            .get(wallet_id)
            .map_err(io)?
            .ok_or_else(|| ThriveError::UnknownWallet(wallet_id.to_string()))?;
        record_from_bytes(value.value())
    }

    fn list_metadata(&self) -> Result<Vec<WalletMetadata>, ThriveError> {
        Ok(self.read_all()?.into_iter().map(|r| r.metadata).collect())
    }
}

// =============================================================================
// TESTS
// =============================================================================
