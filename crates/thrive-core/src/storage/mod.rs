//! # Storage
//!
//! Disk-backed keystore using the redb embedded database.

pub mod redb_keystore;

pub use redb_keystore::RedbKeyStore;
