//! # Wallet Core
//!
//! Local-only custody of a seed with an explicit lock/unlock lifecycle.
//!
//! Seeds are stored encrypted in a `KeyStore`. Keys are derived from the
//! seed with HMAC-SHA256 over a BIP-44 style path string; signatures are
//! HMACs. No key ever leaves this module except through
//! `export_recovery_phrase`, which requires an unlocked wallet.

pub mod active;
pub mod crypto;
pub mod keystore;

pub use active::{ActiveAccounts, resolve_active};
pub use crypto::{EntropySource, Encryptor, PassphraseEncryptor};
pub use keystore::{FileKeyStore, KeyStore, MemoryKeyStore, is_memory_path, open_keystore};

use crate::ThriveError;
use crate::formats::to_hex;
use crate::primitives::{IDENTIFIER_HEX_LENGTH, SEED_LENGTH};
use crypto::{hmac_sha256, os_entropy, sha256_hex};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// MODELS
// =============================================================================

/// BIP-44 style derivation path components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationPath {
    pub purpose: u32,
    pub coin_type: u32,
    pub account: u32,
    pub change: u32,
    pub address_index: u32,
}

impl Default for DerivationPath {
    fn default() -> Self {
        Self {
            purpose: 44,
            coin_type: 0,
            account: 0,
            change: 0,
            address_index: 0,
        }
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m/{}'/{}'/{}'/{}/{}",
            self.purpose, self.coin_type, self.account, self.change, self.address_index
        )
    }
}

/// Base64 ciphertext with everything needed to open it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub ciphertext: String,
    pub salt: String,
    pub nonce: String,
    pub mac: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletMetadata {
    pub wallet_id: String,
    pub label: String,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub label: String,
    pub derivation_path: String,
}

/// Everything persisted for one wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletRecord {
    pub metadata: WalletMetadata,
    #[serde(default)]
    pub accounts: Vec<Account>,
    pub encrypted_seed: EncryptedPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStatus {
    pub wallet_id: String,
    pub unlocked: bool,
}

// =============================================================================
// DERIVATION
// =============================================================================

fn short_id(digest_hex: &str) -> String {
    digest_hex.chars().take(IDENTIFIER_HEX_LENGTH).collect()
}

/// Wallet id: first 16 hex characters of SHA-256(seed).
#[must_use]
pub fn derive_wallet_id(seed: &[u8]) -> String {
    short_id(&sha256_hex(seed))
}

/// Account id: first 16 hex characters of SHA-256(`{wallet_id}:{path}`).
#[must_use]
pub fn derive_account_id(wallet_id: &str, derivation_path: &str) -> String {
    short_id(&sha256_hex(format!("{}:{}", wallet_id, derivation_path).as_bytes()))
}

fn derive_private_key(seed: &[u8], derivation_path: &str) -> Result<Vec<u8>, ThriveError> {
    hmac_sha256(seed, derivation_path.as_bytes())
}

/// Seed rendered as space-separated four-hex-digit groups.
fn recovery_phrase(seed: &[u8]) -> String {
    let hex = to_hex(seed);
    hex.as_bytes()
        .chunks(4)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

fn utc_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

// =============================================================================
// WALLET CORE
// =============================================================================

/// Clock used to stamp new wallets.
pub type Clock = Box<dyn Fn() -> String + Send + Sync>;

/// Unlocked seed held in memory.
struct Unlocked {
    wallet_id: String,
    seed: Vec<u8>,
}

/// Wallet lifecycle over a keystore.
pub struct WalletCore {
    keystore: Box<dyn KeyStore>,
    encryptor: Box<dyn Encryptor>,
    clock: Clock,
    entropy: EntropySource,
    unlocked: Option<Unlocked>,
}

impl fmt::Debug for WalletCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletCore")
            .field(
                "unlocked_wallet",
                &self.unlocked.as_ref().map(|u| u.wallet_id.as_str()),
            )
            .finish_non_exhaustive()
    }
}

impl WalletCore {
    /// Wallet core with the system clock and OS entropy.
    #[must_use]
    pub fn new(keystore: Box<dyn KeyStore>, encryptor: Box<dyn Encryptor>) -> Self {
        Self {
            keystore,
            encryptor,
            clock: Box::new(utc_timestamp),
            entropy: Box::new(os_entropy),
            unlocked: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_entropy(mut self, entropy: EntropySource) -> Self {
        self.entropy = entropy;
        self
    }

    /// Generate a seed, seal it and store a new wallet without accounts.
    pub fn create_wallet(
        &mut self,
        label: &str,
        passphrase: &str,
    ) -> Result<WalletMetadata, ThriveError> {
        let seed = (self.entropy)(SEED_LENGTH);
        let encrypted_seed = self.encryptor.encrypt(&seed, passphrase)?;
        let metadata = WalletMetadata {
            wallet_id: derive_wallet_id(&seed),
            label: label.to_string(),
            created_at: (self.clock)(),
        };

        self.keystore.store(&WalletRecord {
            metadata: metadata.clone(),
            accounts: Vec::new(),
            encrypted_seed,
        })?;
        Ok(metadata)
    }

    pub fn list_wallets(&self) -> Result<Vec<WalletMetadata>, ThriveError> {
        self.keystore.list_metadata()
    }

    /// Metadata of one wallet.
    pub fn wallet(&self, wallet_id: &str) -> Result<WalletMetadata, ThriveError> {
        Ok(self.keystore.load(wallet_id)?.metadata)
    }

    /// Add an account. The default path is `m/44'/0'/0'/0/0`.
    pub fn add_account(
        &mut self,
        wallet_id: &str,
        label: &str,
        derivation_path: Option<&str>,
    ) -> Result<Account, ThriveError> {
        let mut record = self.keystore.load(wallet_id)?;
        let path = derivation_path
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| DerivationPath::default().to_string());
        let account_id = derive_account_id(wallet_id, &path);

        if record.accounts.iter().any(|a| a.account_id == account_id) {
            return Err(ThriveError::AccountExists);
        }

        let account = Account {
            account_id,
            label: label.to_string(),
            derivation_path: path,
        };
        record.accounts.push(account.clone());
        self.keystore.store(&record)?;
        Ok(account)
    }

    /// Change an account's label. Identity and path are unchanged.
    pub fn rename_account(
        &mut self,
        wallet_id: &str,
        account_id: &str,
        label: &str,
    ) -> Result<Account, ThriveError> {
        let mut record = self.keystore.load(wallet_id)?;
        let account = record
            .accounts
            .iter_mut()
            .find(|a| a.account_id == account_id)
            .ok_or(ThriveError::AccountNotFound)?;
        account.label = label.to_string();
        let renamed = account.clone();
        self.keystore.store(&record)?;
        Ok(renamed)
    }

    pub fn list_accounts(&self, wallet_id: &str) -> Result<Vec<Account>, ThriveError> {
        Ok(self.keystore.load(wallet_id)?.accounts)
    }

    /// Decrypt the seed into memory. Replaces any other unlocked wallet.
    pub fn unlock(
        &mut self,
        wallet_id: &str,
        passphrase: &str,
    ) -> Result<WalletStatus, ThriveError> {
        let record = self.keystore.load(wallet_id)?;
        let seed = self.encryptor.decrypt(&record.encrypted_seed, passphrase)?;
        self.unlocked = Some(Unlocked {
            wallet_id: wallet_id.to_string(),
            seed,
        });
        Ok(WalletStatus {
            wallet_id: wallet_id.to_string(),
            unlocked: true,
        })
    }

    /// Drop the in-memory seed.
    pub fn lock(&mut self) {
        self.unlocked = None;
    }

    #[must_use]
    pub fn status(&self, wallet_id: &str) -> WalletStatus {
        WalletStatus {
            wallet_id: wallet_id.to_string(),
            unlocked: self.is_unlocked(wallet_id),
        }
    }

    #[must_use]
    pub fn is_unlocked(&self, wallet_id: &str) -> bool {
        self.unlocked
            .as_ref()
            .is_some_and(|u| u.wallet_id == wallet_id)
    }

    fn require_unlocked(&self, wallet_id: &str) -> Result<&[u8], ThriveError> {
        match &self.unlocked {
            Some(u) if u.wallet_id == wallet_id => Ok(&u.seed),
            _ => Err(ThriveError::WalletLocked),
        }
    }

    /// SHA-256 hex of the path's private key. Doubles as the account address.
    pub fn get_public_key(
        &self,
        wallet_id: &str,
        derivation_path: &str,
    ) -> Result<String, ThriveError> {
        let seed = self.require_unlocked(wallet_id)?;
        let private_key = derive_private_key(seed, derivation_path)?;
        Ok(sha256_hex(&private_key))
    }

    /// HMAC-SHA256 hex of `payload` under the path's private key.
    pub fn sign(
        &self,
        wallet_id: &str,
        derivation_path: &str,
        payload: &[u8],
    ) -> Result<String, ThriveError> {
        let seed = self.require_unlocked(wallet_id)?;
        let private_key = derive_private_key(seed, derivation_path)?;
        Ok(to_hex(&hmac_sha256(&private_key, payload)?))
    }

    /// Recovery phrase for the unlocked seed.
    pub fn export_recovery_phrase(&self, wallet_id: &str) -> Result<String, ThriveError> {
        let seed = self.require_unlocked(wallet_id)?;
        Ok(recovery_phrase(seed))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> WalletCore {
        let encryptor = PassphraseEncryptor::new()
            .with_iterations(1_000)
            .with_salt_provider(Box::new(|len| vec![1; len]))
            .with_nonce_provider(Box::new(|len| vec![2; len]));
        WalletCore::new(Box::new(MemoryKeyStore::new()), Box::new(encryptor))
            .with_clock(Box::new(|| "2024-01-01T00:00:00+00:00".to_string()))
            .with_entropy(Box::new(|len| vec![0xab; len]))
    }

    #[test]
    fn default_path_renders() {
        assert_eq!(DerivationPath::default().to_string(), "m/44'/0'/0'/0/0");
    }

    #[test]
    fn create_is_deterministic_with_fixed_entropy() {
        let mut wallet = core();
        let meta = wallet.create_wallet("main", "pass").expect("create");
        assert_eq!(meta.wallet_id, derive_wallet_id(&[0xab; 32]));
        assert_eq!(meta.wallet_id.len(), 16);
        assert_eq!(meta.created_at, "2024-01-01T00:00:00+00:00");
        assert_eq!(wallet.list_wallets().expect("list"), vec![meta.clone()]);
        assert!(wallet.list_accounts(&meta.wallet_id).expect("accounts").is_empty());
    }

    #[test]
    fn accounts_are_unique_per_path() {
        let mut wallet = core();
        let meta = wallet.create_wallet("main", "pass").expect("create");
        let account = wallet
            .add_account(&meta.wallet_id, "primary", None)
            .expect("add");
        assert_eq!(account.derivation_path, "m/44'/0'/0'/0/0");
        assert_eq!(
            account.account_id,
            derive_account_id(&meta.wallet_id, "m/44'/0'/0'/0/0")
        );

        let err = wallet
            .add_account(&meta.wallet_id, "again", Some("m/44'/0'/0'/0/0"))
            .expect_err("duplicate");
        assert_eq!(err.to_string(), "Account already exists for derivation path.");

        wallet
            .add_account(&meta.wallet_id, "second", Some("m/44'/0'/0'/0/1"))
            .expect("second path");
        assert_eq!(wallet.list_accounts(&meta.wallet_id).expect("list").len(), 2);
    }

    #[test]
    fn rename_keeps_identity() {
        let mut wallet = core();
        let meta = wallet.create_wallet("main", "pass").expect("create");
        let account = wallet.add_account(&meta.wallet_id, "old", None).expect("add");
        let renamed = wallet
            .rename_account(&meta.wallet_id, &account.account_id, "new")
            .expect("rename");
        assert_eq!(renamed.account_id, account.account_id);
        assert_eq!(renamed.label, "new");
        assert_eq!(wallet.list_accounts(&meta.wallet_id).expect("list")[0].label, "new");

        let err = wallet
            .rename_account(&meta.wallet_id, "missing", "x")
            .expect_err("unknown");
        assert_eq!(err.to_string(), "Account not found.");
    }

    #[test]
    fn lifecycle_gates_key_material() {
        let mut wallet = core();
        let meta = wallet.create_wallet("main", "pass").expect("create");
        let id = meta.wallet_id.as_str();
        let path = "m/44'/0'/0'/0/0";

        assert!(!wallet.status(id).unlocked);
        assert!(matches!(wallet.get_public_key(id, path), Err(ThriveError::WalletLocked)));
        assert!(matches!(wallet.sign(id, path, b"x"), Err(ThriveError::WalletLocked)));

        let err = wallet.unlock(id, "wrong").expect_err("bad passphrase");
        assert_eq!(err.to_string(), "Invalid passphrase or corrupted payload.");

        assert!(wallet.unlock(id, "pass").expect("unlock").unlocked);
        let public = wallet.get_public_key(id, path).expect("public key");
        assert_eq!(public.len(), 64);
        let sig_a = wallet.sign(id, path, b"payload").expect("sign");
        let sig_b = wallet.sign(id, path, b"payload").expect("sign");
        assert_eq!(sig_a, sig_b);
        assert_ne!(sig_a, wallet.sign(id, "m/44'/0'/0'/0/1", b"payload").expect("sign"));

        wallet.lock();
        assert!(!wallet.status(id).unlocked);
    }

    #[test]
    fn recovery_phrase_groups() {
        let mut wallet = core();
        let meta = wallet.create_wallet("main", "pass").expect("create");
        assert!(wallet.export_recovery_phrase(&meta.wallet_id).is_err());

        wallet.unlock(&meta.wallet_id, "pass").expect("unlock");
        let phrase = wallet.export_recovery_phrase(&meta.wallet_id).expect("phrase");
        let groups: Vec<&str> = phrase.split(' ').collect();
        assert_eq!(groups.len(), 16);
        assert!(groups.iter().all(|g| *g == "abab"));
    }

    #[test]
    fn unknown_wallet() {
        let wallet = core();
        let err = wallet.list_accounts("nope").expect_err("unknown");
        assert_eq!(err.to_string(), "Unknown wallet_id: nope");
    }
}
