//! Passphrase encryption and keyed hashing for wallet custody.
//!
//! The seed is sealed with an HMAC-SHA256 keystream under a PBKDF2 key and
//! authenticated with an HMAC tag over the ciphertext. Tags are compared in
//! constant time.

use super::EncryptedPayload;
use crate::ThriveError;
use crate::formats::to_hex;
use crate::primitives::{KEY_LENGTH, NONCE_LENGTH, PBKDF2_ITERATIONS, SALT_LENGTH};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Byte provider used for salts, nonces and seeds.
pub type EntropySource = Box<dyn Fn(usize) -> Vec<u8> + Send + Sync>;

/// Operating-system backed random bytes.
#[must_use]
pub fn os_entropy(len: usize) -> Vec<u8> {
    (0..len).map(|_| rand::random::<u8>()).collect()
}

// =============================================================================
// HASH HELPERS
// =============================================================================

/// SHA-256 of `data`, as lowercase hex.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    to_hex(&hasher.finalize())
}

fn new_mac(key: &[u8]) -> Result<HmacSha256, ThriveError> {
    HmacSha256::new_from_slice(key).map_err(|e| ThriveError::Crypto(e.to_string()))
}

/// HMAC-SHA256 of `data` under `key`.
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ThriveError> {
    let mut mac = new_mac(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

// =============================================================================
// ENCRYPTOR
// =============================================================================

/// Seals and opens secrets under a passphrase.
pub trait Encryptor: Send + Sync {
    fn encrypt(&self, plaintext: &[u8], passphrase: &str) -> Result<EncryptedPayload, ThriveError>;
    fn decrypt(&self, payload: &EncryptedPayload, passphrase: &str) -> Result<Vec<u8>, ThriveError>;
}

/// PBKDF2 + HMAC keystream encryptor.
pub struct PassphraseEncryptor {
    iterations: u32,
    salt_provider: EntropySource,
    nonce_provider: EntropySource,
}

impl std::fmt::Debug for PassphraseEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassphraseEncryptor")
            .field("iterations", &self.iterations)
            .finish_non_exhaustive()
    }
}

impl Default for PassphraseEncryptor {
    fn default() -> Self {
        Self::new()
    }
}

impl PassphraseEncryptor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
            salt_provider: Box::new(os_entropy),
            nonce_provider: Box::new(os_entropy),
        }
    }

    /// Override the PBKDF2 round count.
    #[must_use]
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations.max(1);
        self
    }

    #[must_use]
    pub fn with_salt_provider(mut self, provider: EntropySource) -> Self {
        self.salt_provider = provider;
        self
    }

    #[must_use]
    pub fn with_nonce_provider(mut self, provider: EntropySource) -> Self {
        self.nonce_provider = provider;
        self
    }

    fn derive_key(&self, passphrase: &str, salt: &[u8], nonce: &[u8]) -> [u8; KEY_LENGTH] {
        let mut material = Vec::with_capacity(salt.len() + nonce.len());
        material.extend_from_slice(salt);
        material.extend_from_slice(nonce);

        let mut key = [0u8; KEY_LENGTH];
        pbkdf2::pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), &material, self.iterations, &mut key);
        key
    }

    fn keystream(key: &[u8], nonce: &[u8], len: usize) -> Result<Vec<u8>, ThriveError> {
        let mut stream = Vec::with_capacity(len + 32);
        let mut counter: u32 = 0;
        while stream.len() < len {
            let mut block_input = nonce.to_vec();
            block_input.extend_from_slice(&counter.to_be_bytes());
            stream.extend(hmac_sha256(key, &block_input)?);
            counter = counter.wrapping_add(1);
        }
        stream.truncate(len);
        Ok(stream)
    }

    fn xor(data: &[u8], stream: &[u8]) -> Vec<u8> {
        data.iter().zip(stream).map(|(a, b)| a ^ b).collect()
    }
}

fn b64_decode(value: &str) -> Result<Vec<u8>, ThriveError> {
    STANDARD
        .decode(value)
        .map_err(|_| ThriveError::InvalidPassphrase)
}

impl Encryptor for PassphraseEncryptor {
    fn encrypt(&self, plaintext: &[u8], passphrase: &str) -> Result<EncryptedPayload, ThriveError> {
        let salt = (self.salt_provider)(SALT_LENGTH);
        let nonce = (self.nonce_provider)(NONCE_LENGTH);
        let key = self.derive_key(passphrase, &salt, &nonce);

        let stream = Self::keystream(&key, &nonce, plaintext.len())?;
        let ciphertext = Self::xor(plaintext, &stream);
        let tag = hmac_sha256(&key, &ciphertext)?;

        Ok(EncryptedPayload {
            ciphertext: STANDARD.encode(&ciphertext),
            salt: STANDARD.encode(&salt),
            nonce: STANDARD.encode(&nonce),
            mac: STANDARD.encode(&tag),
        })
    }

    fn decrypt(
        &self,
        payload: &EncryptedPayload,
        passphrase: &str,
    ) -> Result<Vec<u8>, ThriveError> {
        let salt = b64_decode(&payload.salt)?;
        let nonce = b64_decode(&payload.nonce)?;
        let ciphertext = b64_decode(&payload.ciphertext)?;
        let expected = b64_decode(&payload.mac)?;
        let key = self.derive_key(passphrase, &salt, &nonce);

        let mut mac = new_mac(&key)?;
        mac.update(&ciphertext);
        mac.verify_slice(&expected)
            .map_err(|_| ThriveError::InvalidPassphrase)?;

        let stream = Self::keystream(&key, &nonce, ciphertext.len())?;
        Ok(Self::xor(&ciphertext, &stream))
    }
}

// =============================================================================
// TESTS
// =============================================================================
