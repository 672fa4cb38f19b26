//! # Persistence Format
//!
//! Binary encoding for wallet records stored in the redb keystore.
//!
//! Format: Header (5 bytes) + postcard-serialized `WalletRecord`.
//! - 4 bytes: Magic ("THWR")
//! - 1 byte: Version
//!
//! Size and header are checked before the payload is decoded.

use crate::primitives::{FORMAT_VERSION, MAGIC_BYTES, MAX_RECORD_SIZE};
use crate::wallet::WalletRecord;
use crate::ThriveError;

const HEADER_LEN: usize = 5;

// =============================================================================
// HEADER
// =============================================================================

/// The header preceding every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl PersistenceHeader {
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    pub fn validate(&self) -> Result<(), ThriveError> {
        if &self.magic != MAGIC_BYTES {
            return Err(ThriveError::DeserializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(ThriveError::DeserializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ThriveError> {
        if bytes.len() < HEADER_LEN {
            return Err(ThriveError::DeserializationError(
                "Header too short".to_string(),
            ));
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Ok(Self {
            magic,
            version: bytes[4],
        })
    }
}

impl Default for PersistenceHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RECORDS
// =============================================================================

/// Encode a record (header + payload).
pub fn record_to_bytes(record: &WalletRecord) -> Result<Vec<u8>, ThriveError> {
    let payload =
        postcard::to_stdvec(record).map_err(|e| ThriveError::SerializationError(e.to_string()))?;
    if payload.len() + HEADER_LEN > MAX_RECORD_SIZE {
        return Err(ThriveError::SerializationError(format!(
            "Record size {} bytes exceeds maximum allowed {} bytes",
            payload.len() + HEADER_LEN,
            MAX_RECORD_SIZE
        )));
    }

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&PersistenceHeader::new().to_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Decode a record, rejecting oversized data and foreign headers first.
pub fn record_from_bytes(bytes: &[u8]) -> Result<WalletRecord, ThriveError> {
    if bytes.len() > MAX_RECORD_SIZE {
        return Err(ThriveError::DeserializationError(format!(
            "Record size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_RECORD_SIZE
        )));
    }

    PersistenceHeader::from_bytes(bytes)?.validate()?;

    postcard::from_bytes(&bytes[HEADER_LEN..]).map_err(|e| {
        ThriveError::DeserializationError(format!("Failed to decode wallet record: {}", e))
    })
}

// =============================================================================
// TESTS
// =============================================================================
