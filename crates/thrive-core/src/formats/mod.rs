//! # Formats
//!
//! Binary encodings for persisted records, and the lowercase hex used for
//! payload data, digests and signatures. File I/O lives with the callers.

pub mod persistence;

pub use persistence::{PersistenceHeader, record_from_bytes, record_to_bytes};

/// Lowercase hex, two digits per byte.
pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
