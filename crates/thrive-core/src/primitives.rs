//! # Innate Primitives
//!
//! Hardcoded constants for the Thrive CORE.
//!
//! Every rate, threshold and limit the engine relies on lives here so that
//! results are reproducible from the binary alone.

// =============================================================================
// TAX ASSUMPTIONS
// =============================================================================

/// Federal long-term capital gains rate.
pub const FEDERAL_LONG_TERM_RATE: f64 = 0.15;

/// Federal short-term capital gains rate.
pub const FEDERAL_SHORT_TERM_RATE: f64 = 0.25;

/// A position held strictly longer than this many days is long-term.
pub const LONG_TERM_THRESHOLD_DAYS: i64 = 365;

/// Countdown notes are only produced when long-term status is this close.
pub const COUNTDOWN_WINDOW_DAYS: i64 = 60;

/// Default filing status for positions that do not specify one.
pub const DEFAULT_FILING_STATUS: &str = "single";

// =============================================================================
// CONFIDENCE
// =============================================================================

/// Starting score before deductions.
pub const CONFIDENCE_BASE_SCORE: u8 = 4;

/// Minimum score for a HIGH confidence level.
pub const CONFIDENCE_HIGH_THRESHOLD: u8 = 3;

/// Exact score for a MEDIUM confidence level.
pub const CONFIDENCE_MEDIUM_SCORE: u8 = 2;

// =============================================================================
// PLAN VALIDATION
// =============================================================================

/// Decimal places used when comparing capital totals before and after a plan.
pub const CONSERVATION_DECIMALS: i32 = 12;

/// Substrings that must never appear in a chain-agnostic plan.
pub const FORBIDDEN_PLAN_TOKENS: [&str; 8] = [
    "chain", "gas", "gwei", "wei", "protocol", "wallet", "address", "0x",
];

/// Signer reference attached to every ownership-changing step.
pub const PRIMARY_SIGNER: &str = "primary";

// =============================================================================
// ADAPTER / SIMULATION
// =============================================================================

/// Synthetic target for TRANSFER payloads.
pub const TRANSFER_TARGET: &str = "0x0000000000000000000000000000000000000001";

/// Synthetic target for SWAP payloads.
pub const SWAP_TARGET: &str = "0x0000000000000000000000000000000000000002";

/// Gas charged per simulated transaction.
pub const SIMULATED_GAS_USED: u64 = 21_000;

/// Gas price used by the simulator, in wei.
pub const SIMULATED_GAS_PRICE_WEI: u64 = 1;

/// Significant digits used when encoding step amounts into payload data.
pub const PAYLOAD_AMOUNT_DIGITS: usize = 18;

// =============================================================================
// WALLET CUSTODY
// =============================================================================

/// PBKDF2 rounds for passphrase key derivation.
pub const PBKDF2_ITERATIONS: u32 = 200_000;

/// Salt length in bytes.
pub const SALT_LENGTH: usize = 16;

/// Nonce length in bytes.
pub const NONCE_LENGTH: usize = 16;

/// Seed length in bytes.
pub const SEED_LENGTH: usize = 32;

/// Derived key length in bytes.
pub const KEY_LENGTH: usize = 32;

/// Wallet and account identifiers are this many hex characters.
pub const IDENTIFIER_HEX_LENGTH: usize = 16;

/// Message signed by the proof-of-custody check.
pub const PROOF_MESSAGE: &str = "WALLET PROOF CHECK";

/// Warning shown whenever a recovery phrase leaves the keystore.
pub const SEED_WARNING: &str = "Anyone with this phrase controls your funds.";

/// Keystore paths with this prefix live in process memory.
pub const MEMORY_KEYSTORE_PREFIX: &str = "mem://";

// =============================================================================
// PERSISTENCE
// =============================================================================

/// Magic bytes for binary wallet records.
pub const MAGIC_BYTES: &[u8; 4] = b"THWR";

/// Current binary record format version.
pub const FORMAT_VERSION: u8 = 1;

/// Upper bound on a single encoded wallet record.
pub const MAX_RECORD_SIZE: usize = 1024 * 1024;

/// Upper bound on a keystore file read from disk.
pub const MAX_KEYSTORE_FILE_SIZE: u64 = 16 * 1024 * 1024;
