//! # Core Type Definitions
//!
//! Shared vocabulary for the Thrive CORE:
//! - Position classifiers (`AssetType`, `TaxClassification`, `ConfidenceLevel`)
//! - Execution vocabulary (`ActionType`, `ExecutionMode`)
//! - Error types (`ThriveError`)
//!
//! Every enum has a fixed wire spelling. Parsing from user input is
//! case-insensitive and trims surrounding whitespace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// ASSET TYPE
// =============================================================================

/// The kind of asset a position holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum AssetType {
    Stock,
    Crypto,
}

impl AssetType {
    /// Wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stock => "stock",
            Self::Crypto => "crypto",
        }
    }
}

impl FromStr for AssetType {
    type Err = ThriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stock" => Ok(Self::Stock),
            "crypto" => Ok(Self::Crypto),
            _ => Err(ThriveError::InvalidPosition(
                "asset_type must be 'stock' or 'crypto'.".to_string(),
            )),
        }
    }
}

impl TryFrom<String> for AssetType {
    type Error = ThriveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TAX CLASSIFICATION
// =============================================================================

/// Holding-period classification for capital gains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxClassification {
    LongTerm,
    ShortTerm,
}

impl TaxClassification {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LongTerm => "long_term",
            Self::ShortTerm => "short_term",
        }
    }

    /// Human label used in reports ("long-term").
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::LongTerm => "long-term",
            Self::ShortTerm => "short-term",
        }
    }
}

impl fmt::Display for TaxClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONFIDENCE LEVEL
// =============================================================================

/// Qualitative certainty attached to a truth result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ACTION TYPE
// =============================================================================

/// What an execution intent asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum ActionType {
    Hold,
    Swap,
    Transfer,
}

impl ActionType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hold => "HOLD",
            Self::Swap => "SWAP",
            Self::Transfer => "TRANSFER",
        }
    }

    /// True for actions that move capital between assets.
    #[must_use]
    pub const fn moves_capital(self) -> bool {
        !matches!(self, Self::Hold)
    }
}

impl FromStr for ActionType {
    type Err = ThriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HOLD" => Ok(Self::Hold),
            "SWAP" => Ok(Self::Swap),
            "TRANSFER" => Ok(Self::Transfer),
            _ => Err(ThriveError::UnimplementedIntent(format!(
                "Unsupported action type: {}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ActionType {
    type Error = ThriveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// EXECUTION MODE
// =============================================================================

/// Gate setting for the execution controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum ExecutionMode {
    /// Blocks every plan.
    #[default]
    Safe,
    /// Every step needs an explicit confirmation.
    Manual,
    /// Steps are checked against a `GuardPolicy`.
    Guarded,
}

impl ExecutionMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Manual => "MANUAL",
            Self::Guarded => "GUARDED",
        }
    }
}

impl FromStr for ExecutionMode {
    type Err = ThriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "SAFE" => Ok(Self::Safe),
            "MANUAL" => Ok(Self::Manual),
            "GUARDED" => Ok(Self::Guarded),
            _ => Err(ThriveError::ModeTransition(format!(
                "Unsupported mode: {}",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ExecutionMode {
    type Error = ThriveError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Thrive system.
///
/// - No silent failures
/// - Display strings are the user-facing messages
/// - The CORE never panics; every error is recoverable
#[derive(Debug, Error)]
pub enum ThriveError {
    /// A position failed input validation.
    #[error("{0}")]
    InvalidPosition(String),

    /// A plan violates a hard validation rule.
    #[error("{0}")]
    PlanValidation(String),

    /// The planner cannot handle the intent.
    #[error("{0}")]
    UnimplementedIntent(String),

    /// Execution is blocked by arming state or mode.
    #[error("{0}")]
    ExecutionBlocked(String),

    /// An invalid controller mode transition.
    #[error("{0}")]
    ModeTransition(String),

    /// A guarded policy rejected the plan.
    #[error("{0}")]
    PolicyViolation(String),

    /// A plan cannot be rendered as transaction payloads.
    #[error("{0}")]
    Adapter(String),

    /// A payload cannot be dry-run.
    #[error("{0}")]
    Simulation(String),

    /// The wallet must be unlocked for this operation.
    #[error("Wallet is locked.")]
    WalletLocked,

    /// Decryption failed: wrong passphrase or tampered ciphertext.
    #[error("Invalid passphrase or corrupted payload.")]
    InvalidPassphrase,

    /// No wallet with this id exists in the keystore.
    #[error("Unknown wallet_id: {0}")]
    UnknownWallet(String),

    /// An account already exists for the derivation path.
    #[error("Account already exists for derivation path.")]
    AccountExists,

    /// No account with the requested id.
    #[error("Account not found.")]
    AccountNotFound,

    /// No keystore/wallet context has been selected.
    #[error("Context not set.")]
    ContextNotSet,

    /// A request is missing a required field or acknowledgement.
    #[error("{0}")]
    InvalidRequest(String),

    /// A cryptographic primitive rejected its input.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl ThriveError {
    /// True for errors caused by the caller's input rather than the environment.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            Self::Crypto(_) | Self::SerializationError(_) | Self::IoError(_)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn asset_type_parses_case_insensitively() {
        assert_eq!("Stock".parse::<AssetType>().ok(), Some(AssetType::Stock));
        assert_eq!(" CRYPTO ".parse::<AssetType>().ok(), Some(AssetType::Crypto));
    }

    #[test]
    fn asset_type_rejects_unknown() {
        let err = "bond".parse::<AssetType>().expect_err("bond is not supported");
        assert_eq!(err.to_string(), "asset_type must be 'stock' or 'crypto'.");
    }

    #[test]
    fn action_type_round_trips_wire_spelling() {
        let action: ActionType = serde_json::from_str("\"swap\"").expect("lowercase accepted");
        assert_eq!(action, ActionType::Swap);
        let json = serde_json::to_string(&action).expect("serialize");
        assert_eq!(json, "\"SWAP\"");
    }

    #[test]
    fn action_type_unknown_message() {
        let err = "bridge".parse::<ActionType>().expect_err("unknown action");
        assert_eq!(err.to_string(), "Unsupported action type: bridge");
    }

    #[test]
    fn execution_mode_defaults_to_safe() {
        assert_eq!(ExecutionMode::default(), ExecutionMode::Safe);
        assert_eq!("guarded".parse::<ExecutionMode>().ok(), Some(ExecutionMode::Guarded));
    }

    #[test]
    fn wallet_errors_carry_user_messages() {
        assert_eq!(ThriveError::WalletLocked.to_string(), "Wallet is locked.");
        assert_eq!(
            ThriveError::UnknownWallet("abc".to_string()).to_string(),
            "Unknown wallet_id: abc"
        );
        assert!(ThriveError::WalletLocked.is_client_error());
        assert!(!ThriveError::IoError("disk".to_string()).is_client_error());
    }

    #[test]
    fn tax_classification_labels() {
        assert_eq!(TaxClassification::LongTerm.as_str(), "long_term");
        assert_eq!(TaxClassification::ShortTerm.label(), "short-term");
        assert_eq!(ConfidenceLevel::Medium.to_string(), "MEDIUM");
    }
}
