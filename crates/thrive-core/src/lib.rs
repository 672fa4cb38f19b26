//! # thrive-core
//!
//! The deterministic capital engine for Thrive - THE LOGIC.
//!
//! This crate answers two questions without touching a network:
//! - what a position is really worth after taxes (truth engine)
//! - what an intent would do to a capital snapshot (plans, gated and
//!   simulated, never executed)
//!
//! It also owns local key custody: encrypted seeds in a keystore with an
//! explicit lock/unlock lifecycle.
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (pure Rust)
//! - Deterministic output: sorted collections, injectable clock and entropy
//! - Every result carries the assumptions it was computed under
//! - Plans are chain-agnostic; chain detail only appears in the adapter

// =============================================================================
// MODULES
// =============================================================================

pub mod adapter;
pub mod capital;
pub mod confidence;
pub mod controller;
pub mod formats;
pub mod plan;
pub mod planner;
pub mod primitives;
pub mod report;
pub mod session;
pub mod storage;
pub mod truth;
pub mod types;
pub mod wallet;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ActionType, AssetType, ConfidenceLevel, ExecutionMode, TaxClassification, ThriveError,
};

// =============================================================================
// RE-EXPORTS: Truth Engine
// =============================================================================

pub use confidence::{ConfidenceAssessment, assess_confidence};
pub use report::{format_currency, render_report};
pub use truth::{PositionInput, TruthResult, calculate_truth};

// =============================================================================
// RE-EXPORTS: Capital & Plans
// =============================================================================

pub use adapter::{DryRunResult, DryRunTxResult, EthereumTxPayload, plan_to_payloads, simulate};
pub use capital::{CapitalSnapshot, ClassificationPolicy, ObservedBalance, StateEngine};
pub use controller::{ExecutionController, ExecutionDecision, GuardPolicy};
pub use plan::{
    CapitalExposure, CapitalState, ExecutionIntent, ExecutionPlan, ExecutionStep, PlanSummary,
    SignatureRequirement, plan_digest,
};
pub use planner::{ExecutionPlanner, validate_plan};
pub use session::{AccountView, Session, SessionStatus, SimulationOutcome, WalletContext};

// =============================================================================
// RE-EXPORTS: Custody
// =============================================================================

pub use formats::{PersistenceHeader, record_from_bytes, record_to_bytes};
pub use storage::RedbKeyStore;
pub use wallet::{
    Account, ActiveAccounts, DerivationPath, EncryptedPayload, FileKeyStore, KeyStore,
    MemoryKeyStore, PassphraseEncryptor, WalletCore, WalletMetadata, WalletRecord, WalletStatus,
    open_keystore,
};
