//! # Execution Plan Model
//!
//! Data types shared by the planner, the controller and the adapter.
//!
//! A plan is a fully explained, unsigned description of what would happen
//! to a capital snapshot. It carries its own assumptions, failure modes and
//! the signatures it would need. JSON field names are the wire contract for
//! the CLI plan files and the HTTP API.

use crate::{ActionType, ThriveError};
use serde::{Deserialize, Serialize};

// =============================================================================
// CAPITAL STATE
// =============================================================================

/// Quantity held of one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalExposure {
    pub asset_code: String,
    pub quantity: f64,
}

impl CapitalExposure {
    #[must_use]
    pub fn new(asset_code: impl Into<String>, quantity: f64) -> Self {
        Self {
            asset_code: asset_code.into(),
            quantity,
        }
    }
}

/// The capital a plan starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapitalState {
    pub snapshot_id: String,
    pub exposures: Vec<CapitalExposure>,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl CapitalState {
    #[must_use]
    pub fn new(snapshot_id: impl Into<String>, exposures: Vec<CapitalExposure>) -> Self {
        Self {
            snapshot_id: snapshot_id.into(),
            exposures,
            notes: Vec::new(),
        }
    }

    /// Sum of all exposure quantities.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.exposures.iter().map(|e| e.quantity).sum()
    }
}

// =============================================================================
// INTENT
// =============================================================================

/// What the operator wants to happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionIntent {
    pub action_type: ActionType,
    pub from_asset: String,
    pub to_asset: String,
    pub amount: f64,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl ExecutionIntent {
    #[must_use]
    pub fn new(
        action_type: ActionType,
        from_asset: impl Into<String>,
        to_asset: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            action_type,
            from_asset: from_asset.into(),
            to_asset: to_asset.into(),
            amount,
            notes: Vec::new(),
        }
    }
}

// =============================================================================
// PLAN
// =============================================================================

/// A signature a step would need before it could move capital.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRequirement {
    pub signer_reference: String,
    pub purpose: String,
}

/// One ordered step of a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub sequence: u32,
    pub action_type: ActionType,
    pub from_asset: String,
    pub to_asset: String,
    pub amount: f64,
    pub rationale: String,
}

/// An explainable, unsigned execution plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub intent: ExecutionIntent,
    pub capital_state: CapitalState,
    pub steps: Vec<ExecutionStep>,
    pub assumptions: Vec<String>,
    pub failure_modes: Vec<String>,
    pub required_signatures: Vec<SignatureRequirement>,
    pub estimated_cost: f64,
}

/// Short description of a plan for status output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub action_type: ActionType,
    pub from_asset: String,
    pub to_asset: String,
    pub amount: f64,
    pub steps: usize,
}

impl ExecutionPlan {
    #[must_use]
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            action_type: self.intent.action_type,
            from_asset: self.intent.from_asset.clone(),
            to_asset: self.intent.to_asset.clone(),
            amount: self.intent.amount,
            steps: self.steps.len(),
        }
    }
}

// =============================================================================
// DIGEST
// =============================================================================

/// BLAKE3 hex digest of the plan's postcard encoding.
///
/// Two plans with the same digest describe the same steps over the same
/// capital state. Used to bind an execution request to a simulated plan.
pub fn plan_digest(plan: &ExecutionPlan) -> Result<String, ThriveError> {
    let bytes =
        postcard::to_stdvec(plan).map_err(|e| ThriveError::SerializationError(e.to_string()))?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

// =============================================================================
// TESTS
// =============================================================================
