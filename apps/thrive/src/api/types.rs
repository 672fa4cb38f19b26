//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Enum-valued fields (`action_type`, `mode`, `asset_type`) arrive as plain
//! strings and plans as raw JSON so that bad values surface as 400 with the
//! domain message instead of an extractor rejection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thrive_core::{
    AccountView, ActionType, AssetType, CapitalExposure, CapitalState, ExecutionDecision,
    ExecutionIntent, ExecutionMode, ExecutionPlan, GuardPolicy, PositionInput, ThriveError,
    validate_plan,
};

// =============================================================================
// COMMON
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// `{"status": "ok"}` acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OkResponse {
    pub status: String,
}

impl Default for OkResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Parse a raw plan and run full validation.
pub fn parse_plan(value: Value) -> Result<ExecutionPlan, ThriveError> {
    let plan: ExecutionPlan = serde_json::from_value(value)
        .map_err(|e| ThriveError::InvalidRequest(format!("Invalid plan: {}", e)))?;
    validate_plan(&plan)?;
    Ok(plan)
}

// =============================================================================
// TRUTH ENGINE
// =============================================================================

/// One position to evaluate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TruthRequest {
    pub asset_type: String,
    #[serde(default)]
    pub ticker: Option<String>,
    pub quantity: f64,
    pub cost_basis_per_unit: f64,
    pub current_price: f64,
    pub days_held: i64,
    #[serde(default)]
    pub state_tax_rate: Option<f64>,
}

impl TruthRequest {
    pub fn to_position(&self) -> Result<PositionInput, ThriveError> {
        let asset_type: AssetType = self.asset_type.parse()?;
        let ticker = self
            .ticker
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or("TICKER");
        let position = PositionInput::new(
            asset_type,
            ticker,
            self.quantity,
            self.cost_basis_per_unit,
            self.current_price,
            self.days_held,
        );
        Ok(match self.state_tax_rate {
            Some(rate) => position.with_state_tax_rate(rate),
            None => position,
        })
    }
}

/// HTML form submitted to `/calculate`.
///
/// `state_tax_rate` stays a string: blank or unparseable means "not provided".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculateForm {
    pub asset_type: String,
    pub quantity: f64,
    pub cost_basis_per_unit: f64,
    pub current_price: f64,
    pub days_held: i64,
    #[serde(default)]
    pub state_tax_rate: Option<String>,
}

impl CalculateForm {
    pub fn to_position(&self) -> Result<PositionInput, ThriveError> {
        TruthRequest {
            asset_type: self.asset_type.clone(),
            ticker: None,
            quantity: self.quantity,
            cost_basis_per_unit: self.cost_basis_per_unit,
            current_price: self.current_price,
            days_held: self.days_held,
            state_tax_rate: self
                .state_tax_rate
                .as_deref()
                .and_then(|raw| raw.trim().parse::<f64>().ok()),
        }
        .to_position()
    }
}

// =============================================================================
// WALLET
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextRequest {
    pub keystore_path: String,
    pub wallet_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlockRequest {
    pub passphrase: String,
}

/// `LOCKED` or `UNLOCKED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletStateResponse {
    pub wallet_state: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedExportRequest {
    pub passphrase: String,
    #[serde(default)]
    pub acknowledge_warning: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedExportResponse {
    pub wallet_id: String,
    pub seed_phrase: String,
    pub warning: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountsResponse {
    pub accounts: Vec<AccountView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSelectRequest {
    pub account_id: String,
}

// =============================================================================
// PLANS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExposureInput {
    pub asset_code: String,
    pub quantity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentInput {
    pub action_type: String,
    pub from_asset: String,
    pub to_asset: String,
    pub amount: f64,
    #[serde(default)]
    pub notes: Option<Vec<String>>,
}

/// Build a plan from a snapshot and an intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub snapshot_id: String,
    pub exposures: Vec<ExposureInput>,
    pub intent: IntentInput,
    #[serde(default)]
    pub notes: Option<Vec<String>>,
}

impl PlanRequest {
    pub fn to_intent(&self) -> Result<ExecutionIntent, ThriveError> {
        let action: ActionType = self.intent.action_type.parse()?;
        let mut intent = ExecutionIntent::new(
            action,
            &self.intent.from_asset,
            &self.intent.to_asset,
            self.intent.amount,
        );
        intent.notes = self.intent.notes.clone().unwrap_or_default();
        Ok(intent)
    }

    pub fn to_capital_state(&self) -> CapitalState {
        let mut state = CapitalState::new(
            &self.snapshot_id,
            self.exposures
                .iter()
                .map(|e| CapitalExposure::new(&e.asset_code, e.quantity))
                .collect(),
        );
        state.notes = self.notes.clone().unwrap_or_default();
        state
    }
}

/// A plan as returned by `/api/plans`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanPayload {
    pub plan: Value,
}

// =============================================================================
// EXECUTION
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionModeRequest {
    pub mode: String,
    #[serde(default)]
    pub allowed_action_types: Option<Vec<String>>,
    #[serde(default)]
    pub allowed_assets: Option<Vec<String>>,
}

impl ExecutionModeRequest {
    /// Target mode and, for GUARDED, the policy built from the allow-lists.
    pub fn to_mode_and_policy(&self) -> Result<(ExecutionMode, Option<GuardPolicy>), ThriveError> {
        let mode: ExecutionMode = self.mode.parse()?;
        if mode != ExecutionMode::Guarded {
            return Ok((mode, None));
        }

        let actions = self.allowed_action_types.as_deref().unwrap_or_default();
        if actions.is_empty() {
            return Err(ThriveError::PolicyViolation(
                "Guarded mode requires allowed actions.".to_string(),
            ));
        }
        let actions = actions
            .iter()
            .map(|a| a.parse::<ActionType>())
            .collect::<Result<Vec<_>, _>>()?;

        let mut policy = GuardPolicy::new(actions);
        if let Some(assets) = self.allowed_assets.as_ref().filter(|a| !a.is_empty()) {
            policy = policy.with_allowed_assets(assets.clone());
        }
        Ok((mode, Some(policy)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeResponse {
    pub mode: ExecutionMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmRequest {
    pub armed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmResponse {
    pub armed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    pub plan: Value,
    #[serde(default)]
    pub confirm_all: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteResponse {
    pub mode: ExecutionMode,
    pub decisions: Vec<ExecutionDecision>,
}

// =============================================================================
// ADVISOR
// =============================================================================

/// Opt-in advisory request. The key is used for one call and never stored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvisorRequest {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub plan: Option<Value>,
    #[serde(default)]
    pub simulation: Option<Value>,
    #[serde(default)]
    pub snapshot: Option<Value>,
}

impl AdvisorRequest {
    /// Context handed to the advisor (sanitized again by the client).
    pub fn context(&self) -> Value {
        serde_json::json!({
            "plan": self.plan,
            "simulation": self.simulation,
            "snapshot": self.snapshot,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
