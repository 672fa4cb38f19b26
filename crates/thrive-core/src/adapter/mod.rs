//! # Execution Adapter
//!
//! Translates validated plans into unsigned Ethereum-style payloads and
//! dry-runs them. Nothing here touches a network or a key.

mod simulator;

pub use simulator::simulate;

use crate::formats::to_hex;
use crate::plan::{ExecutionPlan, ExecutionStep};
use crate::planner::validate_plan;
use crate::primitives::{PAYLOAD_AMOUNT_DIGITS, SWAP_TARGET, TRANSFER_TARGET};
use crate::{ActionType, ThriveError};
use serde::{Deserialize, Serialize};

// =============================================================================
// MODELS
// =============================================================================

/// An unsigned transaction payload for one plan step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumTxPayload {
    pub step_sequence: u32,
    pub to_address: String,
    /// `0x`-prefixed hex data.
    pub data: String,
    pub value_wei: i64,
}

/// Simulated outcome of one payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryRunTxResult {
    pub step_sequence: u32,
    pub success: bool,
    pub gas_used: u64,
    pub cost_wei: u64,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Simulated outcome of a whole plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DryRunResult {
    pub success: bool,
    pub tx_results: Vec<DryRunTxResult>,
    pub total_gas_used: u64,
    pub total_cost_wei: u64,
    #[serde(default)]
    pub notes: Vec<String>,
}

// =============================================================================
// PAYLOADS
// =============================================================================

/// Build one payload per capital-moving step. HOLD steps are skipped.
pub fn plan_to_payloads(plan: &ExecutionPlan) -> Result<Vec<EthereumTxPayload>, ThriveError> {
    validate_plan(plan)?;

    plan.steps
        .iter()
        .filter(|step| step.action_type.moves_capital())
        .map(step_to_payload)
        .collect()
}

fn target_address(action: ActionType) -> Result<&'static str, ThriveError> {
    match action {
        ActionType::Transfer => Ok(TRANSFER_TARGET),
        ActionType::Swap => Ok(SWAP_TARGET),
        ActionType::Hold => Err(ThriveError::Adapter(
            "Unsupported action type for Ethereum adapter.".to_string(),
        )),
    }
}

fn step_to_payload(step: &ExecutionStep) -> Result<EthereumTxPayload, ThriveError> {
    if step.from_asset.is_empty() || step.to_asset.is_empty() {
        return Err(ThriveError::Adapter(
            "Step assets must be non-empty for Ethereum payloads.".to_string(),
        ));
    }

    Ok(EthereumTxPayload {
        step_sequence: step.sequence,
        to_address: target_address(step.action_type)?.to_string(),
        data: encode_step_data(step)?,
        value_wei: 0,
    })
}

fn encode_step_data(step: &ExecutionStep) -> Result<String, ThriveError> {
    let payload = format!(
        "{}|{}|{}|{}|{}",
        step.action_type,
        step.from_asset,
        step.to_asset,
        format_significant(step.amount, PAYLOAD_AMOUNT_DIGITS),
        step.sequence
    );
    if !payload.is_ascii() {
        return Err(ThriveError::Adapter(
            "Step assets must be ASCII for Ethereum payloads.".to_string(),
        ));
    }
    Ok(format!("0x{}", to_hex(payload.as_bytes())))
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Render `value` with `digits` significant digits in `%g` style:
/// fixed notation for moderate exponents, scientific otherwise, without
/// trailing zeros.
#[must_use]
pub fn format_significant(value: f64, digits: usize) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let limit = i32::try_from(digits).unwrap_or(i32::MAX);

    if exponent < -4 || exponent >= limit {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            strip_fraction_zeros(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let precision = usize::try_from(limit - 1 - exponent).unwrap_or(0);
        strip_fraction_zeros(&format!("{:.*}", precision, value)).to_string()
    }
}

// =============================================================================
// TESTS
// =============================================================================
