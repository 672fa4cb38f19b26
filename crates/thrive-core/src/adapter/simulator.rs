//! Offline dry-run of adapter payloads.

use super::{DryRunResult, DryRunTxResult, EthereumTxPayload};
use crate::ThriveError;
use crate::primitives::{SIMULATED_GAS_PRICE_WEI, SIMULATED_GAS_USED};

fn simulation_error(message: &str) -> ThriveError {
    ThriveError::Simulation(message.to_string())
}

fn validate_payload(payload: &EthereumTxPayload) -> Result<(), ThriveError> {
    if payload.to_address.is_empty() {
        return Err(simulation_error("Payload must include a target address."));
    }
    if !payload.data.starts_with("0x") {
        return Err(simulation_error("Payload data must be hex-prefixed."));
    }
    if payload.value_wei < 0 {
        return Err(simulation_error("Payload value must be non-negative."));
    }
    Ok(())
}

/// Price every payload at a fixed gas cost. No network calls.
pub fn simulate(payloads: &[EthereumTxPayload]) -> Result<DryRunResult, ThriveError> {
    let mut tx_results = Vec::with_capacity(payloads.len());
    let mut total_gas_used = 0u64;
    let mut total_cost_wei = 0u64;

    for payload in payloads {
        validate_payload(payload)?;
        let cost = SIMULATED_GAS_USED * SIMULATED_GAS_PRICE_WEI;
        tx_results.push(DryRunTxResult {
            step_sequence: payload.step_sequence,
            success: true,
            gas_used: SIMULATED_GAS_USED,
            cost_wei: cost,
            notes: vec!["Dry-run only; no execution performed.".to_string()],
        });
        total_gas_used += SIMULATED_GAS_USED;
        total_cost_wei += cost;
    }

    Ok(DryRunResult {
        success: true,
        tx_results,
        total_gas_used,
        total_cost_wei,
        notes: vec!["Simulation completed without network calls.".to_string()],
    })
}
