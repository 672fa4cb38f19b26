//! # Thrive MCP Server
//!
//! Implements `ServerHandler` with five read-only MCP tools that proxy to
//! the Thrive HTTP API. Nothing here can unlock a wallet or arm execution.

use crate::client::ThriveClient;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// MCP SERVER
// =============================================================================

/// MCP server that bridges to a Thrive HTTP API.
#[derive(Clone)]
pub struct ThriveMcp {
    client: ThriveClient,
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

// =============================================================================
// TOOL PARAMETER STRUCTS
// =============================================================================

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TruthParams {
    #[schemars(description = "Asset type: 'stock' or 'crypto'")]
    pub asset_type: String,
    #[schemars(description = "Ticker symbol (optional)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[schemars(description = "Units held")]
    pub quantity: f64,
    #[schemars(description = "Cost basis per unit in USD")]
    pub cost_basis_per_unit: f64,
    #[schemars(description = "Current price per unit in USD")]
    pub current_price: f64,
    #[schemars(description = "Days the position has been held")]
    pub days_held: i64,
    #[schemars(description = "State tax rate as a fraction, e.g. 0.05 (optional)")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_tax_rate: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExposureParam {
    #[schemars(description = "Asset code, e.g. 'ETH'")]
    pub asset_code: String,
    #[schemars(description = "Quantity held")]
    pub quantity: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PlanParams {
    #[schemars(description = "Capital snapshot identifier")]
    pub snapshot_id: String,
    #[schemars(description = "Capital exposures in the snapshot")]
    pub exposures: Vec<ExposureParam>,
    #[schemars(description = "Action type: SWAP, TRANSFER or HOLD")]
    pub action_type: String,
    #[schemars(description = "Asset to move from")]
    pub from_asset: String,
    #[schemars(description = "Asset to move to")]
    pub to_asset: String,
    #[schemars(description = "Amount of from_asset")]
    pub amount: f64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SimulateParams {
    /// A plan as returned by `thrive_plan`.
    #[schemars(description = "Execution plan JSON as returned by thrive_plan")]
    pub plan: Value,
}

// =============================================================================
// TOOL IMPLEMENTATIONS
// =============================================================================

fn tool_error(e: impl std::fmt::Display) -> McpError {
    McpError::internal_error(format!("{e}"), None)
}

fn text_result(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl ThriveMcp {
    pub fn new(client: ThriveClient) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "After-tax liquidation value of a single stock or crypto position")]
    async fn thrive_truth(
        &self,
        params: Parameters<TruthParams>,
    ) -> Result<CallToolResult, McpError> {
        let position = serde_json::to_value(&params.0).map_err(tool_error)?;
        let resp = self.client.truth(position).await.map_err(tool_error)?;
        text_result(format_truth(&resp))
    }

    #[tool(description = "Build a deterministic execution plan for an intent over a capital snapshot")]
    async fn thrive_plan(
        &self,
        params: Parameters<PlanParams>,
    ) -> Result<CallToolResult, McpError> {
        let PlanParams {
            snapshot_id,
            exposures,
            action_type,
            from_asset,
            to_asset,
            amount,
        } = params.0;
        let request = serde_json::json!({
            "snapshot_id": snapshot_id,
            "exposures": exposures,
            "intent": {
                "action_type": action_type,
                "from_asset": from_asset,
                "to_asset": to_asset,
                "amount": amount,
            },
        });
        let resp = self.client.plan(request).await.map_err(tool_error)?;
        text_result(format_plan(&resp))
    }

    #[tool(description = "Dry-run a plan: transaction payloads, gas and cost. Nothing is broadcast")]
    async fn thrive_simulate(
        &self,
        params: Parameters<SimulateParams>,
    ) -> Result<CallToolResult, McpError> {
        let resp = self
            .client
            .simulate(params.0.plan)
            .await
            .map_err(tool_error)?;
        text_result(format_simulation(&resp))
    }

    #[tool(description = "Wallet lock state, active account and execution mode of the server session")]
    async fn thrive_status(&self) -> Result<CallToolResult, McpError> {
        let resp = self.client.status().await.map_err(tool_error)?;
        text_result(format_status(&resp))
    }

    #[tool(description = "Check that the Thrive server is reachable")]
    async fn thrive_health(&self) -> Result<CallToolResult, McpError> {
        let resp = self.client.health().await.map_err(tool_error)?;
        let version = resp.get("version").and_then(Value::as_str).unwrap_or("?");
        text_result(format!("Thrive is up (version {version})."))
    }
}

// =============================================================================
// SERVER HANDLER
// =============================================================================

#[tool_handler]
impl ServerHandler for ThriveMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Thrive capital OS. Read-only tools: compute after-tax liquidation truth, \
                 build and simulate execution plans, and inspect session status. \
                 Execution and key material are not reachable from here."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

// =============================================================================
// RESPONSE FORMATTING
// =============================================================================

fn str_field<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("?")
}

fn num_field(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

fn format_truth(resp: &Value) -> String {
    let mut lines = vec![
        format!("Gross value: ${:.2}", num_field(resp, "gross_value")),
        format!("Total gain: ${:.2}", num_field(resp, "total_gain")),
        format!("Classification: {}", str_field(resp, "tax_classification")),
        format!(
            "Taxes: federal ${:.2}, state ${:.2}, total ${:.2}",
            num_field(resp, "federal_tax"),
            num_field(resp, "state_tax"),
            num_field(resp, "total_tax")
        ),
        format!("Net liquid wealth: ${:.2}", num_field(resp, "net_liquid_wealth")),
        format!("Efficiency: {:.1}%", num_field(resp, "efficiency_score")),
        format!("Confidence: {}", str_field(resp, "confidence_level")),
    ];
    if let Some(days) = resp
        .get("tax_classification_countdown")
        .and_then(Value::as_i64)
    {
        lines.push(format!("Days until long-term: {days}"));
    }
    lines.join("\n")
}

fn format_plan(resp: &Value) -> String {
    let mut parts = Vec::new();

    if let Some(steps) = resp.get("steps").and_then(Value::as_array) {
        parts.push(format!("Steps ({}):", steps.len()));
        for step in steps {
            parts.push(format!(
                "  {}. {} {} {} -> {}",
                step.get("sequence").and_then(Value::as_u64).unwrap_or(0),
                str_field(step, "action_type"),
                num_field(step, "amount"),
                str_field(step, "from_asset"),
                str_field(step, "to_asset"),
            ));
        }
    }

    for (key, title) in [("assumptions", "Assumptions"), ("failure_modes", "Failure modes")] {
        if let Some(items) = resp.get(key).and_then(Value::as_array)
            && !items.is_empty()
        {
            parts.push(format!("{title}:"));
            parts.extend(items.iter().filter_map(Value::as_str).map(|s| format!("  - {s}")));
        }
    }

    parts.push(format!("Estimated cost: {}", num_field(resp, "estimated_cost")));
    // Callers pass the plan back to thrive_simulate verbatim.
    parts.push(format!("Plan JSON:\n{resp}"));
    parts.join("\n")
}

fn format_simulation(resp: &Value) -> String {
    let payloads = resp
        .get("payloads")
        .and_then(Value::as_array)
        .map_or(0, Vec::len);
    let dry_run = resp.get("dry_run").unwrap_or(&Value::Null);
    let success = dry_run
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let gas = dry_run
        .get("total_gas_used")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let cost = dry_run
        .get("total_cost_wei")
        .and_then(Value::as_u64)
        .unwrap_or(0);

    let mut parts = vec![
        format!("Transactions: {payloads}"),
        format!("Dry run success: {success}"),
        format!("Total gas used: {gas}"),
        format!("Total cost (wei): {cost}"),
    ];
    if let Some(notes) = dry_run.get("notes").and_then(Value::as_array)
        && !notes.is_empty()
    {
        parts.push("Notes:".to_string());
        parts.extend(notes.iter().filter_map(Value::as_str).map(|s| format!("  - {s}")));
    }
    parts.join("\n")
}

fn format_status(resp: &Value) -> String {
    let account = resp
        .get("active_account")
        .and_then(Value::as_str)
        .unwrap_or("NONE");
    let armed = resp.get("armed").and_then(Value::as_bool).unwrap_or(false);
    format!(
        "Session Status:\n  Wallet: {}\n  Active account: {account}\n  Active address: {}\n  Execution mode: {}\n  Armed: {armed}",
        str_field(resp, "wallet_state"),
        str_field(resp, "active_address"),
        str_field(resp, "execution_mode"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truth_lists_countdown_when_present() {
        let text = format_truth(&json!({
            "gross_value": 1500.0,
            "net_liquid_wealth": 1400.0,
            "tax_classification": "short_term",
            "confidence_level": "high",
            "tax_classification_countdown": 30
        }));
        assert!(text.contains("Net liquid wealth: $1400.00"));
        assert!(text.contains("Days until long-term: 30"));
    }

    #[test]
    fn plan_lists_steps_and_assumptions() {
        let text = format_plan(&json!({
            "steps": [{"sequence": 1, "action_type": "SWAP", "amount": 1.0,
                       "from_asset": "ETH", "to_asset": "USDC"}],
            "assumptions": ["Prices are static."],
            "failure_modes": [],
            "estimated_cost": 0.0
        }));
        assert!(text.contains("Steps (1):"));
        assert!(text.contains("  1. SWAP 1 ETH -> USDC"));
        assert!(text.contains("  - Prices are static."));
        assert!(!text.contains("Failure modes:"));
    }

    #[test]
    fn simulation_tolerates_missing_fields() {
        let text = format_simulation(&json!({}));
        assert!(text.contains("Transactions: 0"));
        assert!(text.contains("Dry run success: false"));
    }

    #[test]
    fn status_defaults_missing_account() {
        let text = format_status(&json!({
            "wallet_state": "LOCKED",
            "active_account": null,
            "active_address": "LOCKED",
            "execution_mode": "SAFE",
            "armed": false
        }));
        assert!(text.contains("Active account: NONE"));
        assert!(text.contains("Execution mode: SAFE"));
    }
}
