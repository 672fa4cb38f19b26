//! # AI Advisor
//!
//! Read-only advisory notes from a chat-completion provider.
//!
//! The advisor never sees secrets: every object key that looks like key
//! material is stripped before the context leaves the process. It is
//! opt-in per request and has no access to the execution controller.

use crate::config::AdvisorConfig;
use serde_json::{Map, Value, json};
use std::time::Duration;
use thiserror::Error;

/// Key fragments that never leave the process.
const FORBIDDEN_KEY_FRAGMENTS: [&str; 5] = ["seed", "passphrase", "private", "secret", "mnemonic"];

/// Sampling temperature for advisory requests.
pub const ADVISOR_TEMPERATURE: f64 = 0.2;

const SYSTEM_PROMPT: &str = "You are a read-only advisory assistant for a local, single-user \
capital OS. Provide concise, cautious explanations of plans, simulations, and capital \
snapshots. Do not give execution commands.";

const USER_PROMPT: &str =
    "Review the following context and provide advisory notes, risks, and clarifying questions if needed.";

/// Advisor failures. Messages are shown to the operator verbatim.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AdvisorError {
    #[error("API key is required.")]
    MissingApiKey,

    #[error("AI provider request failed.")]
    RequestFailed,

    #[error("AI provider returned invalid JSON.")]
    InvalidJson,

    #[error("AI provider returned an unexpected response.")]
    UnexpectedResponse,
}

// =============================================================================
// SANITIZATION
// =============================================================================

fn is_forbidden_key(key: &str) -> bool {
    let lowered = key.to_lowercase();
    FORBIDDEN_KEY_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

/// Recursively drop object keys that could carry secrets.
pub fn sanitize_context(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(key, _)| !is_forbidden_key(key))
                .map(|(key, item)| (key.clone(), sanitize_context(item)))
                .collect::<Map<String, Value>>(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_context).collect()),
        other => other.clone(),
    }
}

// =============================================================================
// PROVIDER PROTOCOL
// =============================================================================

/// Chat-completion body for an already sanitized context.
pub fn build_request_body(model: &str, context: &Value) -> Value {
    let pretty = serde_json::to_string_pretty(context).unwrap_or_else(|_| context.to_string());
    json!({
        "model": model,
        "temperature": ADVISOR_TEMPERATURE,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": format!("{}\n\n{}", USER_PROMPT, pretty) },
        ],
    })
}

/// First choice's message content, trimmed.
pub fn extract_advice(raw: &str) -> Result<String, AdvisorError> {
    let data: Value = serde_json::from_str(raw).map_err(|_| AdvisorError::InvalidJson)?;
    data.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
        .ok_or(AdvisorError::UnexpectedResponse)
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for the advisory provider.
#[derive(Debug, Clone)]
pub struct AdvisorClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
}

impl AdvisorClient {
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs()))
            .build()
            .map_err(|e| {
                tracing::warn!(error = %e, "Failed to build advisor HTTP client");
                AdvisorError::RequestFailed
            })?;
        Ok(Self {
            http,
            endpoint: config.endpoint().to_string(),
            model: config.model().to_string(),
        })
    }

    /// Ask the provider for advisory notes on `context`.
    pub async fn advise(&self, api_key: &str, context: &Value) -> Result<String, AdvisorError> {
        if api_key.trim().is_empty() {
            return Err(AdvisorError::MissingApiKey);
        }

        let body = build_request_body(&self.model, &sanitize_context(context));
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(event = "advisor_failure", error = %e, "Advisor request failed");
                AdvisorError::RequestFailed
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                event = "advisor_failure",
                status = status.as_u16(),
                "Advisor provider rejected the request"
            );
            return Err(AdvisorError::RequestFailed);
        }

        let raw = response.text().await.map_err(|e| {
            tracing::warn!(event = "advisor_failure", error = %e, "Advisor body unreadable");
            AdvisorError::RequestFailed
        })?;

        extract_advice(&raw)
    }
}

// =============================================================================
// TESTS
// =============================================================================
