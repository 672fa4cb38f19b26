//! # Thrive HTTP Client
//!
//! Wrapper around the Thrive REST API for use by the MCP server.

use serde_json::Value;

/// Errors from the HTTP client layer.
#[derive(Debug)]
pub enum ClientError {
    /// Cannot reach the Thrive server.
    ConnectionFailed(String),
    /// 401 Unauthorized - invalid or missing API key.
    Unauthorized,
    /// 429 Too Many Requests.
    RateLimited,
    /// Any other 4xx, with the server's `error` message.
    Rejected(u16, String),
    /// Server returned a 5xx error.
    ServerError(u16, String),
    /// Failed to parse response body.
    ParseError(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(url) => write!(f, "Cannot connect to Thrive at {url}"),
            Self::Unauthorized => write!(f, "Unauthorized: invalid or missing API key"),
            Self::RateLimited => write!(f, "Rate limited: too many requests"),
            Self::Rejected(status, msg) => write!(f, "Request rejected ({status}): {msg}"),
            Self::ServerError(status, msg) => write!(f, "Server error ({status}): {msg}"),
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
        }
    }
}

impl std::error::Error for ClientError {}

/// `error` field of an API error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

/// HTTP client for the read-only subset of the Thrive REST API.
#[derive(Clone)]
pub struct ThriveClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ThriveClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Build a request with optional Bearer auth.
    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.http.request(method, &url);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        req
    }

    /// Map error statuses, then parse the JSON body.
    async fn handle_response(&self, resp: reqwest::Response) -> Result<Value, ClientError> {
        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized);
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ClientError::RateLimited);
        }
        if status.is_client_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Rejected(status.as_u16(), error_message(&body)));
        }
        if status.is_server_error() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::ServerError(status.as_u16(), error_message(&body)));
        }
        resp.json::<Value>()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }

    async fn send(&self, req: reqwest::RequestBuilder) -> Result<Value, ClientError> {
        let resp = req
            .send()
            .await
            .map_err(|e| ClientError::ConnectionFailed(format!("{}: {e}", self.base_url)))?;
        self.handle_response(resp).await
    }

    /// GET /health
    pub async fn health(&self) -> Result<Value, ClientError> {
        self.send(self.request(reqwest::Method::GET, "/health")).await
    }

    /// GET /api/status → wallet and execution state of the server session.
    pub async fn status(&self) -> Result<Value, ClientError> {
        self.send(self.request(reqwest::Method::GET, "/api/status"))
            .await
    }

    /// POST /api/truth → after-tax liquidation result.
    pub async fn truth(&self, position: Value) -> Result<Value, ClientError> {
        self.send(self.request(reqwest::Method::POST, "/api/truth").json(&position))
            .await
    }

    /// POST /api/plans → execution plan for an intent and snapshot.
    pub async fn plan(&self, request: Value) -> Result<Value, ClientError> {
        self.send(self.request(reqwest::Method::POST, "/api/plans").json(&request))
            .await
    }

    /// POST /api/simulate → payloads and dry-run result.
    pub async fn simulate(&self, plan: Value) -> Result<Value, ClientError> {
        let body = serde_json::json!({ "plan": plan });
        self.send(self.request(reqwest::Method::POST, "/api/simulate").json(&body))
            .await
    }
}
