//! # Thrive HTTP API Module
//!
//! This module implements the local HTTP server using axum.
//!
//! ## Endpoints
//!
//! - `GET /` - Operator dashboard (HTML)
//! - `GET /truth-engine` - Truth engine form (HTML)
//! - `POST /calculate` - Truth engine form submission (HTML)
//! - `GET /health` - Health check
//! - `POST /api/truth` - Evaluate one position
//! - `POST /api/context` - Select keystore and wallet
//! - `GET /api/status` - Wallet and controller status
//! - `POST /api/wallet/unlock`, `POST /api/wallet/lock`, `POST /api/wallet/seed`
//! - `GET /api/accounts`, `POST /api/accounts/select`
//! - `POST /api/plans`, `POST /api/simulate`
//! - `POST /api/execution/mode`, `POST /api/execution/arm`, `POST /api/execute`
//! - `POST /api/advisor` - Opt-in read-only advisory notes
//!
//! ## Security Configuration
//!
//! - Only loopback peers are served; anything else gets 403
//! - `THRIVE_CORS_ORIGINS` / `server.cors_origins`: comma-separated origins, or "*"
//!   (default: localhost only)
//! - `THRIVE_RATE_LIMIT` / `server.rate_limit`: requests per second (default: 100, 0 to disable)
//! - `THRIVE_API_KEY`: if set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod pages;
mod types;

// Re-exports for integration tests (via `thrive::api::*`)
pub use auth::get_api_key_from_env;
pub use handlers::ApiError;
pub use middleware::{create_rate_limiter, local_only_middleware};
pub use pages::escape_html;
pub use types::{
    AccountSelectRequest, AccountsResponse, AdvisorRequest, AdvisorResponse, ArmRequest,
    ArmResponse, CalculateForm, ContextRequest, ErrorResponse, ExecuteRequest, ExecuteResponse,
    ExecutionModeRequest, ExposureInput, HealthResponse, IntentInput, ModeResponse, OkResponse,
    PlanPayload, PlanRequest, SeedExportRequest, SeedExportResponse, TruthRequest, UnlockRequest,
    WalletStateResponse, parse_plan,
};

use crate::config::{AdvisorConfig, ServerConfig, ThriveConfig};
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use thrive_core::{Session, ThriveError};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    /// Operator session: wallet context, controller, last plan.
    pub session: Arc<RwLock<Session>>,
    pub server: ServerConfig,
    pub advisor: AdvisorConfig,
}

impl AppState {
    /// App state with compiled-default settings.
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self::with_config(session, &ThriveConfig::default())
    }

    #[must_use]
    pub fn with_config(session: Session, config: &ThriveConfig) -> Self {
        Self {
            session: Arc::new(RwLock::new(session)),
            server: config.server.clone(),
            advisor: config.advisor.clone(),
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build the CORS layer from `server.cors_origins`.
///
/// - `"*"`: allows all origins (development only)
/// - unset: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer(origins: Option<&str>) -> CorsLayer {
    match origins {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins. This is insecure outside development!");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!("CORS: No valid origins configured, defaulting to localhost only");
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => build_localhost_cors(),
    }
}

/// Restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Loopback only - rejects remote peers
/// 5. Rate Limiting (if enabled)
/// 6. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer(state.server.cors_origins.as_deref());

    let rate_limit = state.server.rate_limit();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::info!("API key authentication disabled; relying on loopback-only access");
    }

    let mut router = Router::new()
        .route("/", get(handlers::dashboard_handler))
        .route("/health", get(handlers::health_handler))
        .route("/truth-engine", get(handlers::truth_form_handler))
        .route("/calculate", post(handlers::calculate_handler))
        .route("/api/truth", post(handlers::truth_handler))
        .route("/api/context", post(handlers::context_handler))
        .route("/api/status", get(handlers::status_handler))
        .route("/api/wallet/unlock", post(handlers::unlock_handler))
        .route("/api/wallet/lock", post(handlers::lock_handler))
        .route("/api/wallet/seed", post(handlers::seed_handler))
        .route("/api/accounts", get(handlers::accounts_handler))
        .route("/api/accounts/select", post(handlers::select_account_handler))
        .route("/api/plans", post(handlers::plan_handler))
        .route("/api/simulate", post(handlers::simulate_handler))
        .route("/api/execution/mode", post(handlers::mode_handler))
        .route("/api/execution/arm", post(handlers::arm_handler))
        .route("/api/execute", post(handlers::execute_handler))
        .route("/api/advisor", post(handlers::advisor_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum_middleware::from_fn(middleware::local_only_middleware))
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), ThriveError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ThriveError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Thrive HTTP server listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| ThriveError::IoError(format!("Server error: {}", e)))
}
