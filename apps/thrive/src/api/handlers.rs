//! # API Endpoint Handlers
//!
//! JSON handlers return `Result<Json<T>, ApiError>`; every domain error
//! becomes `{"error": message}` with a status picked by `ApiError::from`.

use super::{
    AppState, pages,
    types::{
        AccountSelectRequest, AccountsResponse, AdvisorRequest, AdvisorResponse, ArmRequest,
        ArmResponse, CalculateForm, ContextRequest, ErrorResponse, ExecuteRequest,
        ExecuteResponse, ExecutionModeRequest, HealthResponse, ModeResponse, OkResponse,
        PlanPayload, PlanRequest, SeedExportRequest, SeedExportResponse, TruthRequest,
        UnlockRequest, WalletStateResponse, parse_plan,
    },
};
use crate::advisor::AdvisorClient;
use axum::{
    Form, Json,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thrive_core::{
    ExecutionPlan, ExecutionPlanner, SessionStatus, SimulationOutcome, ThriveError, TruthResult,
    calculate_truth, primitives::SEED_WARNING,
};

// =============================================================================
// ERRORS
// =============================================================================

/// Error response with a status code and a message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ThriveError> for ApiError {
    fn from(error: ThriveError) -> Self {
        let status = match &error {
            ThriveError::InvalidPassphrase => StatusCode::UNAUTHORIZED,
            ThriveError::AccountNotFound => StatusCode::NOT_FOUND,
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %error, "Request failed");
        }
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse::new(self.message))).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// =============================================================================
// PAGES
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

pub async fn dashboard_handler() -> Html<String> {
    Html(pages::render_dashboard())
}

pub async fn truth_form_handler() -> Html<String> {
    Html(pages::render_truth_form(""))
}

/// Form post from the truth engine page. Invalid input re-renders the form
/// with the error instead of failing the request.
pub async fn calculate_handler(Form(form): Form<CalculateForm>) -> Html<String> {
    let section = match form.to_position().and_then(|p| calculate_truth(&p)) {
        Ok(result) => pages::render_result_section(&result),
        Err(e) => pages::render_error_section(&e.to_string()),
    };
    Html(pages::render_truth_form(&section))
}

// =============================================================================
// TRUTH ENGINE
// =============================================================================

pub async fn truth_handler(Json(request): Json<TruthRequest>) -> ApiResult<TruthResult> {
    let position = request.to_position()?;
    Ok(Json(calculate_truth(&position)?))
}

// =============================================================================
// CONTEXT & WALLET
// =============================================================================

pub async fn context_handler(
    State(state): State<AppState>,
    Json(request): Json<ContextRequest>,
) -> ApiResult<OkResponse> {
    let mut session = state.session.write().await;
    session.set_context(&request.keystore_path, &request.wallet_id)?;
    tracing::info!(event = "context_set", wallet_id = %request.wallet_id, "Wallet context set");
    Ok(Json(OkResponse::default()))
}

pub async fn status_handler(State(state): State<AppState>) -> ApiResult<SessionStatus> {
    let mut session = state.session.write().await;
    Ok(Json(session.status()?))
}

pub async fn unlock_handler(
    State(state): State<AppState>,
    Json(request): Json<UnlockRequest>,
) -> ApiResult<WalletStateResponse> {
    let mut session = state.session.write().await;
    if let Err(e) = session.unlock(&request.passphrase) {
        if matches!(e, ThriveError::InvalidPassphrase) {
            tracing::warn!(event = "unlock_failure", "Wallet unlock rejected");
        }
        return Err(e.into());
    }
    Ok(Json(WalletStateResponse {
        wallet_state: "UNLOCKED".to_string(),
    }))
}

pub async fn lock_handler(State(state): State<AppState>) -> ApiResult<WalletStateResponse> {
    let mut session = state.session.write().await;
    session.lock()?;
    Ok(Json(WalletStateResponse {
        wallet_state: "LOCKED".to_string(),
    }))
}

pub async fn seed_handler(
    State(state): State<AppState>,
    Json(request): Json<SeedExportRequest>,
) -> ApiResult<SeedExportResponse> {
    let mut session = state.session.write().await;
    let seed_phrase = session.export_seed(&request.passphrase, request.acknowledge_warning)?;
    let wallet_id = session.context()?.wallet_id.clone();
    tracing::warn!(event = "seed_export", wallet_id = %wallet_id, "Recovery phrase exported");
    Ok(Json(SeedExportResponse {
        wallet_id,
        seed_phrase,
        warning: SEED_WARNING.to_string(),
    }))
}

pub async fn accounts_handler(State(state): State<AppState>) -> ApiResult<AccountsResponse> {
    let mut session = state.session.write().await;
    Ok(Json(AccountsResponse {
        accounts: session.accounts()?,
    }))
}

pub async fn select_account_handler(
    State(state): State<AppState>,
    Json(request): Json<AccountSelectRequest>,
) -> ApiResult<OkResponse> {
    let mut session = state.session.write().await;
    session.select_account(&request.account_id)?;
    Ok(Json(OkResponse::default()))
}

// =============================================================================
// PLANS & SIMULATION
// =============================================================================

pub async fn plan_handler(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> ApiResult<ExecutionPlan> {
    let intent = request.to_intent()?;
    let plan = ExecutionPlanner::new().plan(intent, request.to_capital_state())?;
    let mut session = state.session.write().await;
    session.record_plan(plan.clone())?;
    Ok(Json(plan))
}

pub async fn simulate_handler(
    State(state): State<AppState>,
    Json(request): Json<PlanPayload>,
) -> ApiResult<SimulationOutcome> {
    let plan = parse_plan(request.plan)?;
    let mut session = state.session.write().await;
    Ok(Json(session.simulate(plan)?))
}

// =============================================================================
// EXECUTION
// =============================================================================

pub async fn mode_handler(
    State(state): State<AppState>,
    Json(request): Json<ExecutionModeRequest>,
) -> ApiResult<ModeResponse> {
    let (mode, policy) = request.to_mode_and_policy()?;
    let mut session = state.session.write().await;
    let mode = session.set_mode(mode, policy)?;
    tracing::info!(event = "mode_change", mode = %mode, "Execution mode changed");
    Ok(Json(ModeResponse { mode }))
}

pub async fn arm_handler(
    State(state): State<AppState>,
    Json(request): Json<ArmRequest>,
) -> ApiResult<ArmResponse> {
    let mut session = state.session.write().await;
    let armed = session.set_armed(request.armed);
    tracing::info!(event = "arm_change", armed, "Execution arming changed");
    Ok(Json(ArmResponse { armed }))
}

pub async fn execute_handler(
    State(state): State<AppState>,
    Json(request): Json<ExecuteRequest>,
) -> ApiResult<ExecuteResponse> {
    let plan = parse_plan(request.plan)?;
    let mut session = state.session.write().await;
    let decisions = session.execute(&plan, request.confirm_all)?;
    let mode = session.controller().mode();
    tracing::info!(
        event = "execution_evaluated",
        mode = %mode,
        steps = decisions.len(),
        "Plan passed the execution gate"
    );
    Ok(Json(ExecuteResponse { mode, decisions }))
}

// =============================================================================
// ADVISOR
// =============================================================================

pub async fn advisor_handler(
    State(state): State<AppState>,
    Json(request): Json<AdvisorRequest>,
) -> ApiResult<AdvisorResponse> {
    if !request.enabled {
        return Ok(Json(AdvisorResponse {
            advice: None,
            message: Some("AI advisory is disabled.".to_string()),
        }));
    }

    let client =
        AdvisorClient::new(&state.advisor).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let advice = client
        .advise(&request.api_key, &request.context())
        .await
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    Ok(Json(AdvisorResponse {
        advice: Some(advice),
        message: None,
    }))
}
