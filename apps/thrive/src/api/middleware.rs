//! # Middleware Module
//!
//! Rate limiting and loopback enforcement for the Thrive HTTP API.
//!
//! ## Configuration
//!
//! - `THRIVE_RATE_LIMIT` / `server.rate_limit`: requests per second
//!   (default: 100, 0 disables limiting)

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Fallback when a zero rate reaches the limiter constructor.
const DEFAULT_RPS: NonZeroU32 = NonZeroU32::MIN.saturating_add(99);

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a new global rate limiter.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Returns 429 Too Many Requests once the global quota is spent.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    match limiter.check() {
        Ok(_) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!("Rate limit exceeded");
            Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
        }
    }
}

// =============================================================================
// LOOPBACK ONLY
// =============================================================================

/// Reject peers that are not on the loopback interface.
///
/// Requests without connection info (in-process test clients) pass.
pub async fn local_only_middleware(
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    if let Some(ConnectInfo(peer)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        if !peer.ip().to_canonical().is_loopback() {
            tracing::warn!(
                event = "remote_access_denied",
                peer = %peer,
                "Rejected non-loopback peer"
            );
            return Err((
                StatusCode::FORBIDDEN,
                Json(ErrorResponse::new("Remote access disabled.")),
            ));
        }
    }
    Ok(next.run(request).await)
}

// =============================================================================
// TESTS
// =============================================================================
