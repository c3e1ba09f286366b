use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::middleware::client_ip::client_ip;
use crate::AppState;

/// DDoS admission gate: already-quarantined IPs get 403 `IP_BLOCKED`; an
/// IP that trips the threshold on this request gets 403 `DDOS_DETECTED`.
pub async fn ddos_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let ip = client_ip(&req);

    if state.ddos.is_blocked(&ip).await {
        warn!(ip = %ip, "request from blocked ip rejected");
        return Err(AppError::IpBlocked);
    }

    if !state.ddos.record_request(&ip).await {
        warn!(ip = %ip, "ddos threshold exceeded, ip quarantined");
        return Err(AppError::DdosDetected);
    }

    Ok(next.run(req).await)
}

/// Per-IP rate limit gate: over-threshold requests get 429 with
/// `Retry-After: 1`.
pub async fn rate_limit_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response> {
    let ip = client_ip(&req);

    if !state.rate_limiter.allow(&ip).await {
        warn!(ip = %ip, "rate limit exceeded");
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(req).await)
}
