use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use tokio::time::Instant;
use tracing::info;

use crate::middleware::client_ip::client_ip;

/// Innermost wrapper around auth + dispatch: one structured log line per
/// request with the final status code. A handler that never sets a status
/// still logs 200, the `Response` default.
pub async fn logging(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let ip = client_ip(&req);
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
        .to_string();

    let response = next.run(req).await;

    info!(
        method = %method,
        path = %path,
        ip = %ip,
        status = response.status().as_u16(),
        duration_ms = start.elapsed().as_millis() as u64,
        user_agent = %user_agent,
        "http request"
    );

    response
}
