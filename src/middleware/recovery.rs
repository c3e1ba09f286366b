use std::panic::AssertUnwindSafe;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use tracing::error;

use crate::error::AppError;
use crate::middleware::client_ip::client_ip;

/// Outermost layer of the chain: a panic anywhere below — other middleware,
/// router, business handlers — becomes exactly one logged entry and one 500
/// response. Nothing internal reaches the client.
pub async fn recovery(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let ip = client_ip(&req);

    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let panic_value = panic_message(&panic);
            error!(
                method = %method,
                path = %path,
                ip = %ip,
                panic = %panic_value,
                "panic recovered while handling request"
            );
            AppError::Internal(panic_value).into_response()
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
