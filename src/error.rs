use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::error;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Solicitud inválida: {0}")]
    BadRequest(String),

    #[error("Recurso no encontrado")]
    NotFound,

    #[error("No autorizado: {0}")]
    Auth(String),

    #[error("Too many requests")]
    RateLimitExceeded,

    #[error("IP blocked due to suspicious activity")]
    IpBlocked,

    #[error("Too many requests from this IP")]
    DdosDetected,

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Wire format for every error the API emits
#[derive(Debug, Serialize)]
pub struct ResponseError {
    pub status: u16,
    pub message: String,
    pub code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Recurso no encontrado".to_string(),
            ),
            AppError::Auth(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg),
            AppError::RateLimitExceeded => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT_EXCEEDED",
                "Too many requests".to_string(),
            ),
            AppError::IpBlocked => (
                StatusCode::FORBIDDEN,
                "IP_BLOCKED",
                "IP blocked due to suspicious activity".to_string(),
            ),
            AppError::DdosDetected => (
                StatusCode::FORBIDDEN,
                "DDOS_DETECTED",
                "Too many requests from this IP".to_string(),
            ),
            // The detail is for logs at the point of failure; the body is
            // always the generic contract.
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "Internal server error".to_string(),
            ),
            AppError::Database(e) => {
                // The sqlx detail goes to the log, never to the client.
                error!("database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Error interno del servidor".to_string(),
                )
            }
        };

        let body = Json(ResponseError {
            status: status.as_u16(),
            message,
            code,
        });

        let mut response = (status, body).into_response();
        if status == StatusCode::TOO_MANY_REQUESTS {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, header::HeaderValue::from_static("1"));
        }
        response
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Standard success envelope: `{"status": .., "data": .., "message": ..}`
pub fn success<T: Serialize>(status: StatusCode, data: T, message: &str) -> Response {
    let mut body = json!({
        "status": status.as_u16(),
        "data": data,
    });
    if !message.is_empty() {
        body["message"] = json!(message);
    }
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limit_response_carries_retry_after() {
        let response = AppError::RateLimitExceeded.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            &header::HeaderValue::from_static("1")
        );
    }

    #[test]
    fn not_found_uses_wire_contract() {
        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
