use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::error::Result;
use crate::AppState;

pub async fn health_check(_state: AppState, _req: Request) -> Result<Response> {
    Ok(Json(json!({ "status": "ok" })).into_response())
}
