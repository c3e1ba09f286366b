pub mod auth;
pub mod data;
pub mod health;
pub mod productos;
pub mod usuarios;
pub mod vendedores;
pub mod ventas;

use axum::extract::Request;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{AppError, Result};
use crate::routing::param;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Decode the request body into a typed struct. Malformed input is a 400,
/// never a panic.
pub(crate) async fn read_json<T: DeserializeOwned>(req: Request) -> Result<T> {
    let bytes = axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES)
        .await
        .map_err(|_| AppError::BadRequest("JSON inválido".to_string()))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        warn!("body JSON inválido: {e}");
        AppError::BadRequest("JSON inválido".to_string())
    })
}

/// Parse a positive numeric id from a path parameter.
pub(crate) fn path_id(req: &Request, name: &str) -> Result<i64> {
    param(req, name)
        .and_then(|raw| raw.parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest("ID inválido".to_string()))
}
