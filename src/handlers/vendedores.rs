use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::{success, AppError, Result};
use crate::handlers::{path_id, read_json};
use crate::models::VendedorRequest;
use crate::AppState;

pub async fn listar(state: AppState, _req: Request) -> Result<Response> {
    let vendedores = state.db.get_vendedores().await.map_err(|e| {
        error!(error = %e, "listar vendedores: error");
        e
    })?;
    Ok(success(StatusCode::OK, vendedores, ""))
}

pub async fn crear(state: AppState, req: Request) -> Result<Response> {
    let payload: VendedorRequest = read_json(req).await?;
    payload.validate().map_err(|e| {
        warn!("crear vendedor: validación fallida");
        e
    })?;

    let id = state.db.create_vendedor(&payload.nombre).await?;

    info!(vendedor_id = id, "vendedor creado");
    Ok(success(StatusCode::CREATED, json!({ "id": id }), "Vendedor creado"))
}

pub async fn actualizar(state: AppState, req: Request) -> Result<Response> {
    let id = path_id(&req, "id")
        .map_err(|_| AppError::BadRequest("ID de vendedor inválido".to_string()))?;

    let payload: VendedorRequest = read_json(req).await?;
    payload.validate()?;

    state.db.update_vendedor(id, &payload.nombre).await?;

    info!(vendedor_id = id, "vendedor actualizado");
    Ok(success(StatusCode::OK, json!({ "id": id }), "Vendedor actualizado"))
}

pub async fn eliminar(state: AppState, req: Request) -> Result<Response> {
    let id = path_id(&req, "id")
        .map_err(|_| AppError::BadRequest("ID de vendedor inválido".to_string()))?;

    state.db.delete_vendedor(id).await.map_err(|e| {
        warn!(vendedor_id = id, "eliminar vendedor: no encontrado");
        e
    })?;

    info!(vendedor_id = id, "vendedor eliminado");
    Ok(success(StatusCode::OK, json!({ "id": id }), "Vendedor eliminado"))
}
