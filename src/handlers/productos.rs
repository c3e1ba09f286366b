use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::{success, AppError, Result};
use crate::handlers::{path_id, read_json};
use crate::models::{ActualizarProductoRequest, CrearProductoRequest};
use crate::AppState;

pub async fn listar(state: AppState, _req: Request) -> Result<Response> {
    let productos = state.db.get_productos().await.map_err(|e| {
        error!(error = %e, "listar productos: error");
        e
    })?;
    Ok(success(StatusCode::OK, productos, ""))
}

pub async fn crear(state: AppState, req: Request) -> Result<Response> {
    let payload: CrearProductoRequest = read_json(req).await?;
    payload.validate().map_err(|e| {
        warn!(tipo_pizza = %payload.tipo_pizza, "crear producto: validación fallida");
        e
    })?;

    let id = state
        .db
        .create_producto(&payload.tipo_pizza, &payload.descripcion, payload.precio)
        .await?;

    info!(producto_id = id, "producto creado");
    Ok(success(StatusCode::CREATED, json!({ "id": id }), "Producto creado"))
}

pub async fn actualizar(state: AppState, req: Request) -> Result<Response> {
    let id = path_id(&req, "id")
        .map_err(|_| AppError::BadRequest("ID de producto inválido".to_string()))?;

    let payload: ActualizarProductoRequest = read_json(req).await?;
    payload.validate()?;

    state
        .db
        .update_producto(
            id,
            &payload.tipo_pizza,
            &payload.descripcion,
            payload.precio,
            payload.activo,
        )
        .await?;

    info!(producto_id = id, "producto actualizado");
    Ok(success(StatusCode::OK, json!({ "id": id }), "Producto actualizado"))
}

pub async fn eliminar(state: AppState, req: Request) -> Result<Response> {
    let id = path_id(&req, "id")
        .map_err(|_| AppError::BadRequest("ID de producto inválido".to_string()))?;

    state.db.delete_producto(id).await.map_err(|e| {
        warn!(producto_id = id, "eliminar producto: no encontrado");
        e
    })?;

    info!(producto_id = id, "producto eliminado");
    Ok(success(StatusCode::OK, json!({ "id": id }), "Producto eliminado"))
}
