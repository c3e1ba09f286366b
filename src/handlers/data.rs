use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;
use tracing::{error, info};

use crate::error::{success, Result};
use crate::models::DataResponse;
use crate::AppState;

/// Datos iniciales para el frontend: vendedores, clientes agrupados por
/// vendedor y productos activos.
pub async fn obtener_data(state: AppState, _req: Request) -> Result<Response> {
    let vendedores = state.db.get_vendedores().await?;
    let clientes_por_vendedor = state.db.get_clientes_por_vendedor().await?;
    let productos = state.db.get_productos().await?;

    Ok(success(
        StatusCode::OK,
        DataResponse {
            clientes_por_vendedor,
            vendedores,
            productos,
        },
        "",
    ))
}

pub async fn limpiar_base_datos(state: AppState, _req: Request) -> Result<Response> {
    state.db.limpiar_base_datos().await.map_err(|e| {
        error!(error = %e, "limpiar base de datos: error");
        e
    })?;

    info!("base de datos limpiada");
    Ok(success(
        StatusCode::OK,
        json!({ "status": "cleared" }),
        "Base de datos limpiada exitosamente",
    ))
}
