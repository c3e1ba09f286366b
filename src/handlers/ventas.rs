use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::{success, AppError, Result};
use crate::handlers::{path_id, read_json};
use crate::models::{ActualizarVentaRequest, VentaRequest};
use crate::AppState;

pub async fn crear_venta(state: AppState, req: Request) -> Result<Response> {
    let payload: VentaRequest = read_json(req).await?;
    payload.validate().map_err(|e| {
        warn!(error = %e, "crear venta: validación fallida");
        e
    })?;

    let vendedor = payload.vendedor.trim();
    let vendedor_id = state
        .db
        .get_vendedor_id(vendedor)
        .await?
        .ok_or_else(|| {
            warn!(vendedor = %vendedor, "crear venta: vendedor no encontrado");
            AppError::BadRequest(format!("Vendedor '{vendedor}' no encontrado"))
        })?;

    for item in &payload.items {
        if !state.db.exists_producto(item.product_id).await? {
            return Err(AppError::BadRequest(format!(
                "Producto con ID {} no existe",
                item.product_id
            )));
        }
    }

    let cliente_id = resolver_cliente(&state, &payload).await?;
    let total = payload.total();

    let venta_id = state
        .db
        .crear_venta(
            cliente_id,
            vendedor_id,
            total,
            &payload.payment_method,
            &payload.estado,
            &payload.tipo_entrega,
            &payload.items,
        )
        .await
        .map_err(|e| {
            error!(error = %e, "crear venta: error guardando");
            e
        })?;

    info!(venta_id, total, "venta creada");
    Ok(success(
        StatusCode::CREATED,
        json!({ "id": venta_id }),
        "Venta creada",
    ))
}

/// Get-or-create del cliente; si ya existe y llegó un teléfono distinto,
/// se actualiza sin frenar la venta cuando falla.
async fn resolver_cliente(state: &AppState, payload: &VentaRequest) -> Result<Option<i64>> {
    let nombre = payload.cliente.trim();
    if nombre.is_empty() {
        return Ok(None);
    }

    if let Some(existente) = state.db.get_cliente_by_nombre(nombre).await? {
        if let Some(telefono) = payload.telefono_cliente {
            if telefono != 0 && Some(telefono) != existente.telefono {
                if let Err(e) = state.db.update_cliente_telefono(existente.id, telefono).await {
                    warn!(
                        cliente_id = existente.id,
                        error = %e,
                        "no se pudo actualizar el teléfono del cliente"
                    );
                }
            }
        }
        return Ok(Some(existente.id));
    }

    let telefono = payload.telefono_cliente.filter(|t| *t != 0);
    let id = state.db.create_cliente(nombre, telefono).await?;
    Ok(Some(id))
}

pub async fn actualizar_venta(state: AppState, req: Request) -> Result<Response> {
    let venta_id = path_id(&req, "id").map_err(|_| {
        warn!("actualizar venta: ID inválido");
        AppError::BadRequest("ID de venta inválido".to_string())
    })?;

    let payload: ActualizarVentaRequest = read_json(req).await?;
    payload.validate()?;

    state
        .db
        .update_venta(
            venta_id,
            &payload.estado,
            &payload.payment_method,
            &payload.tipo_entrega,
            &payload.productos_eliminar,
            &payload.productos,
        )
        .await
        .map_err(|e| {
            error!(venta_id, error = %e, "actualizar venta: error");
            e
        })?;

    info!(venta_id, "venta actualizada");
    Ok(success(
        StatusCode::OK,
        json!({ "id": venta_id }),
        "Venta actualizada",
    ))
}

pub async fn obtener_estadisticas(state: AppState, _req: Request) -> Result<Response> {
    let resumen = state.db.get_resumen().await?;
    let vendedores = state.db.get_vendedores_con_stats().await?;
    let ventas = state.db.get_all_ventas(false).await?;

    Ok(success(
        StatusCode::OK,
        json!({
            "resumen": resumen,
            "vendedores": vendedores,
            "ventas": ventas,
        }),
        "",
    ))
}

pub async fn obtener_todas_ventas(state: AppState, _req: Request) -> Result<Response> {
    let ventas = state.db.get_all_ventas(true).await?;
    Ok(success(StatusCode::OK, ventas, ""))
}
