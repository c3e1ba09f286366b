use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::{success, AppError, Result};
use crate::handlers::{path_id, read_json};
use crate::models::{CreateUsuarioRequest, UpdateUsuarioRequest};
use crate::{password, AppState};

pub async fn listar(state: AppState, _req: Request) -> Result<Response> {
    let usuarios = state.db.get_all_users().await.map_err(|e| {
        error!(error = %e, "listar usuarios: error");
        e
    })?;

    info!(count = usuarios.len(), "usuarios listados");
    Ok(success(StatusCode::OK, usuarios, "Usuarios obtenidos"))
}

pub async fn crear(state: AppState, req: Request) -> Result<Response> {
    let payload: CreateUsuarioRequest = read_json(req).await?;
    payload.validate().map_err(|e| {
        warn!(username = %payload.username, "crear usuario: validación fallida");
        e
    })?;

    if state.db.user_exists(&payload.username).await? {
        warn!(username = %payload.username, "crear usuario: ya existe");
        return Err(AppError::BadRequest("Usuario ya existe".to_string()));
    }

    let hash = password::hash_password(&payload.password)?;
    // Todo usuario nuevo entra como admin.
    let id = state.db.create_user(&payload.username, &hash, "admin").await?;

    info!(usuario_id = id, username = %payload.username, "usuario creado");
    Ok(success(
        StatusCode::CREATED,
        json!({ "id": id }),
        "Usuario creado como admin",
    ))
}

pub async fn actualizar(state: AppState, req: Request) -> Result<Response> {
    let id = path_id(&req, "id")
        .map_err(|_| AppError::BadRequest("ID de usuario inválido".to_string()))?;

    let payload: UpdateUsuarioRequest = read_json(req).await?;
    payload.validate()?;

    // Password vacío conserva la contraseña almacenada.
    let hash = if payload.password.is_empty() {
        None
    } else {
        Some(password::hash_password(&payload.password)?)
    };

    state
        .db
        .update_user(id, &payload.username, hash.as_deref(), &payload.rol)
        .await?;

    info!(usuario_id = id, "usuario actualizado");
    Ok(success(StatusCode::OK, json!({ "id": id }), "Usuario actualizado"))
}

pub async fn eliminar(state: AppState, req: Request) -> Result<Response> {
    let id = path_id(&req, "id")
        .map_err(|_| AppError::BadRequest("ID de usuario inválido".to_string()))?;

    state.db.delete_user(id).await?;

    info!(usuario_id = id, "usuario eliminado");
    Ok(success(StatusCode::OK, json!({ "id": id }), "Usuario eliminado"))
}
