use axum::extract::Request;
use axum::http::StatusCode;
use axum::response::Response;
use chrono::Duration;
use tracing::{info, warn};

use crate::error::{success, AppError, Result};
use crate::handlers::read_json;
use crate::models::{LoginRequest, LoginResponse};
use crate::{password, token, AppState};

pub async fn login(state: AppState, req: Request) -> Result<Response> {
    let payload: LoginRequest = read_json(req).await?;
    payload.validate()?;

    let auth = state.db.get_user_auth(&payload.username).await?;
    let Some((user, stored_hash)) = auth else {
        warn!(username = %payload.username, "login: credenciales inválidas");
        return Err(AppError::Auth(
            "Usuario o contraseña incorrectos".to_string(),
        ));
    };

    if !password::verify_password(&stored_hash, &payload.password) {
        warn!(username = %payload.username, "login: credenciales inválidas");
        return Err(AppError::Auth(
            "Usuario o contraseña incorrectos".to_string(),
        ));
    }

    let token = token::generate_jwt_token(
        &user.username,
        &user.rol,
        &state.env.jwt_secret,
        Duration::hours(24),
    )?;

    info!(username = %user.username, "login exitoso");
    Ok(success(
        StatusCode::OK,
        LoginResponse { token, user },
        "Autenticado",
    ))
}
