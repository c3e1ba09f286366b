use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, Method};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::{AppError, Result};
use crate::token::verify_jwt_token;
use crate::AppState;

/// Whether (method, path) requires a valid bearer token.
///
/// An ordered rule table over exact and prefix paths: mutations on
/// productos, vendedores and usuarios (resource routes and their legacy
/// aliases) plus the admin-only database wipe. Reads, login and ventas
/// mutations stay public.
pub fn requires_auth(method: &Method, path: &str) -> bool {
    match (method.as_str(), path) {
        // Productos
        ("POST", "/api/v1/productos") => true,
        ("PUT" | "DELETE", p) if p.starts_with("/api/v1/productos/") => true,
        ("POST", "/api/v1/crear-producto") => true,
        ("PUT", p) if p.starts_with("/api/v1/actualizar-producto/") => true,
        ("DELETE", p) if p.starts_with("/api/v1/eliminar-producto/") => true,

        // Vendedores
        ("POST", "/api/v1/vendedores") => true,
        ("PUT" | "DELETE", p) if p.starts_with("/api/v1/vendedores/") => true,
        ("POST", "/api/v1/crear-vendedor") => true,
        ("PUT", p) if p.starts_with("/api/v1/actualizar-vendedor/") => true,
        ("DELETE", p) if p.starts_with("/api/v1/eliminar-vendedor/") => true,

        // Usuarios
        ("POST", "/api/v1/usuarios") => true,
        ("PUT" | "DELETE", p) if p.starts_with("/api/v1/usuarios/") => true,
        ("POST", "/api/v1/crear-usuario") => true,
        ("PUT", p) if p.starts_with("/api/v1/actualizar-usuario/") => true,
        ("DELETE", p) if p.starts_with("/api/v1/eliminar-usuario/") => true,

        // Mantenimiento, solo admin
        ("POST", "/api/v1/limpiar-base-datos") => true,

        _ => false,
    }
}

/// Authentication gate, applied just before dispatch. Preflight requests
/// are never blocked.
pub async fn auth_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response> {
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    if !requires_auth(req.method(), req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let token = bearer_token(req.headers())?;
    let data = verify_jwt_token(&state.env.jwt_secret, &token)
        .map_err(|_| AppError::Auth("Token inválido o expirado".to_string()))?;

    debug!(user = %data.claims.sub, path = req.uri().path(), "token verificado");
    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<String> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Auth("Token requerido".to_string()))?;

    match value.split_once(' ') {
        Some(("Bearer", token)) if !token.is_empty() && !token.contains(' ') => {
            Ok(token.to_string())
        }
        _ => Err(AppError::Auth("Formato de token inválido".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn mutations_on_catalog_resources_are_protected() {
        for (method, path) in [
            (Method::POST, "/api/v1/productos"),
            (Method::PUT, "/api/v1/productos/3"),
            (Method::DELETE, "/api/v1/productos/3"),
            (Method::POST, "/api/v1/vendedores"),
            (Method::PUT, "/api/v1/vendedores/3"),
            (Method::DELETE, "/api/v1/vendedores/3"),
            (Method::POST, "/api/v1/usuarios"),
            (Method::PUT, "/api/v1/usuarios/3"),
            (Method::DELETE, "/api/v1/usuarios/3"),
            (Method::POST, "/api/v1/crear-producto"),
            (Method::PUT, "/api/v1/actualizar-producto/3"),
            (Method::DELETE, "/api/v1/eliminar-producto/3"),
            (Method::POST, "/api/v1/crear-vendedor"),
            (Method::PUT, "/api/v1/actualizar-vendedor/3"),
            (Method::DELETE, "/api/v1/eliminar-vendedor/3"),
            (Method::POST, "/api/v1/crear-usuario"),
            (Method::PUT, "/api/v1/actualizar-usuario/3"),
            (Method::DELETE, "/api/v1/eliminar-usuario/3"),
            (Method::POST, "/api/v1/limpiar-base-datos"),
        ] {
            assert!(requires_auth(&method, path), "{method} {path} should require auth");
        }
    }

    #[test]
    fn reads_login_and_ventas_mutations_are_public() {
        for (method, path) in [
            (Method::POST, "/api/v1/auth/login"),
            (Method::POST, "/api/v1/login"),
            (Method::GET, "/api/v1/data"),
            (Method::GET, "/api/v1/productos"),
            (Method::GET, "/api/v1/usuarios"),
            (Method::POST, "/api/v1/ventas"),
            (Method::PUT, "/api/v1/ventas/7"),
            (Method::POST, "/api/v1/submit"),
            (Method::POST, "/api/v1/actualizar-venta/7"),
            (Method::GET, "/api/v1/estadisticas"),
            (Method::GET, "/api/v1/health"),
        ] {
            assert!(!requires_auth(&method, path), "{method} {path} should be public");
        }
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("abc"));
        assert!(bearer_token(&headers).is_err());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic abc"),
        );
        assert!(bearer_token(&headers).is_err());

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }
}
