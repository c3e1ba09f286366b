use crate::handlers::{auth, data, health, productos, usuarios, vendedores, ventas};
use crate::routing::router::{handler_fn, RouterBuilder};

/// Build the full route table of the API.
///
/// Registration order is load-bearing: matching is first-match-wins, so
/// literal routes sit before the parameterized ones they overlap with.
/// Authentication is not attached per group; the auth middleware applies a
/// global (method, path) policy table instead.
pub fn setup_routes() -> RouterBuilder {
    let mut router = RouterBuilder::new();

    // Autenticación
    let auth_group = router.group("/api/v1/auth");
    auth_group.post("/login", handler_fn(auth::login), "Autenticar usuario");

    // Datos iniciales
    let data_group = router.group("/api/v1/data");
    data_group.get(
        "",
        handler_fn(data::obtener_data),
        "Obtener vendedores, clientes y productos",
    );

    // Ventas
    let venta_group = router.group("/api/v1/ventas");
    venta_group.post("", handler_fn(ventas::crear_venta), "Crear nueva venta");
    venta_group.put("/:id", handler_fn(ventas::actualizar_venta), "Actualizar venta");
    venta_group.get(
        "/estadisticas",
        handler_fn(ventas::obtener_estadisticas),
        "Obtener estadísticas",
    );
    venta_group.get(
        "/todas",
        handler_fn(ventas::obtener_todas_ventas),
        "Obtener todas las ventas",
    );

    // Productos (protección vía tabla de auth global)
    let producto_group = router.group("/api/v1/productos");
    producto_group.get("", handler_fn(productos::listar), "Listar productos");
    producto_group.post("", handler_fn(productos::crear), "Crear producto");
    producto_group.put("/:id", handler_fn(productos::actualizar), "Actualizar producto");
    producto_group.delete("/:id", handler_fn(productos::eliminar), "Eliminar producto");

    // Vendedores
    let vendedor_group = router.group("/api/v1/vendedores");
    vendedor_group.get("", handler_fn(vendedores::listar), "Listar vendedores");
    vendedor_group.post("", handler_fn(vendedores::crear), "Crear vendedor");
    vendedor_group.put("/:id", handler_fn(vendedores::actualizar), "Actualizar vendedor");
    vendedor_group.delete("/:id", handler_fn(vendedores::eliminar), "Eliminar vendedor");

    // Usuarios
    let usuario_group = router.group("/api/v1/usuarios");
    usuario_group.get("", handler_fn(usuarios::listar), "Listar usuarios");
    usuario_group.post("", handler_fn(usuarios::crear), "Crear usuario");
    usuario_group.put("/:id", handler_fn(usuarios::actualizar), "Actualizar usuario");
    usuario_group.delete("/:id", handler_fn(usuarios::eliminar), "Eliminar usuario");

    // Health check
    let health_group = router.group("/api/v1/health");
    health_group.get("", handler_fn(health::health_check), "Health check");

    // Rutas legacy para backward compatibility
    let api_group = router.group("/api/v1");
    api_group.post("/login", handler_fn(auth::login), "Login");
    api_group.get("/data", handler_fn(data::obtener_data), "Datos iniciales");
    api_group.post("/submit", handler_fn(ventas::crear_venta), "Crear venta");
    api_group.get(
        "/estadisticas",
        handler_fn(ventas::obtener_todas_ventas),
        "Estadísticas",
    );
    api_group.get(
        "/estadisticas-sheet",
        handler_fn(ventas::obtener_estadisticas),
        "Estadísticas Sheet",
    );
    api_group.post(
        "/actualizar-venta/:id",
        handler_fn(ventas::actualizar_venta),
        "Actualizar venta",
    );

    api_group.get("/productos", handler_fn(productos::listar), "Listar productos");
    api_group.post("/crear-producto", handler_fn(productos::crear), "Crear producto");
    api_group.put(
        "/actualizar-producto/:id",
        handler_fn(productos::actualizar),
        "Actualizar producto",
    );
    api_group.delete(
        "/eliminar-producto/:id",
        handler_fn(productos::eliminar),
        "Eliminar producto",
    );

    api_group.post("/crear-vendedor", handler_fn(vendedores::crear), "Crear vendedor");
    api_group.put(
        "/actualizar-vendedor/:id",
        handler_fn(vendedores::actualizar),
        "Actualizar vendedor",
    );
    api_group.delete(
        "/eliminar-vendedor/:id",
        handler_fn(vendedores::eliminar),
        "Eliminar vendedor",
    );

    api_group.get("/usuarios", handler_fn(usuarios::listar), "Listar usuarios");
    api_group.post("/crear-usuario", handler_fn(usuarios::crear), "Crear usuario");
    api_group.put(
        "/actualizar-usuario/:id",
        handler_fn(usuarios::actualizar),
        "Actualizar usuario",
    );
    api_group.delete(
        "/eliminar-usuario/:id",
        handler_fn(usuarios::eliminar),
        "Eliminar usuario",
    );

    api_group.post(
        "/limpiar-base-datos",
        handler_fn(data::limpiar_base_datos),
        "Limpiar base de datos",
    );

    router
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn legacy_param_route_resolves_with_its_id() {
        let router = setup_routes().build();
        let (route, params) = router
            .find(&Method::POST, "/api/v1/actualizar-venta/15")
            .unwrap();
        assert_eq!(params.get("id"), Some("15"));
        assert_eq!(route.name(), "Actualizar venta");
    }

    #[test]
    fn table_covers_the_legacy_aliases() {
        let router = setup_routes().build();
        for (method, path) in [
            (Method::POST, "/api/v1/login"),
            (Method::GET, "/api/v1/data"),
            (Method::POST, "/api/v1/submit"),
            (Method::GET, "/api/v1/estadisticas"),
            (Method::GET, "/api/v1/estadisticas-sheet"),
            (Method::POST, "/api/v1/crear-producto"),
            (Method::PUT, "/api/v1/actualizar-producto/3"),
            (Method::DELETE, "/api/v1/eliminar-producto/3"),
            (Method::POST, "/api/v1/crear-vendedor"),
            (Method::PUT, "/api/v1/actualizar-vendedor/3"),
            (Method::DELETE, "/api/v1/eliminar-vendedor/3"),
            (Method::GET, "/api/v1/usuarios"),
            (Method::POST, "/api/v1/crear-usuario"),
            (Method::PUT, "/api/v1/actualizar-usuario/3"),
            (Method::DELETE, "/api/v1/eliminar-usuario/3"),
            (Method::POST, "/api/v1/limpiar-base-datos"),
            (Method::GET, "/api/v1/health"),
        ] {
            assert!(
                router.find(&method, path).is_some(),
                "no route for {method} {path}"
            );
        }
    }

    #[test]
    fn method_mismatch_on_known_path_finds_nothing() {
        let router = setup_routes().build();
        assert!(router.find(&Method::DELETE, "/api/v1/data").is_none());
    }
}
