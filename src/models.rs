use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

// ==========================================================================
// Entidades
// ==========================================================================

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Producto {
    pub id: i64,
    pub tipo_pizza: String,
    pub descripcion: String,
    pub precio: f64,
    pub activo: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Vendedor {
    pub id: i64,
    pub nombre: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Cliente {
    pub id: i64,
    pub nombre: String,
    pub telefono: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub rol: String,
}

/// Un renglón de una venta, tal como viaja por la API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductoItem {
    #[serde(default)]
    pub detalle_id: i64,
    #[serde(default)]
    pub tipo: String,
    pub product_id: i64,
    pub cantidad: i64,
    pub precio: f64,
    #[serde(default)]
    pub total: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct VentaStats {
    pub id: i64,
    pub vendedor: String,
    pub cliente: String,
    pub telefono_cliente: Option<i64>,
    pub total: f64,
    pub payment_method: String,
    pub estado: String,
    pub tipo_entrega: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<ProductoItem>,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
    #[serde(rename = "clientesPorVendedor")]
    pub clientes_por_vendedor: HashMap<String, Vec<Cliente>>,
    pub vendedores: Vec<Vendedor>,
    pub productos: Vec<Producto>,
}

// ==========================================================================
// Requests
// ==========================================================================

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(AppError::BadRequest("Username requerido".to_string()));
        }
        if self.password.is_empty() {
            return Err(AppError::BadRequest("Password requerido".to_string()));
        }
        if self.username.len() > 50 {
            return Err(AppError::BadRequest("Username demasiado largo".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct VentaRequest {
    #[serde(default)]
    pub vendedor: String,
    #[serde(default)]
    pub cliente: String,
    #[serde(default)]
    pub items: Vec<ProductoItem>,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub tipo_entrega: String,
    pub telefono_cliente: Option<i64>,
}

const PAYMENT_METHODS: &[&str] = &["efectivo", "tarjeta", "transferencia", "qr"];
const ESTADOS_CREACION: &[&str] = &["pendiente", "pagada", "cancelada", "en_proceso"];
const ESTADOS_ACTUALIZACION: &[&str] = &["sin pagar", "pagada", "entregada", "cancelada"];
const TIPOS_ENTREGA: &[&str] = &["retiro", "envio", "delivery"];

impl VentaRequest {
    pub fn validate(&self) -> Result<()> {
        validar_nombre("vendedor", &self.vendedor)?;
        validar_nombre("cliente", &self.cliente)?;

        if let Some(telefono) = self.telefono_cliente {
            if telefono != 0 && !(10..=999_999_999_999_999).contains(&telefono) {
                return Err(AppError::BadRequest(
                    "Teléfono debe tener entre 2 y 15 dígitos".to_string(),
                ));
            }
        }

        if self.items.is_empty() {
            return Err(AppError::BadRequest("Al menos un item es requerido".to_string()));
        }
        if self.items.len() > 50 {
            return Err(AppError::BadRequest("Demasiados items (máximo 50)".to_string()));
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.product_id <= 0 {
                return Err(AppError::BadRequest(format!("Item {i}: product_id inválido")));
            }
            if item.cantidad <= 0 {
                return Err(AppError::BadRequest(format!(
                    "Item {i}: cantidad debe ser mayor a 0"
                )));
            }
            if item.cantidad > 100 {
                return Err(AppError::BadRequest(format!(
                    "Item {i}: cantidad demasiado grande (máximo 100)"
                )));
            }
            if item.precio < 0.0 {
                return Err(AppError::BadRequest(format!(
                    "Item {i}: precio no puede ser negativo"
                )));
            }
        }

        validar_en_lista("Método de pago", &self.payment_method, PAYMENT_METHODS, true)?;
        validar_en_lista("Estado", &self.estado, ESTADOS_CREACION, false)?;
        validar_en_lista("Tipo de entrega", &self.tipo_entrega, TIPOS_ENTREGA, false)?;

        Ok(())
    }

    pub fn total(&self) -> f64 {
        self.items.iter().map(|item| item.total).sum()
    }
}

/// Actualización de una venta. Campos tipados: un body malformado produce
/// un 400, nunca un panic.
#[derive(Debug, Deserialize)]
pub struct ActualizarVentaRequest {
    #[serde(default)]
    pub estado: String,
    #[serde(default)]
    pub payment_method: String,
    #[serde(default)]
    pub tipo_entrega: String,
    #[serde(default)]
    pub productos_eliminar: Vec<i64>,
    #[serde(default)]
    pub productos: Vec<ProductoItem>,
}

impl ActualizarVentaRequest {
    pub fn validate(&self) -> Result<()> {
        if !ESTADOS_ACTUALIZACION.contains(&self.estado.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Estado inválido: {}",
                self.estado
            )));
        }
        if !["efectivo", "transferencia"].contains(&self.payment_method.as_str()) {
            return Err(AppError::BadRequest(format!(
                "Método de pago inválido: {}",
                self.payment_method
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CrearProductoRequest {
    #[serde(default)]
    pub tipo_pizza: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub precio: f64,
}

impl CrearProductoRequest {
    pub fn validate(&self) -> Result<()> {
        validar_producto(&self.tipo_pizza, &self.descripcion, self.precio)
    }
}

#[derive(Debug, Deserialize)]
pub struct ActualizarProductoRequest {
    #[serde(default)]
    pub tipo_pizza: String,
    #[serde(default)]
    pub descripcion: String,
    #[serde(default)]
    pub precio: f64,
    #[serde(default)]
    pub activo: bool,
}

impl ActualizarProductoRequest {
    pub fn validate(&self) -> Result<()> {
        validar_producto(&self.tipo_pizza, &self.descripcion, self.precio)
    }
}

#[derive(Debug, Deserialize)]
pub struct VendedorRequest {
    #[serde(default)]
    pub nombre: String,
}

impl VendedorRequest {
    pub fn validate(&self) -> Result<()> {
        if self.nombre.is_empty() {
            return Err(AppError::BadRequest("Nombre requerido".to_string()));
        }
        if self.nombre.len() < 2 {
            return Err(AppError::BadRequest("Nombre mínimo 2 caracteres".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUsuarioRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub rol: String,
}

impl CreateUsuarioRequest {
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.password.is_empty() {
            return Err(AppError::BadRequest(
                "Username y password requeridos".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateUsuarioRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub rol: String,
}

impl UpdateUsuarioRequest {
    pub fn validate(&self) -> Result<()> {
        if self.username.is_empty() || self.rol.is_empty() {
            return Err(AppError::BadRequest("Username y rol requeridos".to_string()));
        }
        if self.rol != "admin" && self.rol != "vendedor" {
            return Err(AppError::BadRequest(
                "Rol debe ser 'admin' o 'vendedor'".to_string(),
            ));
        }
        Ok(())
    }
}

// ==========================================================================
// Helpers de validación
// ==========================================================================

fn validar_nombre(campo: &str, valor: &str) -> Result<()> {
    if valor.is_empty() {
        return Err(AppError::BadRequest(format!("{campo} es requerido")));
    }
    if valor.trim().len() < 2 {
        return Err(AppError::BadRequest(format!(
            "Nombre de {campo} debe tener al menos 2 caracteres"
        )));
    }
    if valor.len() > 100 {
        return Err(AppError::BadRequest(format!(
            "Nombre de {campo} demasiado largo"
        )));
    }
    Ok(())
}

fn validar_en_lista(campo: &str, valor: &str, validos: &[&str], requerido: bool) -> Result<()> {
    if valor.is_empty() {
        if requerido {
            return Err(AppError::BadRequest(format!("{campo} es requerido")));
        }
        return Ok(());
    }
    if !validos.contains(&valor.to_lowercase().as_str()) {
        return Err(AppError::BadRequest(format!(
            "{campo} inválido (debe ser: {})",
            validos.join(", ")
        )));
    }
    Ok(())
}

fn validar_producto(tipo_pizza: &str, descripcion: &str, precio: f64) -> Result<()> {
    let tipo = tipo_pizza.trim();
    if tipo.is_empty() {
        return Err(AppError::BadRequest("tipo_pizza es requerido".to_string()));
    }
    if tipo.len() < 2 {
        return Err(AppError::BadRequest(
            "tipo_pizza debe tener al menos 2 caracteres".to_string(),
        ));
    }
    if tipo_pizza.len() > 50 {
        return Err(AppError::BadRequest(
            "tipo_pizza demasiado largo (máximo 50 caracteres)".to_string(),
        ));
    }
    if descripcion.trim().len() > 200 {
        return Err(AppError::BadRequest(
            "descripcion demasiado larga (máximo 200 caracteres)".to_string(),
        ));
    }
    if precio <= 0.0 {
        return Err(AppError::BadRequest("precio debe ser mayor a 0".to_string()));
    }
    if precio > 500.0 {
        return Err(AppError::BadRequest(
            "precio demasiado alto (máximo $500)".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venta_base() -> VentaRequest {
        VentaRequest {
            vendedor: "Marta".to_string(),
            cliente: "Luis".to_string(),
            items: vec![ProductoItem {
                detalle_id: 0,
                tipo: "producto".to_string(),
                product_id: 1,
                cantidad: 2,
                precio: 10.0,
                total: 20.0,
            }],
            payment_method: "efectivo".to_string(),
            estado: "pendiente".to_string(),
            tipo_entrega: "retiro".to_string(),
            telefono_cliente: None,
        }
    }

    #[test]
    fn venta_valida_pasa() {
        assert!(venta_base().validate().is_ok());
        assert_eq!(venta_base().total(), 20.0);
    }

    #[test]
    fn venta_sin_items_falla() {
        let mut req = venta_base();
        req.items.clear();
        assert!(req.validate().is_err());
    }

    #[test]
    fn venta_con_pago_desconocido_falla() {
        let mut req = venta_base();
        req.payment_method = "cheque".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn venta_estado_vacio_es_opcional() {
        let mut req = venta_base();
        req.estado = String::new();
        req.tipo_entrega = String::new();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn telefono_fuera_de_rango_falla() {
        let mut req = venta_base();
        req.telefono_cliente = Some(5);
        assert!(req.validate().is_err());
        req.telefono_cliente = Some(0);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn actualizar_venta_valida_estados() {
        let req = ActualizarVentaRequest {
            estado: "pagada".to_string(),
            payment_method: "efectivo".to_string(),
            tipo_entrega: String::new(),
            productos_eliminar: vec![],
            productos: vec![],
        };
        assert!(req.validate().is_ok());

        let req = ActualizarVentaRequest {
            estado: "pendiente".to_string(), // válido al crear, no al actualizar
            payment_method: "efectivo".to_string(),
            tipo_entrega: String::new(),
            productos_eliminar: vec![],
            productos: vec![],
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn producto_fuera_de_precio_falla() {
        let req = CrearProductoRequest {
            tipo_pizza: "muzza".to_string(),
            descripcion: String::new(),
            precio: 501.0,
        };
        assert!(req.validate().is_err());

        let req = CrearProductoRequest {
            tipo_pizza: "muzza".to_string(),
            descripcion: String::new(),
            precio: 120.0,
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn usuario_update_exige_rol_conocido() {
        let req = UpdateUsuarioRequest {
            username: "ana".to_string(),
            password: String::new(),
            rol: "gerente".to_string(),
        };
        assert!(req.validate().is_err());
    }
}
