use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{Cliente, Producto, ProductoItem, User, Vendedor, VentaStats};

/// Thin wrapper over the MySQL pool. Only leaf handlers reach this layer;
/// the admission core never does.
#[derive(Clone)]
pub struct Database {
    pool: MySqlPool,
}

#[derive(Debug, Serialize)]
pub struct Resumen {
    pub ventas_totales: i64,
    pub total_recaudado: f64,
    pub pendiente_cobro: f64,
    pub efectivo_cobrado: f64,
    pub transferencia_cobrada: f64,
    pub ventas_sin_pagar: i64,
    pub ventas_pagadas: i64,
    pub ventas_entregadas: i64,
    pub total_delivery: i64,
    pub total_retiro: i64,
}

#[derive(Debug, Serialize)]
pub struct VendedorStats {
    pub nombre: String,
    pub cantidad_ventas: i64,
    pub sin_pagar: f64,
    pub pagado: f64,
    pub total: f64,
}

#[derive(sqlx::FromRow)]
struct VentaRow {
    id: i64,
    vendedor: String,
    cliente: String,
    telefono_cliente: Option<i64>,
    total: f64,
    payment_method: String,
    estado: String,
    tipo_entrega: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct DetalleRow {
    venta_id: i64,
    detalle_id: i64,
    product_id: i64,
    cantidad: i64,
    precio: f64,
}

#[derive(sqlx::FromRow)]
struct UserAuthRow {
    id: i64,
    username: String,
    rol: String,
    password: String,
}

impl Database {
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(25)
            .min_connections(5)
            .max_lifetime(Duration::from_secs(5 * 60))
            .connect(url)
            .await?;
        info!("conectado a MySQL");
        Ok(Self { pool })
    }

    /// Pool without an eager connection; used by tests that never touch
    /// the database (or expect it to be unreachable, hence the short
    /// acquire timeout).
    pub fn connect_lazy(url: &str) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .acquire_timeout(Duration::from_secs(1))
            .connect_lazy(url)?;
        Ok(Self { pool })
    }

    // ======================================================================
    // Vendedores
    // ======================================================================

    pub async fn get_vendedores(&self) -> Result<Vec<Vendedor>> {
        let vendedores = sqlx::query_as::<_, Vendedor>(
            "SELECT id, nombre FROM vendedores ORDER BY nombre",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(vendedores)
    }

    pub async fn get_vendedor_id(&self, nombre: &str) -> Result<Option<i64>> {
        let id = sqlx::query_scalar::<_, i64>("SELECT id FROM vendedores WHERE nombre = ?")
            .bind(nombre)
            .fetch_optional(&self.pool)
            .await?;
        Ok(id)
    }

    pub async fn create_vendedor(&self, nombre: &str) -> Result<i64> {
        let result = sqlx::query("INSERT INTO vendedores (nombre) VALUES (?)")
            .bind(nombre)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_id() as i64)
    }

    pub async fn update_vendedor(&self, id: i64, nombre: &str) -> Result<()> {
        let result = sqlx::query("UPDATE vendedores SET nombre = ? WHERE id = ?")
            .bind(nombre)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn delete_vendedor(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM vendedores WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // ======================================================================
    // Clientes
    // ======================================================================

    pub async fn get_cliente_by_nombre(&self, nombre: &str) -> Result<Option<Cliente>> {
        let cliente = sqlx::query_as::<_, Cliente>(
            "SELECT id, nombre, telefono FROM clientes WHERE nombre = ?",
        )
        .bind(nombre)
        .fetch_optional(&self.pool)
        .await?;
        Ok(cliente)
    }

    pub async fn create_cliente(&self, nombre: &str, telefono: Option<i64>) -> Result<i64> {
        let result = sqlx::query("INSERT INTO clientes (nombre, telefono) VALUES (?, ?)")
            .bind(nombre)
            .bind(telefono)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_id() as i64)
    }

    pub async fn update_cliente_telefono(&self, id: i64, telefono: i64) -> Result<()> {
        sqlx::query("UPDATE clientes SET telefono = ? WHERE id = ?")
            .bind(telefono)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn get_clientes_por_vendedor(&self) -> Result<HashMap<String, Vec<Cliente>>> {
        let rows = sqlx::query_as::<_, (String, i64, String, Option<i64>)>(
            "SELECT ve.nombre, c.id, c.nombre, c.telefono
             FROM ventas v
             JOIN vendedores ve ON v.vendedor_id = ve.id
             JOIN clientes c ON v.cliente_id = c.id
             ORDER BY ve.nombre, c.nombre",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut result: HashMap<String, Vec<Cliente>> = HashMap::new();
        for (vendedor, id, nombre, telefono) in rows {
            let clientes = result.entry(vendedor).or_default();
            if clientes.iter().any(|c| c.id == id) {
                continue;
            }
            clientes.push(Cliente { id, nombre, telefono });
        }
        Ok(result)
    }

    // ======================================================================
    // Productos
    // ======================================================================

    pub async fn get_productos(&self) -> Result<Vec<Producto>> {
        let productos = sqlx::query_as::<_, Producto>(
            "SELECT id, tipo_pizza, descripcion, precio, activo, created_at
             FROM productos
             WHERE activo = TRUE
             ORDER BY tipo_pizza",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(productos)
    }

    pub async fn exists_producto(&self, id: i64) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM productos WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn create_producto(
        &self,
        tipo_pizza: &str,
        descripcion: &str,
        precio: f64,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO productos (tipo_pizza, descripcion, precio, activo, created_at)
             VALUES (?, ?, ?, TRUE, NOW())",
        )
        .bind(tipo_pizza)
        .bind(descripcion)
        .bind(precio)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id() as i64)
    }

    pub async fn update_producto(
        &self,
        id: i64,
        tipo_pizza: &str,
        descripcion: &str,
        precio: f64,
        activo: bool,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE productos SET tipo_pizza = ?, descripcion = ?, precio = ?, activo = ?
             WHERE id = ?",
        )
        .bind(tipo_pizza)
        .bind(descripcion)
        .bind(precio)
        .bind(activo)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    /// Soft delete: the row stays for historical detalle references.
    pub async fn delete_producto(&self, id: i64) -> Result<()> {
        let result = sqlx::query("UPDATE productos SET activo = FALSE WHERE id = ? AND activo = TRUE")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // ======================================================================
    // Ventas
    // ======================================================================

    pub async fn crear_venta(
        &self,
        cliente_id: Option<i64>,
        vendedor_id: i64,
        total: f64,
        payment_method: &str,
        estado: &str,
        tipo_entrega: &str,
        items: &[ProductoItem],
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO ventas (vendedor_id, cliente_id, total, payment_method, estado, tipo_entrega, created_at)
             VALUES (?, ?, ?, ?, ?, ?, NOW())",
        )
        .bind(vendedor_id)
        .bind(cliente_id)
        .bind(total)
        .bind(payment_method)
        .bind(estado)
        .bind(tipo_entrega)
        .execute(&mut *tx)
        .await?;
        let venta_id = result.last_insert_id() as i64;

        for item in items {
            sqlx::query(
                "INSERT INTO detalle_ventas (venta_id, producto_id, cantidad, precio_unitario)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(venta_id)
            .bind(item.product_id)
            .bind(item.cantidad)
            .bind(item.precio)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(venta_id)
    }

    pub async fn update_venta(
        &self,
        venta_id: i64,
        estado: &str,
        payment_method: &str,
        tipo_entrega: &str,
        productos_eliminar: &[i64],
        productos: &[ProductoItem],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE ventas SET estado = ?, payment_method = ? WHERE id = ?")
            .bind(estado)
            .bind(payment_method)
            .bind(venta_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound);
        }

        if !tipo_entrega.is_empty() {
            sqlx::query("UPDATE ventas SET tipo_entrega = ? WHERE id = ?")
                .bind(tipo_entrega)
                .bind(venta_id)
                .execute(&mut *tx)
                .await?;
        }

        for detalle_id in productos_eliminar {
            sqlx::query("DELETE FROM detalle_ventas WHERE id = ? AND venta_id = ?")
                .bind(detalle_id)
                .bind(venta_id)
                .execute(&mut *tx)
                .await?;
        }

        for item in productos {
            if item.detalle_id > 0 {
                sqlx::query(
                    "UPDATE detalle_ventas SET producto_id = ?, cantidad = ?, precio_unitario = ?
                     WHERE id = ? AND venta_id = ?",
                )
                .bind(item.product_id)
                .bind(item.cantidad)
                .bind(item.precio)
                .bind(item.detalle_id)
                .bind(venta_id)
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query(
                    "INSERT INTO detalle_ventas (venta_id, producto_id, cantidad, precio_unitario)
                     VALUES (?, ?, ?, ?)",
                )
                .bind(venta_id)
                .bind(item.product_id)
                .bind(item.cantidad)
                .bind(item.precio)
                .execute(&mut *tx)
                .await?;
            }
        }

        // El total se deriva siempre de los renglones vigentes.
        sqlx::query(
            "UPDATE ventas
             SET total = (SELECT CAST(COALESCE(SUM(cantidad * precio_unitario), 0) AS DOUBLE)
                          FROM detalle_ventas WHERE venta_id = ?)
             WHERE id = ?",
        )
        .bind(venta_id)
        .bind(venta_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_all_ventas(&self, incluir_canceladas: bool) -> Result<Vec<VentaStats>> {
        let filtro = if incluir_canceladas {
            ""
        } else {
            "WHERE v.estado <> 'cancelada'"
        };
        let query = format!(
            "SELECT v.id, ve.nombre AS vendedor,
                    COALESCE(c.nombre, '') AS cliente,
                    c.telefono AS telefono_cliente,
                    v.total, v.payment_method, v.estado, v.tipo_entrega, v.created_at
             FROM ventas v
             JOIN vendedores ve ON v.vendedor_id = ve.id
             LEFT JOIN clientes c ON v.cliente_id = c.id
             {filtro}
             ORDER BY v.id"
        );
        let ventas = sqlx::query_as::<_, VentaRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        let detalles = sqlx::query_as::<_, DetalleRow>(
            "SELECT venta_id, id AS detalle_id, producto_id AS product_id, cantidad,
                    precio_unitario AS precio
             FROM detalle_ventas
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut items_por_venta: HashMap<i64, Vec<ProductoItem>> = HashMap::new();
        for row in detalles {
            items_por_venta
                .entry(row.venta_id)
                .or_default()
                .push(ProductoItem {
                    detalle_id: row.detalle_id,
                    tipo: "producto".to_string(),
                    product_id: row.product_id,
                    cantidad: row.cantidad,
                    precio: row.precio,
                    total: row.precio * row.cantidad as f64,
                });
        }

        Ok(ventas
            .into_iter()
            .map(|row| VentaStats {
                items: items_por_venta.remove(&row.id).unwrap_or_default(),
                id: row.id,
                vendedor: row.vendedor,
                cliente: row.cliente,
                telefono_cliente: row.telefono_cliente,
                total: row.total,
                payment_method: row.payment_method,
                estado: row.estado,
                tipo_entrega: row.tipo_entrega,
                created_at: row.created_at,
            })
            .collect())
    }

    pub async fn get_resumen(&self) -> Result<Resumen> {
        let (ventas_totales, total_recaudado): (i64, f64) = sqlx::query_as(
            "SELECT COUNT(*), CAST(COALESCE(SUM(total), 0) AS DOUBLE)
             FROM ventas WHERE estado <> 'cancelada'",
        )
        .fetch_one(&self.pool)
        .await?;

        let (pendiente_cobro, efectivo_cobrado, transferencia_cobrada): (f64, f64, f64) =
            sqlx::query_as(
                "SELECT
                    CAST(COALESCE(SUM(CASE WHEN estado = 'sin pagar' THEN total END), 0) AS DOUBLE),
                    CAST(COALESCE(SUM(CASE WHEN estado <> 'sin pagar' AND payment_method = 'efectivo' THEN total END), 0) AS DOUBLE),
                    CAST(COALESCE(SUM(CASE WHEN estado <> 'sin pagar' AND payment_method = 'transferencia' THEN total END), 0) AS DOUBLE)
                 FROM ventas WHERE estado <> 'cancelada'",
            )
            .fetch_one(&self.pool)
            .await?;

        let (ventas_sin_pagar, ventas_pagadas, ventas_entregadas): (i64, i64, i64) =
            sqlx::query_as(
                "SELECT
                    CAST(COALESCE(SUM(estado = 'sin pagar'), 0) AS SIGNED),
                    CAST(COALESCE(SUM(estado = 'pagada'), 0) AS SIGNED),
                    CAST(COALESCE(SUM(estado = 'entregada'), 0) AS SIGNED)
                 FROM ventas",
            )
            .fetch_one(&self.pool)
            .await?;

        let (total_delivery, total_retiro): (i64, i64) = sqlx::query_as(
            "SELECT
                CAST(COALESCE(SUM(tipo_entrega IN ('envio', 'delivery')), 0) AS SIGNED),
                CAST(COALESCE(SUM(tipo_entrega = 'retiro'), 0) AS SIGNED)
             FROM ventas WHERE estado <> 'cancelada'",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(Resumen {
            ventas_totales,
            total_recaudado,
            pendiente_cobro,
            efectivo_cobrado,
            transferencia_cobrada,
            ventas_sin_pagar,
            ventas_pagadas,
            ventas_entregadas,
            total_delivery,
            total_retiro,
        })
    }

    pub async fn get_vendedores_con_stats(&self) -> Result<Vec<VendedorStats>> {
        let rows = sqlx::query_as::<_, (String, i64, f64, f64, f64)>(
            "SELECT ve.nombre,
                    COUNT(v.id),
                    CAST(COALESCE(SUM(CASE WHEN v.estado = 'sin pagar' THEN v.total END), 0) AS DOUBLE),
                    CAST(COALESCE(SUM(CASE WHEN v.estado IN ('pagada', 'entregada') THEN v.total END), 0) AS DOUBLE),
                    CAST(COALESCE(SUM(CASE WHEN v.estado <> 'cancelada' THEN v.total END), 0) AS DOUBLE)
             FROM vendedores ve
             LEFT JOIN ventas v ON v.vendedor_id = ve.id
             GROUP BY ve.id, ve.nombre
             ORDER BY ve.nombre",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(nombre, cantidad_ventas, sin_pagar, pagado, total)| VendedorStats {
                nombre,
                cantidad_ventas,
                sin_pagar,
                pagado,
                total,
            })
            .collect())
    }

    // ======================================================================
    // Usuarios
    // ======================================================================

    pub async fn get_all_users(&self) -> Result<Vec<User>> {
        let usuarios = sqlx::query_as::<_, User>(
            "SELECT id, username, rol FROM usuarios ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(usuarios)
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM usuarios WHERE username = ?",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    pub async fn get_user_auth(&self, username: &str) -> Result<Option<(User, String)>> {
        let row = sqlx::query_as::<_, UserAuthRow>(
            "SELECT id, username, rol, password FROM usuarios WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            (
                User { id: r.id, username: r.username, rol: r.rol },
                r.password,
            )
        }))
    }

    pub async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        rol: &str,
    ) -> Result<i64> {
        let result = sqlx::query("INSERT INTO usuarios (username, password, rol) VALUES (?, ?, ?)")
            .bind(username)
            .bind(password_hash)
            .bind(rol)
            .execute(&self.pool)
            .await?;
        Ok(result.last_insert_id() as i64)
    }

    /// `password_hash = None` keeps the stored password.
    pub async fn update_user(
        &self,
        id: i64,
        username: &str,
        password_hash: Option<&str>,
        rol: &str,
    ) -> Result<()> {
        let result = match password_hash {
            Some(hash) => {
                sqlx::query("UPDATE usuarios SET username = ?, password = ?, rol = ? WHERE id = ?")
                    .bind(username)
                    .bind(hash)
                    .bind(rol)
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("UPDATE usuarios SET username = ?, rol = ? WHERE id = ?")
                    .bind(username)
                    .bind(rol)
                    .bind(id)
                    .execute(&self.pool)
                    .await?
            }
        };
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    pub async fn delete_user(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM usuarios WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // ======================================================================
    // Limpieza (usuarios se conservan)
    // ======================================================================

    /// Wipe everything except usuarios, in FK-safe order.
    pub async fn limpiar_base_datos(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for table in ["detalle_ventas", "ventas", "clientes", "vendedores", "productos"] {
            sqlx::query(&format!("DELETE FROM {table}"))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
