//! Postgres-backed store implementation.
//!
//! The creation unit of work wraps a `sqlx::Transaction`; sqlx rolls the
//! transaction back when the value is dropped without an explicit commit,
//! which is exactly the guaranteed-release behavior every early-return
//! path relies on. The stock decrement is a single conditional UPDATE, so
//! the availability guard and the write cannot be separated by a
//! concurrent writer.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use petstore_core::{CustomerId, OrderId, ProductId, StoreError, StoreResult};
use petstore_orders::{
    LineItemView, NewOrder, Order, OrderDetail, OrderLine, OrderStatus,
};

use crate::r#trait::{InventoryStore, OrderStore, OrderTx, ProductQuote, Store};

/// Postgres adapter over a shared connection pool.
///
/// The pool is process-wide state owned by `main` and injected here; every
/// operation borrows a connection from it and returns it on all exit
/// paths.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with bounded pool size and acquire timeout.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn map_sqlx_error(operation: &str, e: sqlx::Error) -> StoreError {
    StoreError::unexpected(format!("{operation}: {e}"))
}

fn parse_stored_status(order_id: OrderId, raw: &str) -> StoreResult<OrderStatus> {
    raw.parse().map_err(|_| {
        StoreError::unexpected(format!("order {order_id} has invalid stored status {raw:?}"))
    })
}

/// Unit of work holding the open transaction for one order creation.
struct PostgresOrderTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl InventoryStore for PostgresOrderTx {
    async fn price_and_stock(
        &mut self,
        product_id: ProductId,
    ) -> StoreResult<Option<ProductQuote>> {
        let row = sqlx::query("SELECT price, stock FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("price_and_stock", e))?;

        Ok(row.map(|r| ProductQuote {
            unit_price: r.get("price"),
            stock: r.get("stock"),
        }))
    }

    async fn decrement_stock(&mut self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        // Guard and write in one statement: zero rows affected means the
        // concurrently-observed stock no longer covers the quantity.
        let result = sqlx::query(
            "UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1",
        )
        .bind(quantity)
        .bind(product_id.as_uuid())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("decrement_stock", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InsufficientStock {
                product_id,
                requested: quantity,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for PostgresOrderTx {
    async fn create_order_with_items(
        &mut self,
        order: &NewOrder,
        lines: &[OrderLine],
    ) -> StoreResult<OrderId> {
        let order_id = OrderId::new();

        sqlx::query(
            "INSERT INTO orders (id, customer_id, total, status, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order_id.as_uuid())
        .bind(order.customer_id.as_uuid())
        .bind(order.total)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("insert_order", e))?;

        for line in lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price, subtotal) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order_id.as_uuid())
            .bind(line.product_id.as_uuid())
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.subtotal)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("insert_order_item", e))?;
        }

        Ok(order_id)
    }
}

#[async_trait]
impl OrderTx for PostgresOrderTx {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn begin(&self) -> StoreResult<Box<dyn OrderTx>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(Box::new(PostgresOrderTx { tx }))
    }

    #[instrument(skip(self), fields(order_id = %order_id), err)]
    async fn order_with_items(&self, order_id: OrderId) -> StoreResult<Option<OrderDetail>> {
        let header = sqlx::query(
            "SELECT id, customer_id, total, status, created_at FROM orders WHERE id = $1",
        )
        .bind(order_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_order", e))?;

        let Some(row) = header else {
            return Ok(None);
        };

        let status: String = row.get("status");
        let order = Order {
            id: OrderId::from_uuid(row.get("id")),
            customer_id: CustomerId::from_uuid(row.get("customer_id")),
            total: row.get("total"),
            status: parse_stored_status(order_id, &status)?,
            created_at: row.get("created_at"),
        };

        let rows = sqlx::query(
            "SELECT oi.product_id, oi.quantity, oi.unit_price, oi.subtotal, \
                    p.name AS product_name, p.image_url \
             FROM order_items oi \
             JOIN products p ON p.id = oi.product_id \
             WHERE oi.order_id = $1",
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("load_order_items", e))?;

        let items = rows
            .into_iter()
            .map(|r| LineItemView {
                product_id: ProductId::from_uuid(r.get("product_id")),
                quantity: r.get("quantity"),
                unit_price: r.get("unit_price"),
                subtotal: r.get("subtotal"),
                product_name: r.get("product_name"),
                image_url: r.get("image_url"),
            })
            .collect();

        Ok(Some(OrderDetail { order, items }))
    }

    #[instrument(skip(self), fields(order_id = %order_id, status = %status), err)]
    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> StoreResult<()> {
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(order_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_status", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("order {order_id}")));
        }
        Ok(())
    }
}
