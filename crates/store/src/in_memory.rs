//! In-memory store.
//!
//! Intended for tests/dev. Not optimized for performance.
//!
//! The unit of work takes the store's single lock for its whole lifetime
//! and mutates a scratch copy of the state: commit is one assignment back
//! through the guard, and dropping without commit leaves the shared state
//! byte-for-byte untouched. That gives the same all-or-nothing visibility
//! as the Postgres transaction, with creations serialized by the lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};

use petstore_core::{OrderId, ProductId, StoreError, StoreResult};
use petstore_orders::{LineItemView, NewOrder, Order, OrderDetail, OrderLine, OrderStatus};

use crate::r#trait::{InventoryStore, OrderStore, OrderTx, ProductQuote, ProductRecord, Store};

#[derive(Debug, Clone, Default)]
struct Inner {
    products: HashMap<ProductId, ProductRecord>,
    orders: HashMap<OrderId, Order>,
    items: HashMap<OrderId, Vec<OrderLine>>,
}

/// In-memory implementation of the storage boundary.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog in one go.
    pub fn with_products(products: impl IntoIterator<Item = ProductRecord>) -> Self {
        let mut inner = Inner::default();
        for product in products {
            inner.products.insert(product.id, product);
        }
        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub async fn insert_product(&self, product: ProductRecord) {
        self.inner.lock().await.products.insert(product.id, product);
    }

    /// Current stock of a product, for assertions in tests.
    pub async fn stock(&self, product_id: ProductId) -> Option<i64> {
        self.inner
            .lock()
            .await
            .products
            .get(&product_id)
            .map(|p| p.stock)
    }

    /// Number of persisted orders, for assertions in tests.
    pub async fn order_count(&self) -> usize {
        self.inner.lock().await.orders.len()
    }
}

struct InMemoryOrderTx {
    guard: OwnedMutexGuard<Inner>,
    scratch: Inner,
}

#[async_trait]
impl InventoryStore for InMemoryOrderTx {
    async fn price_and_stock(
        &mut self,
        product_id: ProductId,
    ) -> StoreResult<Option<ProductQuote>> {
        Ok(self.scratch.products.get(&product_id).map(|p| ProductQuote {
            unit_price: p.unit_price,
            stock: p.stock,
        }))
    }

    async fn decrement_stock(&mut self, product_id: ProductId, quantity: i64) -> StoreResult<()> {
        let product = self
            .scratch
            .products
            .get_mut(&product_id)
            .ok_or_else(|| StoreError::not_found(format!("product {product_id}")))?;

        if product.stock < quantity {
            return Err(StoreError::InsufficientStock {
                product_id,
                requested: quantity,
            });
        }
        product.stock -= quantity;
        Ok(())
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderTx {
    async fn create_order_with_items(
        &mut self,
        order: &NewOrder,
        lines: &[OrderLine],
    ) -> StoreResult<OrderId> {
        let order_id = OrderId::new();
        self.scratch.orders.insert(
            order_id,
            Order {
                id: order_id,
                customer_id: order.customer_id,
                total: order.total,
                status: order.status,
                created_at: order.created_at,
            },
        );
        self.scratch.items.insert(order_id, lines.to_vec());
        Ok(order_id)
    }
}

#[async_trait]
impl OrderTx for InMemoryOrderTx {
    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut this = *self;
        *this.guard = this.scratch;
        Ok(())
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn begin(&self) -> StoreResult<Box<dyn OrderTx>> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let scratch = guard.clone();
        Ok(Box::new(InMemoryOrderTx { guard, scratch }))
    }

    async fn order_with_items(&self, order_id: OrderId) -> StoreResult<Option<OrderDetail>> {
        let inner = self.inner.lock().await;
        let Some(order) = inner.orders.get(&order_id) else {
            return Ok(None);
        };

        let items = inner
            .items
            .get(&order_id)
            .map(|lines| {
                lines
                    .iter()
                    .map(|line| {
                        let product = inner.products.get(&line.product_id);
                        LineItemView {
                            product_id: line.product_id,
                            quantity: line.quantity,
                            unit_price: line.unit_price,
                            subtotal: line.subtotal,
                            product_name: product.map(|p| p.name.clone()).unwrap_or_default(),
                            image_url: product.and_then(|p| p.image_url.clone()),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Some(OrderDetail {
            order: order.clone(),
            items,
        }))
    }

    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> StoreResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.orders.get_mut(&order_id) {
            Some(order) => {
                order.status = status;
                Ok(())
            }
            None => Err(StoreError::not_found(format!("order {order_id}"))),
        }
    }
}
