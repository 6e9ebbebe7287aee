//! Business rules for order fulfillment.
//!
//! `OrderService` is the only place that knows the creation rules:
//! authoritative pricing, the insufficient-stock guard, and the atomic
//! unit of work. Everything it touches goes through the injected
//! `Store`, so the same code runs against Postgres in production and the
//! in-memory store in tests.

use std::sync::Arc;

use petstore_core::{CustomerId, OrderId, StoreError, StoreResult};
use petstore_orders::{order_total, NewOrder, OrderDetail, OrderLine, OrderStatus};
use petstore_store::Store;

use crate::app::dto::OrderItemRequest;

/// Services injected into the router.
pub struct AppServices {
    pub orders: OrderService,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            orders: OrderService::new(store),
        }
    }
}

/// Outcome of a successful creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderReceipt {
    pub order_id: OrderId,
    pub total: i64,
}

pub struct OrderService {
    store: Arc<dyn Store>,
}

impl OrderService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an order: verify inventory, snapshot prices, persist the
    /// header plus line items, and decrement stock — all inside one
    /// atomic unit of work.
    ///
    /// Every failure path below simply returns: dropping `tx` discards
    /// all writes performed so far, so the caller never observes a
    /// partial order or a partial stock change.
    pub async fn create_order(
        &self,
        customer_id: CustomerId,
        items: &[OrderItemRequest],
    ) -> StoreResult<OrderReceipt> {
        if items.is_empty() {
            return Err(StoreError::validation("items must not be empty"));
        }
        for item in items {
            if item.quantity <= 0 {
                return Err(StoreError::validation(format!(
                    "quantity for product {} must be positive",
                    item.product_id
                )));
            }
        }

        let mut tx = self.store.begin().await?;

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let quote = tx.price_and_stock(item.product_id).await?.ok_or_else(|| {
                StoreError::not_found(format!("product {}", item.product_id))
            })?;

            if quote.stock < item.quantity {
                return Err(StoreError::InsufficientStock {
                    product_id: item.product_id,
                    requested: item.quantity,
                });
            }

            // Price snapshot from the product record; the caller never
            // supplies prices.
            lines.push(OrderLine::price(
                item.product_id,
                item.quantity,
                quote.unit_price,
            )?);
        }
        let total = order_total(&lines)?;

        let order_id = tx
            .create_order_with_items(&NewOrder::pending(customer_id, total), &lines)
            .await?;

        // The decrement re-checks availability at write time, closing the
        // window between the read above and this write.
        for line in &lines {
            tx.decrement_stock(line.product_id, line.quantity).await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %order_id, total, lines = lines.len(), "order created");
        Ok(OrderReceipt { order_id, total })
    }

    /// Overwrite an order's status with a member of the closed status
    /// set. No transition graph: any valid status may follow any other.
    pub async fn update_status(&self, order_id: OrderId, status: &str) -> StoreResult<OrderStatus> {
        let status: OrderStatus = status.parse()?;
        self.store.update_status(order_id, status).await?;
        tracing::info!(order_id = %order_id, status = %status, "order status updated");
        Ok(status)
    }

    /// Order header with its line items and product display fields.
    pub async fn order_detail(&self, order_id: OrderId) -> StoreResult<OrderDetail> {
        self.store
            .order_with_items(order_id)
            .await?
            .ok_or_else(|| StoreError::not_found(format!("order {order_id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use petstore_core::ProductId;
    use petstore_store::{InMemoryStore, ProductRecord};

    fn product(name: &str, price: i64, stock: i64) -> ProductRecord {
        ProductRecord {
            id: ProductId::new(),
            name: name.to_string(),
            image_url: Some(format!("https://img.example/{name}.png")),
            unit_price: price,
            stock,
        }
    }

    fn service(store: &InMemoryStore) -> OrderService {
        OrderService::new(Arc::new(store.clone()))
    }

    fn item(product_id: ProductId, quantity: i64) -> OrderItemRequest {
        OrderItemRequest {
            product_id,
            quantity,
        }
    }

    #[tokio::test]
    async fn creates_an_order_and_decrements_stock() {
        let food = product("cat-food", 1200, 10);
        let toy = product("mouse-toy", 350, 4);
        let (food_id, toy_id) = (food.id, toy.id);
        let store = InMemoryStore::with_products([food, toy]);
        let svc = service(&store);

        let receipt = svc
            .create_order(CustomerId::new(), &[item(food_id, 2), item(toy_id, 3)])
            .await
            .unwrap();

        assert_eq!(receipt.total, 2 * 1200 + 3 * 350);
        assert_eq!(store.stock(food_id).await, Some(8));
        assert_eq!(store.stock(toy_id).await, Some(1));

        let detail = svc.order_detail(receipt.order_id).await.unwrap();
        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.total, receipt.total);
        let sum: i64 = detail.items.iter().map(|i| i.subtotal).sum();
        assert_eq!(detail.order.total, sum);
        for line in &detail.items {
            assert_eq!(line.subtotal, line.quantity * line.unit_price);
        }
    }

    #[tokio::test]
    async fn rejects_an_empty_item_list() {
        let store = InMemoryStore::new();
        let err = service(&store)
            .create_order(CustomerId::new(), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn rejects_non_positive_quantities_before_any_write() {
        let record = product("bird-seed", 500, 5);
        let product_id = record.id;
        let store = InMemoryStore::with_products([record]);

        let err = service(&store)
            .create_order(CustomerId::new(), &[item(product_id, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.stock(product_id).await, Some(5));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn unknown_product_rolls_back_the_whole_order() {
        let record = product("dog-bed", 4500, 3);
        let known = record.id;
        let store = InMemoryStore::with_products([record]);

        let err = service(&store)
            .create_order(CustomerId::new(), &[item(known, 1), item(ProductId::new(), 1)])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.stock(known).await, Some(3));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn insufficient_stock_rolls_back_even_when_earlier_items_fit() {
        let plenty = product("litter", 900, 10);
        let scarce = product("aquarium", 8000, 1);
        let (plenty_id, scarce_id) = (plenty.id, scarce.id);
        let store = InMemoryStore::with_products([plenty, scarce]);

        let err = service(&store)
            .create_order(CustomerId::new(), &[item(plenty_id, 2), item(scarce_id, 2)])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InsufficientStock { .. }));
        assert_eq!(store.stock(plenty_id).await, Some(10));
        assert_eq!(store.stock(scarce_id).await, Some(1));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn duplicate_lines_cannot_oversell_through_stale_reads() {
        // Both lines read stock 5 before any decrement; the second
        // conditional decrement must still fail.
        let record = product("hamster-wheel", 700, 5);
        let product_id = record.id;
        let store = InMemoryStore::with_products([record]);

        let err = service(&store)
            .create_order(CustomerId::new(), &[item(product_id, 3), item(product_id, 3)])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::InsufficientStock { .. }));
        assert_eq!(store.stock(product_id).await, Some(5));
        assert_eq!(store.order_count().await, 0);
    }

    #[tokio::test]
    async fn concurrent_orders_produce_exactly_one_success() {
        let record = product("leash", 1500, 5);
        let product_id = record.id;
        let store = InMemoryStore::with_products([record]);
        let svc = Arc::new(service(&store));

        let a = {
            let svc = Arc::clone(&svc);
            tokio::spawn(
                async move { svc.create_order(CustomerId::new(), &[item(product_id, 3)]).await },
            )
        };
        let b = {
            let svc = Arc::clone(&svc);
            tokio::spawn(
                async move { svc.create_order(CustomerId::new(), &[item(product_id, 3)]).await },
            )
        };

        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "a: {a:?}, b: {b:?}");

        let failure = if a.is_err() { a } else { b };
        assert!(matches!(
            failure.unwrap_err(),
            StoreError::InsufficientStock { .. }
        ));

        assert_eq!(store.stock(product_id).await, Some(2));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn second_order_fails_once_stock_runs_low() {
        let record = product("fish-flakes", 300, 5);
        let product_id = record.id;
        let store = InMemoryStore::with_products([record]);
        let svc = service(&store);

        let receipt = svc
            .create_order(CustomerId::new(), &[item(product_id, 3)])
            .await
            .unwrap();
        assert_eq!(receipt.total, 3 * 300);
        assert_eq!(store.stock(product_id).await, Some(2));

        let err = svc
            .create_order(CustomerId::new(), &[item(product_id, 3)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InsufficientStock { .. }));
        assert_eq!(store.stock(product_id).await, Some(2));
        assert_eq!(store.order_count().await, 1);
    }

    #[tokio::test]
    async fn updates_status_within_the_closed_set() {
        let record = product("collar", 800, 2);
        let product_id = record.id;
        let store = InMemoryStore::with_products([record]);
        let svc = service(&store);

        let receipt = svc
            .create_order(CustomerId::new(), &[item(product_id, 1)])
            .await
            .unwrap();

        let status = svc.update_status(receipt.order_id, "shipped").await.unwrap();
        assert_eq!(status, OrderStatus::Shipped);

        let detail = svc.order_detail(receipt.order_id).await.unwrap();
        assert_eq!(detail.order.status, OrderStatus::Shipped);

        // No transition graph: going back to pending is allowed.
        svc.update_status(receipt.order_id, "pending").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_statuses_outside_the_closed_set() {
        let store = InMemoryStore::new();
        let err = service(&store)
            .update_status(OrderId::new(), "refunded")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
    }

    #[tokio::test]
    async fn status_update_on_missing_order_is_not_found() {
        let store = InMemoryStore::new();
        let err = service(&store)
            .update_status(OrderId::new(), "shipped")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn detail_of_missing_order_is_not_found() {
        let store = InMemoryStore::new();
        let err = service(&store)
            .order_detail(OrderId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
