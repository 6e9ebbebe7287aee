use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use petstore_core::{CustomerId, OrderId, ProductId, StoreError, StoreResult};

use crate::status::OrderStatus;

/// One priced line of an order.
///
/// `unit_price` is the product's price at order time, in the smallest
/// currency unit (e.g., cents); it is never taken from the caller.
/// Invariant: `subtotal == quantity * unit_price` and `quantity > 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: i64,
    pub subtotal: i64,
}

impl OrderLine {
    /// Price a requested quantity against a product's current unit price.
    ///
    /// The only way to build an `OrderLine`, so the subtotal invariant
    /// holds by construction.
    pub fn price(product_id: ProductId, quantity: i64, unit_price: i64) -> StoreResult<Self> {
        if quantity <= 0 {
            return Err(StoreError::validation(format!(
                "quantity for product {product_id} must be positive"
            )));
        }
        if unit_price < 0 {
            return Err(StoreError::validation(format!(
                "unit price for product {product_id} must not be negative"
            )));
        }
        let subtotal = quantity.checked_mul(unit_price).ok_or_else(|| {
            StoreError::validation(format!("subtotal for product {product_id} overflows"))
        })?;
        Ok(Self {
            product_id,
            quantity,
            unit_price,
            subtotal,
        })
    }
}

/// Sum line subtotals into an order total, rejecting overflow.
pub fn order_total(lines: &[OrderLine]) -> StoreResult<i64> {
    lines.iter().try_fold(0i64, |acc, line| {
        acc.checked_add(line.subtotal)
            .ok_or_else(|| StoreError::validation("order total overflows"))
    })
}

/// Order header about to be persisted (id is assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: CustomerId,
    pub total: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// A freshly priced order: always starts out `pending`.
    pub fn pending(customer_id: CustomerId, total: i64) -> Self {
        Self {
            customer_id,
            total,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Persisted order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub total: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

/// Line item joined with the product display fields the storefront shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemView {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: i64,
    pub subtotal: i64,
    pub product_name: String,
    pub image_url: Option<String>,
}

/// Order header plus its line items (read-only view).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<LineItemView>,
}
