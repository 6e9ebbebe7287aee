use async_trait::async_trait;

use petstore_core::{OrderId, ProductId, StoreResult};
use petstore_orders::{NewOrder, OrderDetail, OrderLine, OrderStatus};

/// Current price and stock of a product, as read inside the creation
/// transaction. Prices are in the smallest currency unit (e.g., cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductQuote {
    pub unit_price: i64,
    pub stock: i64,
}

/// Product row as the store sees it.
///
/// Product CRUD lives outside this core; the shape exists for seeding
/// dev/test stores and for the order-detail display join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRecord {
    pub id: ProductId,
    pub name: String,
    pub image_url: Option<String>,
    pub unit_price: i64,
    pub stock: i64,
}

/// Inventory reads and the guarded stock decrement.
#[async_trait]
pub trait InventoryStore: Send {
    /// Current price and stock, or `None` when no such product exists.
    async fn price_and_stock(&mut self, product_id: ProductId)
        -> StoreResult<Option<ProductQuote>>;

    /// Reduce stock by `quantity` if and only if current stock covers it;
    /// `InsufficientStock` otherwise, leaving stock unchanged.
    ///
    /// The guard and the write are one operation, so two concurrent orders
    /// cannot both pass on a stale read.
    async fn decrement_stock(&mut self, product_id: ProductId, quantity: i64) -> StoreResult<()>;
}

/// Order persistence performed inside the atomic unit.
#[async_trait]
pub trait OrderStore: Send {
    /// Persist the order header and all line items as a unit, returning
    /// the generated order id.
    async fn create_order_with_items(
        &mut self,
        order: &NewOrder,
        lines: &[OrderLine],
    ) -> StoreResult<OrderId>;
}

/// Atomic unit of work spanning inventory and order writes.
///
/// Dropping a unit without calling `commit` discards every write made
/// through it; failure paths never call rollback by hand.
#[async_trait]
pub trait OrderTx: InventoryStore + OrderStore {
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Storage entry point injected into the service layer.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open the atomic unit of work backing order creation.
    async fn begin(&self) -> StoreResult<Box<dyn OrderTx>>;

    /// Order header joined with its line items and the referenced
    /// products' display fields. Read-only.
    async fn order_with_items(&self, order_id: OrderId) -> StoreResult<Option<OrderDetail>>;

    /// Single conditional status update; `NotFound` when no row matches.
    async fn update_status(&self, order_id: OrderId, status: OrderStatus) -> StoreResult<()>;
}
