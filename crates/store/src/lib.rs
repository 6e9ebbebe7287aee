//! `petstore-store` — storage boundary for the order-fulfillment core.
//!
//! This crate defines the persistence ports the service layer depends on
//! without making any storage assumptions, plus two adapters: a Postgres
//! implementation for production and an in-memory implementation for
//! tests/dev.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{InventoryStore, OrderStore, OrderTx, ProductQuote, ProductRecord, Store};
