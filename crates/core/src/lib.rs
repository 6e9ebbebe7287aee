//! `petstore-core` — foundation building blocks shared by every crate.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{StoreError, StoreResult};
pub use id::{CustomerId, OrderId, ProductId};
