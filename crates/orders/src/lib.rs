//! `petstore-orders` — pure order domain: statuses, line-item pricing,
//! order shapes. No I/O lives here.

pub mod order;
pub mod status;

pub use order::{order_total, LineItemView, NewOrder, Order, OrderDetail, OrderLine};
pub use status::OrderStatus;
