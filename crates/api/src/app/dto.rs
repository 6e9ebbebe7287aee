use serde::Deserialize;
use serde_json::json;

use petstore_core::{CustomerId, ProductId};
use petstore_orders::OrderDetail;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: CustomerId,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

// -------------------------
// Response mapping
// -------------------------

pub fn order_detail_to_json(detail: &OrderDetail) -> serde_json::Value {
    json!({
        "id": detail.order.id,
        "customer_id": detail.order.customer_id,
        "total": detail.order.total,
        "status": detail.order.status,
        "created_at": detail.order.created_at,
        "items": detail.items.iter().map(|item| json!({
            "product_id": item.product_id,
            "quantity": item.quantity,
            "unit_price": item.unit_price,
            "subtotal": item.subtotal,
            "product_name": item.product_name,
            "image_url": item.image_url,
        })).collect::<Vec<_>>(),
    })
}
