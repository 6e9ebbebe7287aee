use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};

use petstore_core::OrderId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order))
        .route("/:id", get(get_order))
        .route("/:id/status", patch(update_order_status))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    match services
        .orders
        .create_order(body.customer_id, &body.items)
        .await
    {
        Ok(receipt) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "order_id": receipt.order_id,
                "total": receipt.total,
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };

    match services.orders.order_detail(order_id).await {
        Ok(detail) => {
            (StatusCode::OK, Json(dto::order_detail_to_json(&detail))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_order_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateStatusRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id")
        }
    };

    match services.orders.update_status(order_id, &body.status).await {
        Ok(status) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "order_id": order_id,
                "status": status,
            })),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}
