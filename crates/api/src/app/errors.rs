use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use petstore_core::StoreError;

/// Map an error kind to its response category.
///
/// The mapping is deterministic per kind; handlers never inspect messages
/// to pick a status.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        StoreError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        StoreError::InsufficientStock {
            product_id,
            requested,
        } => json_error(
            StatusCode::CONFLICT,
            "insufficient_stock",
            format!("insufficient stock for product {product_id} (requested {requested})"),
        ),
        StoreError::Unexpected(msg) => {
            tracing::error!(error = %msg, "unexpected failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "unexpected_error",
                "internal error",
            )
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
