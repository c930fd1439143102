//! REST API router.
//!
//! Used by the binary and by integration tests. Create with [`create_router`].
//! Uses Extension for state so the router is `Router<()>` and works with `into_make_service()`.

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::service::OrderService;
use crate::types::{NewOrder, OrderId};

/// Builds the REST router around an [`OrderService`].
pub fn create_router(service: OrderService) -> Router<()> {
    Router::new()
        .route("/status", get(status))
        .route("/v1/order", post(new_order))
        .route("/v1/order/:id", get(get_order).delete(cancel_order))
        .route("/v1/deals", get(list_deals))
        .route("/v1/book", get(book))
        .layer(Extension(service))
}

async fn status() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[derive(serde::Deserialize)]
struct NewOrderRequest {
    side: String,
    quantity: u64,
    price_kind: String,
    #[serde(default)]
    limit_price: Option<Decimal>,
}

fn json_error(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

fn error_response(e: EngineError) -> Response {
    let status = match &e {
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        EngineError::NoReferencePrice(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, e.to_string())
}

async fn new_order(
    Extension(service): Extension<OrderService>,
    body: Result<Json<NewOrderRequest>, JsonRejection>,
) -> Response {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => return json_error(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    let order = match NewOrder::parse(&body.side, body.quantity, &body.price_kind, body.limit_price) {
        Ok(order) => order,
        Err(e) => return error_response(e),
    };
    match service.submit(order).await {
        Ok(submission) => (StatusCode::OK, Json(submission)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn cancel_order(Extension(service): Extension<OrderService>, Path(id): Path<u64>) -> Response {
    match service.cancel(OrderId(id)).await {
        Ok(()) => {
            #[derive(serde::Serialize)]
            struct Out {
                cancelled: bool,
            }
            (StatusCode::OK, Json(Out { cancelled: true })).into_response()
        }
        Err(e) => error_response(e),
    }
}

async fn get_order(Extension(service): Extension<OrderService>, Path(id): Path<u64>) -> Response {
    match service.order(OrderId(id)).await {
        Ok(Some(order)) => (StatusCode::OK, Json(order)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, format!("order {} not found", id)),
        Err(e) => error_response(e),
    }
}

async fn list_deals(Extension(service): Extension<OrderService>) -> Response {
    match service.deals().await {
        Ok(deals) => (StatusCode::OK, Json(deals)).into_response(),
        Err(e) => error_response(e),
    }
}

async fn book(Extension(service): Extension<OrderService>) -> Response {
    match service.engine().snapshot().await {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => error_response(e),
    }
}
