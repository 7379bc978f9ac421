use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::handlers::common::success_response;
use crate::services::payments::{PaymentResponse, PendingOrderResponse, SettleOrderRequest};
use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/v1/pos/pending",
    responses(
        (status = 200, description = "Orders awaiting settlement", body = [PendingOrderResponse]),
    ),
    tag = "pos"
)]
pub async fn list_pending(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let pending = state.services.payments.list_pending().await?;
    Ok(success_response(pending))
}

#[utoipa::path(
    post,
    path = "/api/v1/pos/pay/{id}",
    params(("id" = Uuid, Path, description = "Order id")),
    request_body = SettleOrderRequest,
    responses(
        (status = 200, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Unknown payment method or cancelled order"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order already settled"),
    ),
    tag = "pos"
)]
pub async fn settle_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SettleOrderRequest>,
) -> Result<Response, ServiceError> {
    let payment = state.services.payments.settle_order(id, payload).await?;
    Ok(success_response(payment))
}

#[utoipa::path(
    get,
    path = "/api/v1/pos/payments/{order_id}",
    params(("order_id" = Uuid, Path, description = "Order id")),
    responses(
        (status = 200, description = "Payment for the order", body = PaymentResponse),
        (status = 404, description = "No payment recorded"),
    ),
    tag = "pos"
)]
pub async fn get_payment(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Response, ServiceError> {
    let payment = state.services.payments.get_payment(order_id).await?;
    Ok(success_response(payment))
}
