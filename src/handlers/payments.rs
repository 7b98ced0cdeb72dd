use actix_web::{web, HttpResponse};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::payment_service::PaymentVerification;
use crate::errors::AppError;

use super::orders::OrderResponse;
use super::AppState;

/// Checkout result relayed by the client after the gateway's widget closes.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyPaymentRequest {
    pub order_id: Option<Uuid>,
    pub gateway_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::invalid(format!("{field} is required")))
}

/// POST /payments/{gateway}/verify
///
/// Verifies the gateway signature and settles the order: discount redeemed,
/// order paid, checkout cleared, in one transaction. A mismatch marks the
/// payment failed and answers 400.
#[utoipa::path(
    post,
    path = "/payments/{gateway}/verify",
    params(
        ("gateway" = String, Path, description = "Gateway name, e.g. razorpay"),
    ),
    request_body = VerifyPaymentRequest,
    responses(
        (status = 200, description = "Payment verified, order paid", body = OrderResponse),
        (status = 400, description = "Missing field or signature mismatch"),
        (status = 404, description = "Unknown gateway or order"),
    ),
    tag = "payments"
)]
pub async fn verify_payment(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<VerifyPaymentRequest>,
) -> Result<HttpResponse, AppError> {
    let gateway = path.into_inner();
    let body = body.into_inner();
    let payment = PaymentVerification {
        order_id: body
            .order_id
            .ok_or_else(|| AppError::invalid("order_id is required"))?,
        gateway_order_id: required(body.gateway_order_id, "gateway_order_id")?,
        payment_id: required(body.payment_id, "payment_id")?,
        signature: required(body.signature, "signature")?,
    };

    let order = web::block(move || state.payments.verify(&gateway, payment)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}
