use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::discount::Discount;
use crate::errors::AppError;

use super::{parse_money, AppState};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateCouponRequest {
    pub code: Option<String>,
    pub user_id: Option<Uuid>,
    /// Decimal cart total as a string, e.g. "499.00".
    pub cart_total: Option<String>,
}

/// Discount descriptor returned by a successful validation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateCouponResponse {
    /// Coupon id the discount is bound to.
    pub id: Uuid,
    pub code: String,
    /// `fixed` or `percentage`.
    #[serde(rename = "type")]
    pub value_type: String,
    /// Amount of money, or percentage points.
    pub value: String,
    /// `individual` or `special`.
    #[serde(rename = "couponType")]
    pub coupon_type: String,
}

impl From<Discount> for ValidateCouponResponse {
    fn from(d: Discount) -> Self {
        let value = d.value();
        Self {
            id: d.coupon_id(),
            code: d.code().to_string(),
            value_type: value.type_name().to_string(),
            value: value.raw().to_string(),
            coupon_type: d.kind().as_str().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RedeemCouponRequest {
    pub code: Option<String>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RedeemCouponResponse {
    pub id: Uuid,
    pub code: String,
    #[serde(rename = "couponType")]
    pub coupon_type: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /coupons/validate
#[utoipa::path(
    post,
    path = "/coupons/validate",
    request_body = ValidateCouponRequest,
    responses(
        (status = 200, description = "Coupon applies", body = ValidateCouponResponse),
        (status = 400, description = "INVALID, MIN_AMOUNT_NOT_MET, EXPIRED, USED or LIMIT_REACHED"),
        (status = 404, description = "Unknown code"),
    ),
    tag = "coupons"
)]
pub async fn validate_coupon(
    state: web::Data<AppState>,
    body: web::Json<ValidateCouponRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let code = body
        .code
        .ok_or_else(|| AppError::invalid("code is required"))?;
    let user_id = body
        .user_id
        .ok_or_else(|| AppError::invalid("user_id is required"))?;
    let cart_total = body
        .cart_total
        .as_deref()
        .ok_or_else(|| AppError::invalid("cart_total is required"))
        .and_then(|raw| parse_money("cart_total", raw))?;

    let discount =
        web::block(move || state.coupons.validate(&code, user_id, &cart_total)).await??;

    Ok(HttpResponse::Ok().json(ValidateCouponResponse::from(discount)))
}

/// POST /coupons/redeem
///
/// Consumes a coupon for the user. Meant for post-payment flows; orders
/// placed through `/orders` redeem their own coupon on settlement.
#[utoipa::path(
    post,
    path = "/coupons/redeem",
    request_body = RedeemCouponRequest,
    responses(
        (status = 200, description = "Coupon redeemed", body = RedeemCouponResponse),
        (status = 400, description = "Missing field, already used or limit reached"),
        (status = 404, description = "No matching unused coupon for this user"),
    ),
    tag = "coupons"
)]
pub async fn redeem_coupon(
    state: web::Data<AppState>,
    body: web::Json<RedeemCouponRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let code = body
        .code
        .ok_or_else(|| AppError::invalid("code is required"))?;
    let user_id = body
        .user_id
        .ok_or_else(|| AppError::invalid("user_id is required"))?;

    let applied = web::block(move || state.coupons.redeem(&code, user_id)).await??;

    Ok(HttpResponse::Ok().json(RedeemCouponResponse {
        id: applied.coupon_id,
        code: applied.code,
        coupon_type: applied.kind.as_str().to_string(),
    }))
}
