use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::discount::IndividualCoupon;
use crate::domain::referral::Referral;
use crate::errors::AppError;

use super::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterReferralRequest {
    pub user_id: Option<Uuid>,
    /// The referrer's code, if the user signed up through one.
    pub referral_code: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteReferralRequest {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReferralResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub referral_code: String,
    pub referrer_id: Option<Uuid>,
    pub status: String,
}

impl From<Referral> for ReferralResponse {
    fn from(r: Referral) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            referral_code: r.referral_code,
            referrer_id: r.referrer_id,
            status: r.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RewardCouponResponse {
    pub id: Uuid,
    pub code: String,
    pub user_id: Uuid,
    pub amount: String,
    pub expiry_date: String,
}

impl From<IndividualCoupon> for RewardCouponResponse {
    fn from(c: IndividualCoupon) -> Self {
        Self {
            id: c.id,
            code: c.code,
            user_id: c.user_id,
            amount: c.amount.to_string(),
            expiry_date: c.expiry_date.to_rfc3339(),
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /referrals
///
/// Records the referral row at signup. Repeating the call for the same
/// user returns the existing row.
#[utoipa::path(
    post,
    path = "/referrals",
    request_body = RegisterReferralRequest,
    responses(
        (status = 201, description = "Referral row for the user", body = ReferralResponse),
        (status = 400, description = "Missing user_id or self-referral"),
        (status = 404, description = "Unknown referrer code"),
    ),
    tag = "referrals"
)]
pub async fn register_referral(
    state: web::Data<AppState>,
    body: web::Json<RegisterReferralRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let user_id = body
        .user_id
        .ok_or_else(|| AppError::invalid("user_id is required"))?;

    let referral = web::block(move || {
        state
            .referrals
            .register(user_id, body.referral_code.as_deref())
    })
    .await??;

    Ok(HttpResponse::Created().json(ReferralResponse::from(referral)))
}

/// GET /referrals/{user_id}
#[utoipa::path(
    get,
    path = "/referrals/{user_id}",
    params(
        ("user_id" = Uuid, Path, description = "User UUID"),
    ),
    responses(
        (status = 200, description = "The user's referral row", body = ReferralResponse),
        (status = 404, description = "User has no referral row"),
    ),
    tag = "referrals"
)]
pub async fn get_referral(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();

    let referral = web::block(move || state.referrals.get(user_id)).await??;

    Ok(HttpResponse::Ok().json(ReferralResponse::from(referral)))
}

/// POST /referrals/complete
///
/// Identity-verification callback. Mints the referrer's reward coupon the
/// first time a rewardable referral completes.
#[utoipa::path(
    post,
    path = "/referrals/complete",
    request_body = CompleteReferralRequest,
    responses(
        (status = 200, description = "Minted coupon, or null when nothing was due"),
        (status = 400, description = "Missing user_id"),
    ),
    tag = "referrals"
)]
pub async fn complete_referral(
    state: web::Data<AppState>,
    body: web::Json<CompleteReferralRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = body
        .user_id
        .ok_or_else(|| AppError::invalid("user_id is required"))?;

    let minted = web::block(move || state.referrals.complete(user_id)).await??;

    Ok(HttpResponse::Ok().json(json!({
        "coupon": minted.map(RewardCouponResponse::from)
    })))
}
