use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::checkout::{CheckoutItem, CheckoutSession, NewCheckoutItem};
use crate::errors::AppError;

use super::{parse_money, AppState, UserQuery};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub expires_at: String,
}

impl From<CheckoutSession> for SessionResponse {
    fn from(s: CheckoutSession) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            status: s.status.as_str().to_string(),
            expires_at: s.expires_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub user_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub variant_id: Option<Uuid>,
    /// Non-positive quantities are stored as 1.
    pub quantity: Option<i32>,
    /// Decimal line total as a string, e.g. "19.90".
    pub total_price: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutItemResponse {
    pub id: Uuid,
    pub checkout_session_id: Option<Uuid>,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub total_price: String,
    pub created_at: String,
}

impl From<CheckoutItem> for CheckoutItemResponse {
    fn from(i: CheckoutItem) -> Self {
        Self {
            id: i.id,
            checkout_session_id: i.checkout_session_id,
            user_id: i.user_id,
            product_id: i.product_id,
            variant_id: i.variant_id,
            quantity: i.quantity,
            total_price: i.total_price.to_string(),
            created_at: i.created_at.to_rfc3339(),
        }
    }
}

// ── Session handlers ─────────────────────────────────────────────────────────

/// GET /checkout/session
///
/// Returns the user's active session, or `null`. Never creates one.
#[utoipa::path(
    get,
    path = "/checkout/session",
    params(UserQuery),
    responses(
        (status = 200, description = "Active session or null", body = SessionResponse),
        (status = 400, description = "Missing user_id"),
    ),
    tag = "checkout"
)]
pub async fn get_session(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = query.require()?;

    let session = web::block(move || state.checkout.get(user_id)).await??;

    Ok(HttpResponse::Ok().json(session.map(SessionResponse::from)))
}

/// POST /checkout/session
///
/// Creates a session or returns the one already active.
#[utoipa::path(
    post,
    path = "/checkout/session",
    params(UserQuery),
    responses(
        (status = 200, description = "Active session", body = SessionResponse),
        (status = 400, description = "Missing user_id"),
    ),
    tag = "checkout"
)]
pub async fn create_session(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = query.require()?;

    let session = web::block(move || state.checkout.create(user_id)).await??;

    Ok(HttpResponse::Ok().json(SessionResponse::from(session)))
}

/// DELETE /checkout/session
#[utoipa::path(
    delete,
    path = "/checkout/session",
    params(UserQuery),
    responses(
        (status = 200, description = "Sessions removed"),
        (status = 400, description = "Missing user_id"),
    ),
    tag = "checkout"
)]
pub async fn cancel_session(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = query.require()?;

    let removed = web::block(move || state.checkout.cancel(user_id)).await??;

    Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}

// ── Line item handlers ───────────────────────────────────────────────────────

/// GET /checkout/items
///
/// Lists the user's line items after dropping those past their TTL.
#[utoipa::path(
    get,
    path = "/checkout/items",
    params(UserQuery),
    responses(
        (status = 200, description = "Current line items", body = Vec<CheckoutItemResponse>),
        (status = 400, description = "Missing user_id"),
    ),
    tag = "checkout"
)]
pub async fn list_items(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = query.require()?;

    let items = web::block(move || state.checkout.list_items(user_id)).await??;

    let body: Vec<CheckoutItemResponse> = items.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// POST /checkout/items
#[utoipa::path(
    post,
    path = "/checkout/items",
    request_body = AddItemRequest,
    responses(
        (status = 201, description = "Line item stored", body = CheckoutItemResponse),
        (status = 400, description = "Missing or malformed field"),
    ),
    tag = "checkout"
)]
pub async fn add_item(
    state: web::Data<AppState>,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let user_id = body
        .user_id
        .ok_or_else(|| AppError::invalid("user_id is required"))?;
    let product_id = body
        .product_id
        .ok_or_else(|| AppError::invalid("product_id is required"))?;
    let total_price = body
        .total_price
        .as_deref()
        .ok_or_else(|| AppError::invalid("total_price is required"))
        .and_then(|raw| parse_money("total_price", raw))?;
    let item = NewCheckoutItem {
        user_id,
        product_id,
        variant_id: body.variant_id,
        quantity: body.quantity.unwrap_or(1),
        total_price,
    };

    let stored = web::block(move || state.checkout.add_item(item)).await??;

    Ok(HttpResponse::Created().json(CheckoutItemResponse::from(stored)))
}

/// DELETE /checkout/items
#[utoipa::path(
    delete,
    path = "/checkout/items",
    params(UserQuery),
    responses(
        (status = 200, description = "Line items removed"),
        (status = 400, description = "Missing user_id"),
    ),
    tag = "checkout"
)]
pub async fn clear_items(
    state: web::Data<AppState>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, AppError> {
    let user_id = query.require()?;

    let removed = web::block(move || state.checkout.clear_items(user_id)).await??;

    Ok(HttpResponse::Ok().json(json!({ "removed": removed })))
}
