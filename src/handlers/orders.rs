use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::order_service::CheckoutSubmission;
use crate::domain::order::{ListResult, OrderItemInput, OrderView};
use crate::errors::AppError;

use super::{parse_money, AppState};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderItemRequest {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub payment_method: String,
    /// Order reference issued by the payment gateway, checked on verification.
    pub gateway_order_id: Option<String>,
    /// Decimal shipping charge. Defaults to "0".
    pub shipping_amount: Option<String>,
    pub coupon_code: Option<String>,
    pub items: Vec<CreateOrderItemRequest>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub subtotal_amount: String,
    pub discount_amount: String,
    pub shipping_amount: String,
    pub total_amount: String,
    pub coupon_code: Option<String>,
    pub payment_method: String,
    pub status: String,
    pub payment_status: String,
    pub gateway_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub created_at: String,
    pub items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        Self {
            id: o.id,
            user_id: o.user_id,
            address_id: o.address_id,
            subtotal_amount: o.totals.subtotal.to_string(),
            discount_amount: o.totals.discount.to_string(),
            shipping_amount: o.totals.shipping.to_string(),
            total_amount: o.totals.total.to_string(),
            coupon_code: o.coupon_code,
            payment_method: o.payment_method,
            status: o.status.as_str().to_string(),
            payment_status: o.payment_status.as_str().to_string(),
            gateway_order_id: o.gateway_order_id,
            payment_id: o.payment_id,
            created_at: o.created_at.to_rfc3339(),
            items: o
                .items
                .into_iter()
                .map(|i| OrderItemResponse {
                    id: i.id,
                    product_id: i.product_id,
                    variant_id: i.variant_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price.to_string(),
                })
                .collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListOrdersParams {
    /// Only this buyer's orders when set.
    pub user_id: Option<Uuid>,
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

impl ListOrdersResponse {
    fn new(result: ListResult, page: i64, limit: i64) -> Self {
        Self {
            items: result.items.into_iter().map(Into::into).collect(),
            total: result.total,
            page,
            limit,
        }
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Creates a `confirmed/pending` order with its items and an outbox event in
/// one transaction. A coupon code is validated against the subtotal and
/// stored on the order; it is redeemed only when the payment settles.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Invalid items or coupon rejected"),
        (status = 404, description = "Unknown coupon code"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();

    let items = body
        .items
        .iter()
        .map(|i| {
            Ok(OrderItemInput {
                product_id: i.product_id,
                variant_id: i.variant_id,
                quantity: i.quantity,
                unit_price: parse_money("unit_price", &i.unit_price)?,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;
    let shipping = parse_money("shipping_amount", body.shipping_amount.as_deref().unwrap_or("0"))?;
    let submission = CheckoutSubmission {
        user_id: body.user_id,
        address_id: body.address_id,
        payment_method: body.payment_method,
        gateway_order_id: body.gateway_order_id,
        shipping,
        coupon_code: body.coupon_code,
        items,
    };

    let order = web::block(move || state.orders.submit(submission)).await??;

    Ok(HttpResponse::Created().json(OrderResponse::from(order)))
}

/// GET /orders/{id}
///
/// Returns the order together with its items.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let order = web::block(move || state.orders.get(order_id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// GET /orders
///
/// Paginated, newest first. Use `page` (1-based) and `limit` to page.
#[utoipa::path(
    get,
    path = "/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 500, description = "Internal server error"),
    ),
    tag = "orders"
)]
pub async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result =
        web::block(move || state.orders.list(params.user_id, page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse::new(result, page, limit)))
}

/// PATCH /orders/{id}/status
///
/// Moves the order forward along confirmed, shipped, delivered, cancelled,
/// returned. Moving backwards is rejected and leaves the order untouched.
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderResponse),
        (status = 400, description = "Invalid status or illegal transition"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn update_order_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status = body
        .into_inner()
        .status
        .ok_or_else(|| AppError::InvalidRequest {
            code: "INVALID_STATUS",
            message: "Invalid status".to_string(),
        })?;

    let order = web::block(move || state.orders.update_status(order_id, &status)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// DELETE /orders/{id}
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 204, description = "Order deleted"),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn delete_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    web::block(move || state.orders.delete(order_id)).await??;

    Ok(HttpResponse::NoContent().finish())
}
