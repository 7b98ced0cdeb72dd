use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::schema::{
    checkout_items, checkout_sessions, individual_coupons, order_items, order_outbox, orders,
    referrals, special_coupon_usages, special_coupons,
};

// ── Checkout ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = checkout_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CheckoutSessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = checkout_sessions)]
pub struct NewCheckoutSessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = checkout_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CheckoutItemRow {
    pub id: Uuid,
    pub checkout_session_id: Option<Uuid>,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub total_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = checkout_items)]
pub struct NewCheckoutItemRow {
    pub id: Uuid,
    pub checkout_session_id: Option<Uuid>,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub total_price: BigDecimal,
}

// ── Discount ledger ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = individual_coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IndividualCouponRow {
    pub id: Uuid,
    pub code: String,
    pub user_id: Uuid,
    pub referral_id: Uuid,
    pub amount: BigDecimal,
    pub is_used: bool,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = individual_coupons)]
pub struct NewIndividualCouponRow {
    pub id: Uuid,
    pub code: String,
    pub user_id: Uuid,
    pub referral_id: Uuid,
    pub amount: BigDecimal,
    pub is_used: bool,
    pub expiry_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = special_coupons)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SpecialCouponRow {
    pub id: Uuid,
    pub code: String,
    pub amount: Option<BigDecimal>,
    pub percentage: Option<BigDecimal>,
    pub usage_limit: i32,
    pub min_order_amount: BigDecimal,
    pub expiry_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Special coupons are provisioned outside this service (seed scripts).
#[derive(Debug, Insertable)]
#[diesel(table_name = special_coupons)]
pub struct NewSpecialCouponRow {
    pub id: Uuid,
    pub code: String,
    pub amount: Option<BigDecimal>,
    pub percentage: Option<BigDecimal>,
    pub usage_limit: i32,
    pub min_order_amount: BigDecimal,
    pub expiry_date: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = special_coupon_usages)]
pub struct NewSpecialCouponUsageRow {
    pub user_id: Uuid,
    pub coupon_id: Uuid,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = referrals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReferralRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub referral_code: String,
    pub referrer_id: Option<Uuid>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = referrals)]
pub struct NewReferralRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub referral_code: String,
    pub referrer_id: Option<Uuid>,
    pub status: String,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub subtotal_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub coupon_code: Option<String>,
    pub coupon_kind: Option<String>,
    pub coupon_id: Option<Uuid>,
    pub shipping_amount: BigDecimal,
    pub payment_method: String,
    pub status: String,
    pub payment_status: String,
    pub gateway_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub subtotal_amount: BigDecimal,
    pub total_amount: BigDecimal,
    pub discount_amount: BigDecimal,
    pub coupon_code: Option<String>,
    pub coupon_kind: Option<String>,
    pub coupon_id: Option<Uuid>,
    pub shipping_amount: BigDecimal,
    pub payment_method: String,
    pub status: String,
    pub payment_status: String,
    pub gateway_order_id: Option<String>,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = order_outbox)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_outbox)]
pub struct NewOutboxEventRow {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Value,
}
