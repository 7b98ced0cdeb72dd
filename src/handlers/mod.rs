pub mod checkout;
pub mod coupons;
pub mod orders;
pub mod payments;
pub mod referrals;

use std::str::FromStr;
use std::sync::Arc;

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::HttpRequest;
use bigdecimal::BigDecimal;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::application::checkout_service::CheckoutService;
use crate::application::discount_service::DiscountService;
use crate::application::order_service::OrderService;
use crate::application::payment_service::{PaymentReconciler, RazorpayGateway};
use crate::application::referral_service::ReferralService;
use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::AppError;
use crate::infrastructure::checkout_repo::DieselCheckoutRepository;
use crate::infrastructure::discount_repo::DieselDiscountRepository;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::referral_repo::DieselReferralRepository;

pub type Orders = OrderService<DieselOrderRepository, DieselDiscountRepository>;

/// Services shared by every worker, wired to the diesel repositories.
pub struct AppState {
    pub checkout: CheckoutService<DieselCheckoutRepository>,
    pub coupons: DiscountService<DieselDiscountRepository>,
    pub referrals: ReferralService<DieselReferralRepository>,
    pub orders: Arc<Orders>,
    pub payments: PaymentReconciler<DieselOrderRepository, DieselDiscountRepository>,
}

impl AppState {
    pub fn new(pool: DbPool, config: &AppConfig) -> Self {
        let orders = Arc::new(OrderService::new(
            DieselOrderRepository::new(pool.clone()),
            DiscountService::new(DieselDiscountRepository::new(pool.clone())),
        ));

        let mut payments = PaymentReconciler::new(Arc::clone(&orders));
        match &config.razorpay_key_secret {
            Some(secret) => {
                payments = payments.with_gateway(Box::new(RazorpayGateway::new(secret.clone())))
            }
            None => log::warn!("RAZORPAY_KEY_SECRET not set, razorpay verification disabled"),
        }

        Self {
            checkout: CheckoutService::new(
                DieselCheckoutRepository::new(pool.clone()),
                config.checkout_session_ttl,
                config.checkout_item_ttl,
            ),
            coupons: DiscountService::new(DieselDiscountRepository::new(pool.clone())),
            referrals: ReferralService::new(
                DieselReferralRepository::new(pool),
                config.referral_reward.clone(),
            ),
            orders,
            payments,
        }
    }
}

// ── Shared request helpers ───────────────────────────────────────────────────

/// `?user_id=` on the checkout routes. Kept as a string so a missing or
/// malformed id surfaces as our own 400 rather than the extractor's.
#[derive(Debug, Deserialize, IntoParams)]
pub struct UserQuery {
    /// Buyer UUID.
    pub user_id: Option<String>,
}

impl UserQuery {
    pub fn require(&self) -> Result<Uuid, AppError> {
        let raw = self
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::invalid("user_id is required"))?;
        Uuid::parse_str(raw).map_err(|_| AppError::invalid(format!("invalid user_id '{raw}'")))
    }
}

/// Decimal money sent as a string, e.g. "9.99".
pub fn parse_money(field: &str, raw: &str) -> Result<BigDecimal, AppError> {
    BigDecimal::from_str(raw.trim())
        .map_err(|_| AppError::invalid(format!("{field} must be a decimal amount, got '{raw}'")))
}

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::invalid(err.to_string()).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::invalid(err.to_string()).into()
}
