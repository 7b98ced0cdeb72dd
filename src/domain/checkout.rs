use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Cancelled,
    Converted,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Active => "active",
            SessionStatus::Cancelled => "cancelled",
            SessionStatus::Converted => "converted",
        }
    }
}

impl FromStr for SessionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SessionStatus::Active),
            "cancelled" => Ok(SessionStatus::Cancelled),
            "converted" => Ok(SessionStatus::Converted),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

/// A time-boxed reservation: "this user is checking out right now".
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: SessionStatus,
    pub expires_at: DateTime<Utc>,
}

impl CheckoutSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutItem {
    pub id: Uuid,
    pub checkout_session_id: Option<Uuid>,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub total_price: BigDecimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCheckoutItem {
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub total_price: BigDecimal,
}

/// Line-item quantities are positive; anything else is read back as 1.
pub fn coerce_quantity(quantity: i32) -> i32 {
    if quantity > 0 {
        quantity
    } else {
        1
    }
}
