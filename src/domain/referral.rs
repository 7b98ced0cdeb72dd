use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralStatus {
    Pending,
    Completed,
}

impl ReferralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferralStatus::Pending => "pending",
            ReferralStatus::Completed => "completed",
        }
    }
}

impl FromStr for ReferralStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReferralStatus::Pending),
            "completed" => Ok(ReferralStatus::Completed),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Referral {
    pub id: Uuid,
    pub user_id: Uuid,
    pub referral_code: String,
    pub referrer_id: Option<Uuid>,
    pub status: ReferralStatus,
}

impl Referral {
    /// Only a pending referral with a known referrer earns a reward.
    pub fn is_rewardable(&self) -> bool {
        self.status == ReferralStatus::Pending && self.referrer_id.is_some()
    }
}

/// What the referrer receives when a referral completes.
#[derive(Debug, Clone)]
pub struct RewardTerms {
    pub amount: BigDecimal,
    pub valid_for: Duration,
}

impl RewardTerms {
    pub fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.valid_for
    }
}
