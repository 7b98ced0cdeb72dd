use std::env;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::Duration;
use thiserror::Error;

use crate::domain::order::check_money;
use crate::domain::referral::RewardTerms;

/// One week.
const MAX_TTL_MINUTES: i64 = 7 * 24 * 60;
/// Ten years.
const MAX_COUPON_VALID_DAYS: i64 = 3650;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable '{0}'")]
    Missing(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub checkout_session_ttl: Duration,
    pub checkout_item_ttl: Duration,
    pub referral_reward: RewardTerms,
    pub razorpay_key_secret: Option<String>,
}

impl AppConfig {
    /// Reads configuration from the process environment, after loading an
    /// optional `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 = parse_or(&lookup, "PORT", 8080)?;

        let session_minutes: i64 = parse_or(&lookup, "CHECKOUT_SESSION_TTL_MINUTES", 15)?;
        let item_minutes: i64 = parse_or(&lookup, "CHECKOUT_ITEM_TTL_MINUTES", 30)?;
        let reward_amount: BigDecimal =
            parse_or(&lookup, "REFERRAL_REWARD_AMOUNT", BigDecimal::from(100))?;
        let reward_days: i64 = parse_or(&lookup, "REFERRAL_COUPON_VALID_DAYS", 30)?;

        for (name, value, max) in [
            ("CHECKOUT_SESSION_TTL_MINUTES", session_minutes, MAX_TTL_MINUTES),
            ("CHECKOUT_ITEM_TTL_MINUTES", item_minutes, MAX_TTL_MINUTES),
            ("REFERRAL_COUPON_VALID_DAYS", reward_days, MAX_COUPON_VALID_DAYS),
        ] {
            if value <= 0 || value > max {
                return Err(ConfigError::Invalid {
                    name,
                    reason: format!("must be between 1 and {max}, got {value}"),
                });
            }
        }
        if reward_amount <= BigDecimal::from(0) {
            return Err(ConfigError::Invalid {
                name: "REFERRAL_REWARD_AMOUNT",
                reason: "must be positive".to_string(),
            });
        }
        check_money("REFERRAL_REWARD_AMOUNT", &reward_amount).map_err(|e| {
            ConfigError::Invalid {
                name: "REFERRAL_REWARD_AMOUNT",
                reason: e.to_string(),
            }
        })?;

        Ok(Self {
            database_url,
            host,
            port,
            checkout_session_ttl: Duration::minutes(session_minutes),
            checkout_item_ttl: Duration::minutes(item_minutes),
            referral_reward: RewardTerms {
                amount: reward_amount,
                valid_for: Duration::days(reward_days),
            },
            razorpay_key_secret: lookup("RAZORPAY_KEY_SECRET").filter(|s| !s.is_empty()),
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
