use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;

/// Referral reward owned by a single user.
#[derive(Debug, Clone)]
pub struct IndividualCoupon {
    pub id: Uuid,
    pub code: String,
    pub user_id: Uuid,
    pub referral_id: Uuid,
    pub amount: BigDecimal,
    pub is_used: bool,
    pub expiry_date: DateTime<Utc>,
}

/// Globally shared promotional code with a remaining-uses counter.
#[derive(Debug, Clone)]
pub struct SpecialCoupon {
    pub id: Uuid,
    pub code: String,
    pub value: DiscountValue,
    pub usage_limit: i32,
    pub min_order_amount: BigDecimal,
    pub expiry_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DiscountValue {
    Fixed(BigDecimal),
    Percentage(BigDecimal),
}

impl DiscountValue {
    /// Exactly one of `amount` / `percentage` must be set.
    pub fn from_columns(
        amount: Option<BigDecimal>,
        percentage: Option<BigDecimal>,
    ) -> Result<Self, DomainError> {
        match (amount, percentage) {
            (Some(amount), None) => Ok(DiscountValue::Fixed(amount)),
            (None, Some(pct)) => Ok(DiscountValue::Percentage(pct)),
            _ => Err(DomainError::Internal(
                "special coupon must carry exactly one of amount or percentage".to_string(),
            )),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            DiscountValue::Fixed(_) => "fixed",
            DiscountValue::Percentage(_) => "percentage",
        }
    }

    pub fn raw(&self) -> &BigDecimal {
        match self {
            DiscountValue::Fixed(v) | DiscountValue::Percentage(v) => v,
        }
    }

    /// Money taken off `subtotal`, never more than the subtotal itself.
    pub fn amount_off(&self, subtotal: &BigDecimal) -> BigDecimal {
        let off = match self {
            DiscountValue::Fixed(amount) => amount.clone(),
            DiscountValue::Percentage(pct) => (subtotal * pct / BigDecimal::from(100)).round(2),
        };
        if &off > subtotal {
            subtotal.clone()
        } else {
            off
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CouponKind {
    Individual,
    Special,
}

impl CouponKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CouponKind::Individual => "individual",
            CouponKind::Special => "special",
        }
    }
}

impl FromStr for CouponKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(CouponKind::Individual),
            "special" => Ok(CouponKind::Special),
            other => Err(DomainError::Internal(format!("unknown coupon kind '{other}'"))),
        }
    }
}

impl fmt::Display for CouponKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful `validate`: which coupon applies and how much.
#[derive(Debug, Clone, PartialEq)]
pub enum Discount {
    Individual {
        coupon_id: Uuid,
        code: String,
        amount: BigDecimal,
    },
    Special {
        coupon_id: Uuid,
        code: String,
        value: DiscountValue,
    },
}

impl Discount {
    pub fn kind(&self) -> CouponKind {
        match self {
            Discount::Individual { .. } => CouponKind::Individual,
            Discount::Special { .. } => CouponKind::Special,
        }
    }

    pub fn coupon_id(&self) -> Uuid {
        match self {
            Discount::Individual { coupon_id, .. } | Discount::Special { coupon_id, .. } => {
                *coupon_id
            }
        }
    }

    pub fn code(&self) -> &str {
        match self {
            Discount::Individual { code, .. } | Discount::Special { code, .. } => code,
        }
    }

    pub fn value(&self) -> DiscountValue {
        match self {
            Discount::Individual { amount, .. } => DiscountValue::Fixed(amount.clone()),
            Discount::Special { value, .. } => value.clone(),
        }
    }

    pub fn applied(&self) -> AppliedDiscount {
        AppliedDiscount {
            kind: self.kind(),
            coupon_id: self.coupon_id(),
            code: self.code().to_string(),
        }
    }
}

/// The discount an order carries until payment settles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDiscount {
    pub kind: CouponKind,
    pub coupon_id: Uuid,
    pub code: String,
}

/// Trims and uppercases a coupon code. Empty codes are rejected.
pub fn normalize_code(code: &str) -> Result<String, DomainError> {
    let normalized = code.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(DomainError::InvalidRequest("coupon code is required".to_string()));
    }
    Ok(normalized)
}

pub fn evaluate_individual(
    coupon: &IndividualCoupon,
    now: DateTime<Utc>,
) -> Result<Discount, DomainError> {
    if coupon.is_used {
        return Err(DomainError::AlreadyUsed);
    }
    if coupon.expiry_date < now {
        return Err(DomainError::Expired);
    }
    Ok(Discount::Individual {
        coupon_id: coupon.id,
        code: coupon.code.clone(),
        amount: coupon.amount.clone(),
    })
}

pub fn evaluate_special(
    coupon: &SpecialCoupon,
    cart_total: &BigDecimal,
    already_used: bool,
    now: DateTime<Utc>,
) -> Result<Discount, DomainError> {
    if coupon.expiry_date < now {
        return Err(DomainError::Expired);
    }
    if coupon.usage_limit <= 0 {
        return Err(DomainError::LimitReached);
    }
    if cart_total < &coupon.min_order_amount {
        return Err(DomainError::MinAmountNotMet {
            minimum: coupon.min_order_amount.clone(),
        });
    }
    if already_used {
        return Err(DomainError::AlreadyUsed);
    }
    Ok(Discount::Special {
        coupon_id: coupon.id,
        code: coupon.code.clone(),
        value: coupon.value.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn individual(is_used: bool, expiry: DateTime<Utc>) -> IndividualCoupon {
        IndividualCoupon {
            id: Uuid::new_v4(),
            code: "RWDABC123".to_string(),
            user_id: Uuid::new_v4(),
            referral_id: Uuid::new_v4(),
            amount: dec("100"),
            is_used,
            expiry_date: expiry,
        }
    }

    fn special(limit: i32, min: &str, expiry: DateTime<Utc>) -> SpecialCoupon {
        SpecialCoupon {
            id: Uuid::new_v4(),
            code: "SUMMER10".to_string(),
            value: DiscountValue::Percentage(dec("10")),
            usage_limit: limit,
            min_order_amount: dec(min),
            expiry_date: expiry,
        }
    }

    #[test]
    fn normalize_code_trims_and_uppercases() {
        assert_eq!(normalize_code("  summer10 ").unwrap(), "SUMMER10");
        assert!(matches!(
            normalize_code("   "),
            Err(DomainError::InvalidRequest(_))
        ));
    }

    #[test]
    fn expired_individual_coupon_is_rejected() {
        let now = Utc::now();
        let coupon = individual(false, now - Duration::days(1));
        assert!(matches!(
            evaluate_individual(&coupon, now),
            Err(DomainError::Expired)
        ));
    }

    #[test]
    fn used_individual_coupon_is_rejected_before_expiry_check() {
        let now = Utc::now();
        let coupon = individual(true, now - Duration::days(1));
        assert!(matches!(
            evaluate_individual(&coupon, now),
            Err(DomainError::AlreadyUsed)
        ));
    }

    #[test]
    fn valid_individual_coupon_yields_fixed_discount() {
        let now = Utc::now();
        let coupon = individual(false, now + Duration::days(3));
        let discount = evaluate_individual(&coupon, now).unwrap();
        assert_eq!(discount.kind(), CouponKind::Individual);
        assert_eq!(discount.coupon_id(), coupon.id);
        assert_eq!(discount.value(), DiscountValue::Fixed(dec("100")));
    }

    #[test]
    fn special_below_minimum_reports_the_minimum() {
        let now = Utc::now();
        let coupon = special(5, "1000", now + Duration::days(1));
        let err = evaluate_special(&coupon, &dec("500"), false, now).unwrap_err();
        assert!(matches!(err, DomainError::MinAmountNotMet { .. }));
        assert!(err.to_string().contains("1000"));
    }

    #[test]
    fn special_rule_order_is_expiry_limit_minimum_usage() {
        let now = Utc::now();
        let expired = special(0, "1000", now - Duration::days(1));
        assert!(matches!(
            evaluate_special(&expired, &dec("1"), true, now),
            Err(DomainError::Expired)
        ));

        let exhausted = special(0, "1000", now + Duration::days(1));
        assert!(matches!(
            evaluate_special(&exhausted, &dec("1"), true, now),
            Err(DomainError::LimitReached)
        ));

        let used = special(3, "10", now + Duration::days(1));
        assert!(matches!(
            evaluate_special(&used, &dec("50"), true, now),
            Err(DomainError::AlreadyUsed)
        ));
    }

    #[test]
    fn special_coupon_yields_its_own_value() {
        let now = Utc::now();
        let coupon = special(1, "0", now + Duration::days(1));
        let discount = evaluate_special(&coupon, &dec("200"), false, now).unwrap();
        assert_eq!(discount.kind(), CouponKind::Special);
        assert_eq!(discount.value(), DiscountValue::Percentage(dec("10")));
        assert_eq!(discount.applied().code, "SUMMER10");
    }

    #[test]
    fn amount_off_caps_fixed_discount_at_subtotal() {
        let value = DiscountValue::Fixed(dec("100"));
        assert_eq!(value.amount_off(&dec("60")), dec("60"));
        assert_eq!(value.amount_off(&dec("250")), dec("100"));
    }

    #[test]
    fn amount_off_rounds_percentage_to_cents() {
        let value = DiscountValue::Percentage(dec("15"));
        assert_eq!(value.amount_off(&dec("33.33")), dec("5.00"));
    }

    #[test]
    fn discount_value_requires_exactly_one_column() {
        assert!(DiscountValue::from_columns(Some(dec("5")), Some(dec("5"))).is_err());
        assert!(DiscountValue::from_columns(None, None).is_err());
        assert_eq!(
            DiscountValue::from_columns(None, Some(dec("5"))).unwrap(),
            DiscountValue::Percentage(dec("5"))
        );
    }
}
