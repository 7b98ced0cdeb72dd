use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::discount::{
    evaluate_individual, evaluate_special, normalize_code, AppliedDiscount, Discount,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::DiscountRepository;

/// Coupon validation and redemption over both discount kinds.
pub struct DiscountService<R> {
    repo: R,
}

impl<R: DiscountRepository> DiscountService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Resolves `code` for `user_id` into a discount. Individual coupons are
    /// looked up first, scoped to their owner; special coupons globally.
    pub fn validate(
        &self,
        code: &str,
        user_id: Uuid,
        cart_total: &BigDecimal,
    ) -> Result<Discount, DomainError> {
        let code = normalize_code(code)?;
        if cart_total <= &BigDecimal::from(0) {
            return Err(DomainError::InvalidRequest(
                "cart total must be positive".to_string(),
            ));
        }
        let now = Utc::now();

        if let Some(coupon) = self.repo.find_individual(&code, user_id)? {
            return evaluate_individual(&coupon, now);
        }

        let coupon = self
            .repo
            .find_special(&code)?
            .ok_or(DomainError::InvalidCode)?;
        let already_used = self.repo.special_usage_exists(user_id, coupon.id)?;
        evaluate_special(&coupon, cart_total, already_used, now)
    }

    /// Redeems by code. Only call after a successful payment.
    pub fn redeem(&self, code: &str, user_id: Uuid) -> Result<AppliedDiscount, DomainError> {
        let code = normalize_code(code)?;
        let applied = match self.repo.find_individual(&code, user_id)? {
            Some(coupon) => Discount::Individual {
                coupon_id: coupon.id,
                code: coupon.code,
                amount: coupon.amount,
            }
            .applied(),
            None => match self.repo.find_special(&code)? {
                Some(coupon) => Discount::Special {
                    coupon_id: coupon.id,
                    code: coupon.code,
                    value: coupon.value,
                }
                .applied(),
                None => return Err(DomainError::NotFoundOrUnauthorized),
            },
        };
        self.redeem_applied(&applied, user_id)?;
        Ok(applied)
    }

    pub fn redeem_applied(
        &self,
        applied: &AppliedDiscount,
        user_id: Uuid,
    ) -> Result<(), DomainError> {
        self.repo.redeem(applied, user_id, Utc::now())?;
        log::info!(
            "{} coupon {} redeemed by user {}",
            applied.kind,
            applied.code,
            user_id
        );
        Ok(())
    }
}
