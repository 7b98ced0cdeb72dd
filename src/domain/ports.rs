use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::checkout::{CheckoutItem, CheckoutSession, NewCheckoutItem};
use super::discount::{AppliedDiscount, IndividualCoupon, SpecialCoupon};
use super::errors::DomainError;
use super::order::{ListResult, NewOrder, OrderStatus, OrderView};
use super::referral::{Referral, RewardTerms};

pub trait CheckoutRepository: Send + Sync + 'static {
    /// Deletes the user's sessions whose deadline lies before `now`.
    fn purge_expired_sessions(&self, user_id: Uuid, now: DateTime<Utc>)
        -> Result<usize, DomainError>;
    fn find_active_session(&self, user_id: Uuid) -> Result<Option<CheckoutSession>, DomainError>;
    /// Returns the user's active session, inserting one that expires at
    /// `expires_at` if there is none.
    fn create_or_reuse_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<CheckoutSession, DomainError>;
    fn delete_sessions(&self, user_id: Uuid) -> Result<usize, DomainError>;
    /// Marks the session converted and drops its line items.
    fn complete_session(&self, session_id: Uuid) -> Result<(), DomainError>;

    fn purge_items_created_before(
        &self,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, DomainError>;
    fn list_items(&self, user_id: Uuid) -> Result<Vec<CheckoutItem>, DomainError>;
    fn add_item(&self, item: NewCheckoutItem) -> Result<CheckoutItem, DomainError>;
    fn delete_items(&self, user_id: Uuid) -> Result<usize, DomainError>;
}

pub trait DiscountRepository: Send + Sync + 'static {
    fn find_individual(
        &self,
        code: &str,
        user_id: Uuid,
    ) -> Result<Option<IndividualCoupon>, DomainError>;
    fn find_special(&self, code: &str) -> Result<Option<SpecialCoupon>, DomainError>;
    fn special_usage_exists(&self, user_id: Uuid, coupon_id: Uuid) -> Result<bool, DomainError>;
    /// Re-checks availability at write time and fails closed.
    fn redeem(
        &self,
        discount: &AppliedDiscount,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError>;
}

pub trait ReferralRepository: Send + Sync + 'static {
    fn find_by_user(&self, user_id: Uuid) -> Result<Option<Referral>, DomainError>;
    fn find_by_code(&self, referral_code: &str) -> Result<Option<Referral>, DomainError>;
    /// Inserts a pending referral with a freshly generated code.
    fn create(&self, user_id: Uuid, referrer_id: Option<Uuid>) -> Result<Referral, DomainError>;
    /// Flips the referral to completed and mints the referrer's coupon in
    /// one transaction. `None` when there was nothing to reward.
    fn complete(
        &self,
        user_id: Uuid,
        terms: &RewardTerms,
        now: DateTime<Utc>,
    ) -> Result<Option<IndividualCoupon>, DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    fn create(&self, order: NewOrder) -> Result<OrderView, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list(&self, user_id: Option<Uuid>, page: i64, limit: i64)
        -> Result<ListResult, DomainError>;
    fn update_status(&self, id: Uuid, target: OrderStatus) -> Result<OrderView, DomainError>;
    fn delete(&self, id: Uuid) -> Result<(), DomainError>;
    /// Redeems the order's discount, marks it paid and converts the buyer's
    /// checkout, all or nothing.
    fn settle_payment(
        &self,
        id: Uuid,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError>;
    fn fail_payment(&self, id: Uuid, payment_id: Option<&str>) -> Result<OrderView, DomainError>;
}
