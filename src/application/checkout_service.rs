use bigdecimal::BigDecimal;
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::domain::checkout::{coerce_quantity, CheckoutItem, CheckoutSession, NewCheckoutItem};
use crate::domain::errors::DomainError;
use crate::domain::order::check_money;
use crate::domain::ports::CheckoutRepository;

/// Checkout reservations and the line items attached to them.
///
/// Expiry is enforced lazily: every read or write first purges whatever
/// has lapsed, so no background sweeper is needed.
pub struct CheckoutService<R> {
    repo: R,
    session_ttl: Duration,
    item_ttl: Duration,
}

impl<R: CheckoutRepository> CheckoutService<R> {
    pub fn new(repo: R, session_ttl: Duration, item_ttl: Duration) -> Self {
        Self {
            repo,
            session_ttl,
            item_ttl,
        }
    }

    /// Never creates.
    pub fn get(&self, user_id: Uuid) -> Result<Option<CheckoutSession>, DomainError> {
        self.repo.purge_expired_sessions(user_id, Utc::now())?;
        self.repo.find_active_session(user_id)
    }

    /// Idempotent: an unexpired active session is returned unchanged.
    pub fn create(&self, user_id: Uuid) -> Result<CheckoutSession, DomainError> {
        let now = Utc::now();
        self.repo.purge_expired_sessions(user_id, now)?;
        let session = self
            .repo
            .create_or_reuse_session(user_id, now + self.session_ttl)?;
        log::info!(
            "checkout session {} active for user {} until {}",
            session.id,
            user_id,
            session.expires_at
        );
        Ok(session)
    }

    pub fn cancel(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let removed = self.repo.delete_sessions(user_id)?;
        if removed > 0 {
            log::info!("cancelled {} checkout session(s) for user {}", removed, user_id);
        }
        Ok(removed)
    }

    pub fn complete(&self, session_id: Uuid) -> Result<(), DomainError> {
        self.repo.complete_session(session_id)
    }

    pub fn list_items(&self, user_id: Uuid) -> Result<Vec<CheckoutItem>, DomainError> {
        let purged = self
            .repo
            .purge_items_created_before(user_id, Utc::now() - self.item_ttl)?;
        if purged > 0 {
            log::debug!("purged {} stale checkout item(s) for user {}", purged, user_id);
        }
        let items = self.repo.list_items(user_id)?;
        Ok(items
            .into_iter()
            .map(|mut item| {
                if item.quantity <= 0 {
                    log::warn!(
                        "checkout item {} has invalid quantity {}, reading as 1",
                        item.id,
                        item.quantity
                    );
                    item.quantity = coerce_quantity(item.quantity);
                }
                item
            })
            .collect())
    }

    pub fn add_item(&self, mut item: NewCheckoutItem) -> Result<CheckoutItem, DomainError> {
        if item.total_price < BigDecimal::from(0) {
            return Err(DomainError::InvalidRequest(
                "total_price must not be negative".to_string(),
            ));
        }
        check_money("total_price", &item.total_price)?;
        item.quantity = coerce_quantity(item.quantity);
        self.repo.add_item(item)
    }

    pub fn clear_items(&self, user_id: Uuid) -> Result<usize, DomainError> {
        self.repo.delete_items(user_id)
    }
}
