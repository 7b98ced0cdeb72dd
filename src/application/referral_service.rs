use chrono::Utc;
use uuid::Uuid;

use crate::domain::discount::IndividualCoupon;
use crate::domain::errors::DomainError;
use crate::domain::ports::ReferralRepository;
use crate::domain::referral::{Referral, RewardTerms};

pub struct ReferralService<R> {
    repo: R,
    reward: RewardTerms,
}

impl<R: ReferralRepository> ReferralService<R> {
    pub fn new(repo: R, reward: RewardTerms) -> Self {
        Self { repo, reward }
    }

    /// Records the referral row for a freshly signed-up user. Registering
    /// the same user again returns the existing row.
    pub fn register(
        &self,
        user_id: Uuid,
        referrer_code: Option<&str>,
    ) -> Result<Referral, DomainError> {
        if let Some(existing) = self.repo.find_by_user(user_id)? {
            return Ok(existing);
        }

        let referrer_id = match referrer_code.map(str::trim).filter(|c| !c.is_empty()) {
            Some(code) => {
                let referrer = self
                    .repo
                    .find_by_code(&code.to_ascii_uppercase())?
                    .ok_or(DomainError::InvalidCode)?;
                if referrer.user_id == user_id {
                    return Err(DomainError::InvalidRequest(
                        "users cannot refer themselves".to_string(),
                    ));
                }
                Some(referrer.user_id)
            }
            None => None,
        };

        let referral = self.repo.create(user_id, referrer_id)?;
        log::info!(
            "referral {} registered for user {} (referrer: {:?})",
            referral.referral_code,
            user_id,
            referrer_id
        );
        Ok(referral)
    }

    pub fn get(&self, user_id: Uuid) -> Result<Referral, DomainError> {
        self.repo
            .find_by_user(user_id)?
            .ok_or_else(|| DomainError::NotFound("Referral".to_string()))
    }

    /// Identity-verification hook. Mints the referrer's reward the first
    /// time it runs for a rewardable referral and is a no-op afterwards.
    pub fn complete(&self, user_id: Uuid) -> Result<Option<IndividualCoupon>, DomainError> {
        let minted = self.repo.complete(user_id, &self.reward, Utc::now())?;
        match &minted {
            Some(coupon) => log::info!(
                "referral of user {} completed, coupon {} minted for {}",
                user_id,
                coupon.code,
                coupon.user_id
            ),
            None => log::debug!("no rewardable referral for user {}", user_id),
        }
        Ok(minted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::codes::{random_code, REFERRAL_CODE_PREFIX, REWARD_COUPON_PREFIX};
    use crate::domain::referral::ReferralStatus;
    use bigdecimal::BigDecimal;
    use chrono::{DateTime, Duration};
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryReferrals {
        rows: Mutex<Vec<Referral>>,
        coupons: Mutex<Vec<IndividualCoupon>>,
    }

    impl ReferralRepository for InMemoryReferrals {
        fn find_by_user(&self, user_id: Uuid) -> Result<Option<Referral>, DomainError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.user_id == user_id)
                .cloned())
        }

        fn find_by_code(&self, referral_code: &str) -> Result<Option<Referral>, DomainError> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.referral_code == referral_code)
                .cloned())
        }

        fn create(&self, user_id: Uuid, referrer_id: Option<Uuid>) -> Result<Referral, DomainError> {
            let referral = Referral {
                id: Uuid::new_v4(),
                user_id,
                referral_code: random_code(REFERRAL_CODE_PREFIX, 8),
                referrer_id,
                status: ReferralStatus::Pending,
            };
            self.rows.lock().unwrap().push(referral.clone());
            Ok(referral)
        }

        fn complete(
            &self,
            user_id: Uuid,
            terms: &RewardTerms,
            now: DateTime<Utc>,
        ) -> Result<Option<IndividualCoupon>, DomainError> {
            let mut rows = self.rows.lock().unwrap();
            let Some(referral) = rows.iter_mut().find(|r| r.user_id == user_id) else {
                return Ok(None);
            };
            let Some(referrer_id) = referral.referrer_id.filter(|_| referral.is_rewardable())
            else {
                return Ok(None);
            };
            referral.status = ReferralStatus::Completed;
            let coupon = IndividualCoupon {
                id: Uuid::new_v4(),
                code: random_code(REWARD_COUPON_PREFIX, 8),
                user_id: referrer_id,
                referral_id: referral.id,
                amount: terms.amount.clone(),
                is_used: false,
                expiry_date: terms.expiry_from(now),
            };
            self.coupons.lock().unwrap().push(coupon.clone());
            Ok(Some(coupon))
        }
    }

    fn service() -> ReferralService<InMemoryReferrals> {
        ReferralService::new(
            InMemoryReferrals::default(),
            RewardTerms {
                amount: BigDecimal::from(100),
                valid_for: Duration::days(30),
            },
        )
    }

    #[test]
    fn referral_completion_mints_one_coupon_for_referrer() {
        let svc = service();
        let referrer = Uuid::new_v4();
        let referred = Uuid::new_v4();
        let referrer_row = svc.register(referrer, None).unwrap();

        let pending = svc
            .register(referred, Some(&referrer_row.referral_code.to_lowercase()))
            .unwrap();
        assert_eq!(pending.status, ReferralStatus::Pending);
        assert_eq!(pending.referrer_id, Some(referrer));

        let coupon = svc.complete(referred).unwrap().expect("coupon minted");
        assert_eq!(coupon.user_id, referrer);
        assert_eq!(coupon.amount, BigDecimal::from(100));
        let validity = coupon.expiry_date - Utc::now();
        assert!(validity > Duration::days(29) && validity <= Duration::days(30));

        assert!(svc.complete(referred).unwrap().is_none());
        assert_eq!(svc.repo.coupons.lock().unwrap().len(), 1);
        assert_eq!(svc.get(referred).unwrap().status, ReferralStatus::Completed);
    }

    #[test]
    fn completion_without_referrer_is_a_no_op() {
        let svc = service();
        let user = Uuid::new_v4();
        svc.register(user, None).unwrap();
        assert!(svc.complete(user).unwrap().is_none());
        assert_eq!(svc.get(user).unwrap().status, ReferralStatus::Pending);
    }

    #[test]
    fn unknown_referrer_code_is_rejected() {
        let svc = service();
        assert!(matches!(
            svc.register(Uuid::new_v4(), Some("REFNOSUCH")),
            Err(DomainError::InvalidCode)
        ));
    }

    #[test]
    fn registering_twice_returns_existing_row() {
        let svc = service();
        let user = Uuid::new_v4();
        let first = svc.register(user, None).unwrap();
        let second = svc.register(user, None).unwrap();
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn missing_referral_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.get(Uuid::new_v4()),
            Err(DomainError::NotFound(_))
        ));
    }
}
