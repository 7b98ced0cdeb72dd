use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::codes::{generate_unique_code, REFERRAL_CODE_PREFIX, REWARD_COUPON_PREFIX};
use crate::domain::discount::IndividualCoupon;
use crate::domain::errors::DomainError;
use crate::domain::ports::ReferralRepository;
use crate::domain::referral::{Referral, ReferralStatus, RewardTerms};
use crate::schema::{individual_coupons, referrals};

use super::discount_repo::to_individual;
use super::is_unique_violation;
use super::models::{IndividualCouponRow, NewIndividualCouponRow, NewReferralRow, ReferralRow};

const INSERT_ATTEMPTS: usize = 3;

pub struct DieselReferralRepository {
    pool: DbPool,
}

impl DieselReferralRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_referral(row: ReferralRow) -> Result<Referral, DomainError> {
    Ok(Referral {
        id: row.id,
        user_id: row.user_id,
        referral_code: row.referral_code,
        referrer_id: row.referrer_id,
        status: ReferralStatus::from_str(&row.status)?,
    })
}

impl ReferralRepository for DieselReferralRepository {
    fn find_by_user(&self, user_id: Uuid) -> Result<Option<Referral>, DomainError> {
        let mut conn = self.pool.get()?;
        referrals::table
            .filter(referrals::user_id.eq(user_id))
            .select(ReferralRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(to_referral)
            .transpose()
    }

    fn find_by_code(&self, referral_code: &str) -> Result<Option<Referral>, DomainError> {
        let mut conn = self.pool.get()?;
        referrals::table
            .filter(referrals::referral_code.eq(referral_code))
            .select(ReferralRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(to_referral)
            .transpose()
    }

    /// Idempotent per user: a concurrent registration that already stored a
    /// row for `user_id` wins and its row is returned.
    fn create(&self, user_id: Uuid, referrer_id: Option<Uuid>) -> Result<Referral, DomainError> {
        let mut conn = self.pool.get()?;

        for _ in 0..INSERT_ATTEMPTS {
            let referral_code = generate_unique_code(REFERRAL_CODE_PREFIX, |candidate| {
                let taken = diesel::select(diesel::dsl::exists(
                    referrals::table.filter(referrals::referral_code.eq(candidate)),
                ))
                .get_result::<bool>(&mut conn)?;
                Ok(taken)
            })?;

            let inserted = diesel::insert_into(referrals::table)
                .values(&NewReferralRow {
                    id: Uuid::new_v4(),
                    user_id,
                    referral_code,
                    referrer_id,
                    status: ReferralStatus::Pending.as_str().to_string(),
                })
                .on_conflict(referrals::user_id)
                .do_nothing()
                .returning(ReferralRow::as_returning())
                .get_result(&mut conn)
                .optional();

            match inserted {
                Ok(Some(row)) => return to_referral(row),
                Ok(None) => {
                    let winner = referrals::table
                        .filter(referrals::user_id.eq(user_id))
                        .select(ReferralRow::as_select())
                        .first(&mut conn)?;
                    return to_referral(winner);
                }
                // The code was claimed between the check and the insert.
                Err(e) if is_unique_violation(&e) => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Err(DomainError::Internal(format!(
            "could not store a referral for user {user_id} after {INSERT_ATTEMPTS} attempts"
        )))
    }

    fn complete(
        &self,
        user_id: Uuid,
        terms: &RewardTerms,
        now: DateTime<Utc>,
    ) -> Result<Option<IndividualCoupon>, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Row lock: two verification callbacks must not both mint.
            let row = referrals::table
                .filter(referrals::user_id.eq(user_id))
                .select(ReferralRow::as_select())
                .for_update()
                .first(conn)
                .optional()?;
            let Some(referral) = row.map(to_referral).transpose()? else {
                return Ok(None);
            };
            let Some(referrer_id) = referral.referrer_id.filter(|_| referral.is_rewardable())
            else {
                return Ok(None);
            };

            diesel::update(referrals::table.filter(referrals::id.eq(referral.id)))
                .set((
                    referrals::status.eq(ReferralStatus::Completed.as_str()),
                    referrals::updated_at.eq(now),
                ))
                .execute(conn)?;

            let code = generate_unique_code(REWARD_COUPON_PREFIX, |candidate| {
                let taken = diesel::select(diesel::dsl::exists(
                    individual_coupons::table.filter(individual_coupons::code.eq(candidate)),
                ))
                .get_result::<bool>(conn)?;
                Ok(taken)
            })?;

            let coupon = diesel::insert_into(individual_coupons::table)
                .values(&NewIndividualCouponRow {
                    id: Uuid::new_v4(),
                    code,
                    user_id: referrer_id,
                    referral_id: referral.id,
                    amount: terms.amount.clone(),
                    is_used: false,
                    expiry_date: terms.expiry_from(now),
                })
                .returning(IndividualCouponRow::as_returning())
                .get_result(conn)?;
            Ok(Some(to_individual(coupon)))
        })
    }
}
