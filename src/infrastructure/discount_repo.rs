use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::discount::{
    AppliedDiscount, CouponKind, DiscountValue, IndividualCoupon, SpecialCoupon,
};
use crate::domain::errors::DomainError;
use crate::domain::ports::DiscountRepository;
use crate::schema::{individual_coupons, special_coupon_usages, special_coupons};

use super::is_unique_violation;
use super::models::{IndividualCouponRow, NewSpecialCouponUsageRow, SpecialCouponRow};

pub struct DieselDiscountRepository {
    pool: DbPool,
}

impl DieselDiscountRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn to_individual(row: IndividualCouponRow) -> IndividualCoupon {
    IndividualCoupon {
        id: row.id,
        code: row.code,
        user_id: row.user_id,
        referral_id: row.referral_id,
        amount: row.amount,
        is_used: row.is_used,
        expiry_date: row.expiry_date,
    }
}

fn to_special(row: SpecialCouponRow) -> Result<SpecialCoupon, DomainError> {
    Ok(SpecialCoupon {
        id: row.id,
        code: row.code,
        value: DiscountValue::from_columns(row.amount, row.percentage)?,
        usage_limit: row.usage_limit,
        min_order_amount: row.min_order_amount,
        expiry_date: row.expiry_date,
    })
}

/// Consumes `discount` for `user_id` on the caller's connection. Must run
/// inside a transaction: a special redemption takes a row lock and spans
/// two writes.
pub(crate) fn redeem_in(
    conn: &mut PgConnection,
    discount: &AppliedDiscount,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), DomainError> {
    match discount.kind {
        CouponKind::Individual => {
            // Expiry is enforced at write time: a reward that lapsed after the
            // order was placed fails closed and the settlement rolls back.
            let updated = diesel::update(
                individual_coupons::table
                    .filter(individual_coupons::code.eq(&discount.code))
                    .filter(individual_coupons::user_id.eq(user_id))
                    .filter(individual_coupons::is_used.eq(false))
                    .filter(individual_coupons::expiry_date.ge(now)),
            )
            .set(individual_coupons::is_used.eq(true))
            .execute(conn)?;
            if updated == 0 {
                return Err(DomainError::NotFoundOrUnauthorized);
            }
        }
        CouponKind::Special => {
            // Expiry was settled by validation at order time; only the
            // remaining limit and per-user use are re-checked under the lock.
            let coupon = special_coupons::table
                .filter(special_coupons::id.eq(discount.coupon_id))
                .select(SpecialCouponRow::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or(DomainError::InvalidCode)?;
            if coupon.usage_limit <= 0 {
                return Err(DomainError::LimitReached);
            }

            diesel::insert_into(special_coupon_usages::table)
                .values(&NewSpecialCouponUsageRow {
                    user_id,
                    coupon_id: coupon.id,
                })
                .execute(conn)
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        DomainError::AlreadyUsed
                    } else {
                        e.into()
                    }
                })?;

            let decremented = diesel::update(
                special_coupons::table
                    .filter(special_coupons::id.eq(coupon.id))
                    .filter(special_coupons::usage_limit.gt(0)),
            )
            .set(special_coupons::usage_limit.eq(special_coupons::usage_limit - 1))
            .execute(conn)?;
            if decremented == 0 {
                return Err(DomainError::LimitReached);
            }
        }
    }
    Ok(())
}

impl DiscountRepository for DieselDiscountRepository {
    fn find_individual(
        &self,
        code: &str,
        user_id: Uuid,
    ) -> Result<Option<IndividualCoupon>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = individual_coupons::table
            .filter(individual_coupons::code.eq(code))
            .filter(individual_coupons::user_id.eq(user_id))
            .select(IndividualCouponRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(to_individual))
    }

    fn find_special(&self, code: &str) -> Result<Option<SpecialCoupon>, DomainError> {
        let mut conn = self.pool.get()?;
        special_coupons::table
            .filter(special_coupons::code.eq(code))
            .select(SpecialCouponRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(to_special)
            .transpose()
    }

    fn special_usage_exists(&self, user_id: Uuid, coupon_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let used = diesel::select(diesel::dsl::exists(
            special_coupon_usages::table
                .filter(special_coupon_usages::user_id.eq(user_id))
                .filter(special_coupon_usages::coupon_id.eq(coupon_id)),
        ))
        .get_result(&mut conn)?;
        Ok(used)
    }

    fn redeem(
        &self,
        discount: &AppliedDiscount,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        conn.transaction::<_, DomainError, _>(|conn| redeem_in(conn, discount, user_id, now))
    }
}
