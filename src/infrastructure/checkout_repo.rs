use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::checkout::{CheckoutItem, CheckoutSession, NewCheckoutItem, SessionStatus};
use crate::domain::errors::DomainError;
use crate::domain::ports::CheckoutRepository;
use crate::schema::{checkout_items, checkout_sessions};

use super::is_unique_violation;
use super::models::{CheckoutItemRow, CheckoutSessionRow, NewCheckoutItemRow, NewCheckoutSessionRow};

pub struct DieselCheckoutRepository {
    pool: DbPool,
}

impl DieselCheckoutRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_session(row: CheckoutSessionRow) -> Result<CheckoutSession, DomainError> {
    Ok(CheckoutSession {
        id: row.id,
        user_id: row.user_id,
        status: SessionStatus::from_str(&row.status)?,
        expires_at: row.expires_at,
    })
}

fn to_item(row: CheckoutItemRow) -> CheckoutItem {
    CheckoutItem {
        id: row.id,
        checkout_session_id: row.checkout_session_id,
        user_id: row.user_id,
        product_id: row.product_id,
        variant_id: row.variant_id,
        quantity: row.quantity,
        total_price: row.total_price,
        created_at: row.created_at,
    }
}

fn active_session(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> QueryResult<Option<CheckoutSessionRow>> {
    checkout_sessions::table
        .filter(checkout_sessions::user_id.eq(user_id))
        .filter(checkout_sessions::status.eq(SessionStatus::Active.as_str()))
        .select(CheckoutSessionRow::as_select())
        .first(conn)
        .optional()
}

fn purge_expired_in(
    conn: &mut PgConnection,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> QueryResult<usize> {
    diesel::delete(
        checkout_sessions::table
            .filter(checkout_sessions::user_id.eq(user_id))
            .filter(checkout_sessions::expires_at.lt(now)),
    )
    .execute(conn)
}

/// Drops the user's line items and converts their active session. Runs on
/// the caller's connection so it can join a wider transaction.
pub(crate) fn convert_user_checkout_in(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> QueryResult<()> {
    diesel::delete(checkout_items::table.filter(checkout_items::user_id.eq(user_id)))
        .execute(conn)?;
    diesel::update(
        checkout_sessions::table
            .filter(checkout_sessions::user_id.eq(user_id))
            .filter(checkout_sessions::status.eq(SessionStatus::Active.as_str())),
    )
    .set(checkout_sessions::status.eq(SessionStatus::Converted.as_str()))
    .execute(conn)?;
    Ok(())
}

impl CheckoutRepository for DieselCheckoutRepository {
    fn purge_expired_sessions(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        Ok(purge_expired_in(&mut conn, user_id, now)?)
    }

    fn find_active_session(&self, user_id: Uuid) -> Result<Option<CheckoutSession>, DomainError> {
        let mut conn = self.pool.get()?;
        active_session(&mut conn, user_id)?
            .map(to_session)
            .transpose()
    }

    fn create_or_reuse_session(
        &self,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<CheckoutSession, DomainError> {
        let mut conn = self.pool.get()?;
        if let Some(existing) = active_session(&mut conn, user_id)? {
            return to_session(existing);
        }

        let inserted = diesel::insert_into(checkout_sessions::table)
            .values(&NewCheckoutSessionRow {
                id: Uuid::new_v4(),
                user_id,
                status: SessionStatus::Active.as_str().to_string(),
                expires_at,
            })
            .returning(CheckoutSessionRow::as_returning())
            .get_result(&mut conn);

        match inserted {
            Ok(row) => to_session(row),
            // A concurrent create won the partial unique index; hand back its row.
            Err(e) if is_unique_violation(&e) => {
                let winner = active_session(&mut conn, user_id)?.ok_or_else(|| {
                    DomainError::Internal(format!(
                        "active checkout session for user {user_id} vanished after conflict"
                    ))
                })?;
                to_session(winner)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Abandons the checkout: every session and every line item of the user,
    /// including items that never had a session. Returns the session count.
    fn delete_sessions(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            diesel::delete(checkout_items::table.filter(checkout_items::user_id.eq(user_id)))
                .execute(conn)?;
            let removed = diesel::delete(
                checkout_sessions::table.filter(checkout_sessions::user_id.eq(user_id)),
            )
            .execute(conn)?;
            Ok(removed)
        })
    }

    fn complete_session(&self, session_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let session = checkout_sessions::table
                .filter(checkout_sessions::id.eq(session_id))
                .select(CheckoutSessionRow::as_select())
                .for_update()
                .first(conn)
                .optional()?
                .ok_or_else(|| DomainError::NotFound("Checkout session".to_string()))?;

            diesel::update(checkout_sessions::table.filter(checkout_sessions::id.eq(session.id)))
                .set(checkout_sessions::status.eq(SessionStatus::Converted.as_str()))
                .execute(conn)?;
            diesel::delete(checkout_items::table.filter(checkout_items::user_id.eq(session.user_id)))
                .execute(conn)?;
            Ok(())
        })
    }

    fn purge_items_created_before(
        &self,
        user_id: Uuid,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        let removed = diesel::delete(
            checkout_items::table
                .filter(checkout_items::user_id.eq(user_id))
                .filter(checkout_items::created_at.lt(cutoff)),
        )
        .execute(&mut conn)?;
        Ok(removed)
    }

    fn list_items(&self, user_id: Uuid) -> Result<Vec<CheckoutItem>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = checkout_items::table
            .filter(checkout_items::user_id.eq(user_id))
            .order(checkout_items::created_at.asc())
            .select(CheckoutItemRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(to_item).collect())
    }

    fn add_item(&self, item: NewCheckoutItem) -> Result<CheckoutItem, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            // Items attach to the live reservation when there is one. A lapsed
            // session goes first so nothing is bound to it.
            purge_expired_in(conn, item.user_id, Utc::now())?;
            let session_id = active_session(conn, item.user_id)?.map(|s| s.id);
            let row = diesel::insert_into(checkout_items::table)
                .values(&NewCheckoutItemRow {
                    id: Uuid::new_v4(),
                    checkout_session_id: session_id,
                    user_id: item.user_id,
                    product_id: item.product_id,
                    variant_id: item.variant_id,
                    quantity: item.quantity,
                    total_price: item.total_price,
                })
                .returning(CheckoutItemRow::as_returning())
                .get_result(conn)?;
            Ok(to_item(row))
        })
    }

    fn delete_items(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut conn = self.pool.get()?;
        let removed =
            diesel::delete(checkout_items::table.filter(checkout_items::user_id.eq(user_id)))
                .execute(&mut conn)?;
        Ok(removed)
    }
}
