use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::discount::{AppliedDiscount, CouponKind};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, OrderItemView, OrderStatus, OrderTotals, OrderView, PaymentStatus,
};
use crate::domain::ports::OrderRepository;
use crate::schema::{order_items, order_outbox, orders};

use super::checkout_repo::convert_user_checkout_in;
use super::discount_repo::redeem_in;
use super::models::{NewOrderItemRow, NewOrderRow, NewOutboxEventRow, OrderItemRow, OrderRow};

const AGGREGATE_TYPE: &str = "Order";

pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn to_view(order: OrderRow, items: Vec<OrderItemRow>) -> Result<OrderView, DomainError> {
    Ok(OrderView {
        id: order.id,
        user_id: order.user_id,
        address_id: order.address_id,
        totals: OrderTotals {
            subtotal: order.subtotal_amount,
            discount: order.discount_amount,
            shipping: order.shipping_amount,
            total: order.total_amount,
        },
        coupon_code: order.coupon_code,
        payment_method: order.payment_method,
        status: OrderStatus::from_str(&order.status)?,
        payment_status: PaymentStatus::from_str(&order.payment_status)?,
        gateway_order_id: order.gateway_order_id,
        payment_id: order.payment_id,
        created_at: order.created_at,
        items: items
            .into_iter()
            .map(|i| OrderItemView {
                id: i.id,
                product_id: i.product_id,
                variant_id: i.variant_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
            })
            .collect(),
    })
}

/// The tagged discount stored on the row, if the order carries one.
fn applied_discount(order: &OrderRow) -> Result<Option<AppliedDiscount>, DomainError> {
    match (&order.coupon_kind, order.coupon_id, &order.coupon_code) {
        (Some(kind), Some(coupon_id), Some(code)) => Ok(Some(AppliedDiscount {
            kind: CouponKind::from_str(kind)?,
            coupon_id,
            code: code.clone(),
        })),
        (None, None, None) => Ok(None),
        _ => Err(DomainError::Internal(format!(
            "order {} has a partial coupon reference",
            order.id
        ))),
    }
}

fn lock_order(conn: &mut PgConnection, id: Uuid) -> Result<OrderRow, DomainError> {
    orders::table
        .filter(orders::id.eq(id))
        .select(OrderRow::as_select())
        .for_update()
        .first(conn)
        .optional()?
        .ok_or_else(|| DomainError::NotFound("Order".to_string()))
}

fn load_view(conn: &mut PgConnection, order: OrderRow) -> Result<OrderView, DomainError> {
    let items = OrderItemRow::belonging_to(&order)
        .select(OrderItemRow::as_select())
        .order(order_items::created_at.asc())
        .load(conn)?;
    to_view(order, items)
}

// Debezium's EventRouter derives the topic from `aggregate_type`.
fn write_event(
    conn: &mut PgConnection,
    order_id: Uuid,
    event_type: &str,
    payload: Value,
) -> QueryResult<usize> {
    diesel::insert_into(order_outbox::table)
        .values(&NewOutboxEventRow {
            id: Uuid::new_v4(),
            aggregate_type: AGGREGATE_TYPE.to_string(),
            aggregate_id: order_id.to_string(),
            event_type: event_type.to_string(),
            payload,
        })
        .execute(conn)
}

impl OrderRepository for DieselOrderRepository {
    fn create(&self, order: NewOrder) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order_id = Uuid::new_v4();
            let row = diesel::insert_into(orders::table)
                .values(&NewOrderRow {
                    id: order_id,
                    user_id: order.user_id,
                    address_id: order.address_id,
                    subtotal_amount: order.totals.subtotal.clone(),
                    total_amount: order.totals.total.clone(),
                    discount_amount: order.totals.discount.clone(),
                    coupon_code: order.discount.as_ref().map(|d| d.code.clone()),
                    coupon_kind: order.discount.as_ref().map(|d| d.kind.as_str().to_string()),
                    coupon_id: order.discount.as_ref().map(|d| d.coupon_id),
                    shipping_amount: order.totals.shipping.clone(),
                    payment_method: order.payment_method.clone(),
                    status: OrderStatus::Confirmed.as_str().to_string(),
                    payment_status: PaymentStatus::Pending.as_str().to_string(),
                    gateway_order_id: order.gateway_order_id.clone(),
                })
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            let new_items: Vec<NewOrderItemRow> = order
                .items
                .iter()
                .map(|i| NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: i.product_id,
                    variant_id: i.variant_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price.clone(),
                })
                .collect();
            diesel::insert_into(order_items::table)
                .values(&new_items)
                .execute(conn)?;

            let item_payloads: Vec<Value> = order
                .items
                .iter()
                .map(|i| {
                    json!({
                        "product_id": i.product_id,
                        "variant_id": i.variant_id,
                        "quantity": i.quantity,
                        "unit_price": i.unit_price.to_string()
                    })
                })
                .collect();
            write_event(
                conn,
                order_id,
                "OrderCreated",
                json!({
                    "order_id": order_id,
                    "user_id": order.user_id,
                    "status": OrderStatus::Confirmed.as_str(),
                    "payment_status": PaymentStatus::Pending.as_str(),
                    "total_amount": order.totals.total.to_string(),
                    "coupon_code": order.discount.as_ref().map(|d| d.code.clone()),
                    "items": item_payloads
                }),
            )?;

            load_view(conn, row)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .filter(orders::id.eq(id))
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };
        load_view(&mut conn, order).map(Some)
    }

    fn list(
        &self,
        user_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1) * limit;
        conn.transaction::<_, DomainError, _>(|conn| {
            let mut count_query = orders::table.into_boxed();
            let mut page_query = orders::table.select(OrderRow::as_select()).into_boxed();
            if let Some(user_id) = user_id {
                count_query = count_query.filter(orders::user_id.eq(user_id));
                page_query = page_query.filter(orders::user_id.eq(user_id));
            }

            let total: i64 = count_query.count().get_result(conn)?;
            let rows: Vec<OrderRow> = page_query
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            let items: Vec<OrderItemRow> = OrderItemRow::belonging_to(&rows)
                .select(OrderItemRow::as_select())
                .order(order_items::created_at.asc())
                .load(conn)?;
            let grouped = items.grouped_by(&rows);

            Ok(ListResult {
                items: rows
                    .into_iter()
                    .zip(grouped)
                    .map(|(order, items)| to_view(order, items))
                    .collect::<Result<_, _>>()?,
                total,
            })
        })
    }

    fn update_status(&self, id: Uuid, target: OrderStatus) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, id)?;
            let current = OrderStatus::from_str(&order.status)?;
            let next = current.transition_to(target)?;

            let row = diesel::update(orders::table.filter(orders::id.eq(id)))
                .set((
                    orders::status.eq(next.as_str()),
                    orders::updated_at.eq(Utc::now()),
                ))
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            if next != current {
                write_event(
                    conn,
                    id,
                    "OrderStatusChanged",
                    json!({
                        "order_id": id,
                        "user_id": order.user_id,
                        "from": current.as_str(),
                        "to": next.as_str()
                    }),
                )?;
            }
            load_view(conn, row)
        })
    }

    fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, id)?;
            // order_items go with it (ON DELETE CASCADE).
            diesel::delete(orders::table.filter(orders::id.eq(id))).execute(conn)?;
            write_event(
                conn,
                id,
                "OrderDeleted",
                json!({ "order_id": id, "user_id": order.user_id }),
            )?;
            Ok(())
        })
    }

    fn settle_payment(
        &self,
        id: Uuid,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, id)?;
            if PaymentStatus::from_str(&order.payment_status)? == PaymentStatus::Paid {
                return load_view(conn, order);
            }

            if let Some(discount) = applied_discount(&order)? {
                redeem_in(conn, &discount, order.user_id, now)?;
            }

            let row = diesel::update(orders::table.filter(orders::id.eq(id)))
                .set((
                    orders::payment_status.eq(PaymentStatus::Paid.as_str()),
                    orders::payment_id.eq(payment_id),
                    orders::updated_at.eq(now),
                ))
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            convert_user_checkout_in(conn, order.user_id)?;

            write_event(
                conn,
                id,
                "OrderPaid",
                json!({
                    "order_id": id,
                    "user_id": order.user_id,
                    "payment_id": payment_id,
                    "total_amount": order.total_amount.to_string(),
                    "coupon_code": order.coupon_code
                }),
            )?;
            load_view(conn, row)
        })
    }

    fn fail_payment(&self, id: Uuid, payment_id: Option<&str>) -> Result<OrderView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let order = lock_order(conn, id)?;
            // A late forged callback must not un-pay a settled order.
            if PaymentStatus::from_str(&order.payment_status)? == PaymentStatus::Paid {
                return load_view(conn, order);
            }

            let row = diesel::update(orders::table.filter(orders::id.eq(id)))
                .set((
                    orders::payment_status.eq(PaymentStatus::Failed.as_str()),
                    orders::payment_id.eq(payment_id.or(order.payment_id.as_deref())),
                    orders::updated_at.eq(Utc::now()),
                ))
                .returning(OrderRow::as_returning())
                .get_result(conn)?;

            write_event(
                conn,
                id,
                "OrderPaymentFailed",
                json!({
                    "order_id": id,
                    "user_id": order.user_id,
                    "payment_id": payment_id
                }),
            )?;
            load_view(conn, row)
        })
    }
}
