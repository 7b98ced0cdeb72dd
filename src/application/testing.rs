//! In-memory port implementations for service-level tests.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::discount::{AppliedDiscount, CouponKind, IndividualCoupon, SpecialCoupon};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, NewOrder, OrderItemView, OrderStatus, OrderView, PaymentStatus,
};
use crate::domain::ports::{DiscountRepository, OrderRepository};

#[derive(Clone, Default)]
pub struct InMemoryLedger {
    pub individual: Arc<Mutex<Vec<IndividualCoupon>>>,
    pub special: Arc<Mutex<Vec<SpecialCoupon>>>,
    pub usages: Arc<Mutex<Vec<(Uuid, Uuid)>>>,
}

impl DiscountRepository for InMemoryLedger {
    fn find_individual(
        &self,
        code: &str,
        user_id: Uuid,
    ) -> Result<Option<IndividualCoupon>, DomainError> {
        Ok(self
            .individual
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.code == code && c.user_id == user_id)
            .cloned())
    }

    fn find_special(&self, code: &str) -> Result<Option<SpecialCoupon>, DomainError> {
        Ok(self
            .special
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.code == code)
            .cloned())
    }

    fn special_usage_exists(&self, user_id: Uuid, coupon_id: Uuid) -> Result<bool, DomainError> {
        Ok(self.usages.lock().unwrap().contains(&(user_id, coupon_id)))
    }

    fn redeem(
        &self,
        discount: &AppliedDiscount,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        match discount.kind {
            CouponKind::Individual => {
                let mut coupons = self.individual.lock().unwrap();
                let coupon = coupons
                    .iter_mut()
                    .find(|c| {
                        c.id == discount.coupon_id
                            && c.user_id == user_id
                            && !c.is_used
                            && c.expiry_date >= now
                    })
                    .ok_or(DomainError::NotFoundOrUnauthorized)?;
                coupon.is_used = true;
            }
            CouponKind::Special => {
                let mut usages = self.usages.lock().unwrap();
                if usages.contains(&(user_id, discount.coupon_id)) {
                    return Err(DomainError::AlreadyUsed);
                }
                let mut coupons = self.special.lock().unwrap();
                let coupon = coupons
                    .iter_mut()
                    .find(|c| c.id == discount.coupon_id)
                    .ok_or(DomainError::InvalidCode)?;
                if coupon.usage_limit <= 0 {
                    return Err(DomainError::LimitReached);
                }
                coupon.usage_limit -= 1;
                usages.push((user_id, discount.coupon_id));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct InMemoryOrders {
    pub orders: Arc<Mutex<Vec<(OrderView, Option<AppliedDiscount>)>>>,
    pub ledger: InMemoryLedger,
}

impl InMemoryOrders {
    pub fn with_ledger(ledger: InMemoryLedger) -> Self {
        Self {
            orders: Arc::default(),
            ledger,
        }
    }

    pub fn snapshot(&self, id: Uuid) -> Option<OrderView> {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .find(|(o, _)| o.id == id)
            .map(|(o, _)| o.clone())
    }
}

impl OrderRepository for InMemoryOrders {
    fn create(&self, order: NewOrder) -> Result<OrderView, DomainError> {
        let view = OrderView {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            address_id: order.address_id,
            totals: order.totals,
            coupon_code: order.discount.as_ref().map(|d| d.code.clone()),
            payment_method: order.payment_method,
            status: OrderStatus::Confirmed,
            payment_status: PaymentStatus::Pending,
            gateway_order_id: order.gateway_order_id,
            payment_id: None,
            created_at: Utc::now(),
            items: order
                .items
                .into_iter()
                .map(|i| OrderItemView {
                    id: Uuid::new_v4(),
                    product_id: i.product_id,
                    variant_id: i.variant_id,
                    quantity: i.quantity,
                    unit_price: i.unit_price,
                })
                .collect(),
        };
        self.orders
            .lock()
            .unwrap()
            .push((view.clone(), order.discount));
        Ok(view)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        Ok(self.snapshot(id))
    }

    fn list(
        &self,
        user_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        let orders = self.orders.lock().unwrap();
        let matching: Vec<OrderView> = orders
            .iter()
            .filter(|(o, _)| user_id.map_or(true, |u| o.user_id == u))
            .map(|(o, _)| o.clone())
            .collect();
        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ListResult { items, total })
    }

    fn update_status(&self, id: Uuid, target: OrderStatus) -> Result<OrderView, DomainError> {
        let mut orders = self.orders.lock().unwrap();
        let (order, _) = orders
            .iter_mut()
            .find(|(o, _)| o.id == id)
            .ok_or_else(|| DomainError::NotFound("Order".to_string()))?;
        order.status = order.status.transition_to(target)?;
        Ok(order.clone())
    }

    fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let mut orders = self.orders.lock().unwrap();
        let before = orders.len();
        orders.retain(|(o, _)| o.id != id);
        if orders.len() == before {
            return Err(DomainError::NotFound("Order".to_string()));
        }
        Ok(())
    }

    fn settle_payment(
        &self,
        id: Uuid,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<OrderView, DomainError> {
        let mut orders = self.orders.lock().unwrap();
        let (order, discount) = orders
            .iter_mut()
            .find(|(o, _)| o.id == id)
            .ok_or_else(|| DomainError::NotFound("Order".to_string()))?;
        if order.payment_status == PaymentStatus::Paid {
            return Ok(order.clone());
        }
        if let Some(discount) = discount {
            self.ledger.redeem(discount, order.user_id, now)?;
        }
        order.payment_status = PaymentStatus::Paid;
        order.payment_id = Some(payment_id.to_string());
        Ok(order.clone())
    }

    fn fail_payment(&self, id: Uuid, payment_id: Option<&str>) -> Result<OrderView, DomainError> {
        let mut orders = self.orders.lock().unwrap();
        let (order, _) = orders
            .iter_mut()
            .find(|(o, _)| o.id == id)
            .ok_or_else(|| DomainError::NotFound("Order".to_string()))?;
        if order.payment_status == PaymentStatus::Paid {
            return Ok(order.clone());
        }
        order.payment_status = PaymentStatus::Failed;
        if let Some(payment_id) = payment_id {
            order.payment_id = Some(payment_id.to_string());
        }
        Ok(order.clone())
    }
}
