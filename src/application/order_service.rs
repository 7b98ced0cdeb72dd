use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    check_money, subtotal, validate_items, ListResult, NewOrder, OrderItemInput, OrderStatus,
    OrderTotals, OrderView,
};
use crate::domain::ports::{DiscountRepository, OrderRepository};

use super::discount_service::DiscountService;

/// Buyer-submitted checkout, before totals and discount are resolved.
#[derive(Debug, Clone)]
pub struct CheckoutSubmission {
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub payment_method: String,
    pub gateway_order_id: Option<String>,
    pub shipping: BigDecimal,
    pub coupon_code: Option<String>,
    pub items: Vec<OrderItemInput>,
}

/// Verified outcome handed over by a payment gateway adapter.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    pub verified: bool,
    pub payment_id: String,
}

pub struct OrderService<R, D> {
    repo: R,
    ledger: DiscountService<D>,
}

impl<R: OrderRepository, D: DiscountRepository> OrderService<R, D> {
    pub fn new(repo: R, ledger: DiscountService<D>) -> Self {
        Self { repo, ledger }
    }

    /// Creates a `confirmed/pending` order. The coupon, if any, is validated
    /// here but only redeemed once payment settles.
    pub fn submit(&self, submission: CheckoutSubmission) -> Result<OrderView, DomainError> {
        validate_items(&submission.items)?;
        if submission.payment_method.trim().is_empty() {
            return Err(DomainError::InvalidRequest(
                "payment_method is required".to_string(),
            ));
        }
        if submission.shipping < BigDecimal::from(0) {
            return Err(DomainError::InvalidRequest(
                "shipping amount must not be negative".to_string(),
            ));
        }
        check_money("shipping_amount", &submission.shipping)?;

        let subtotal = subtotal(&submission.items);
        check_money("subtotal", &subtotal)?;
        let discount = match submission.coupon_code.as_deref() {
            Some(code) if !code.trim().is_empty() => {
                Some(self.ledger.validate(code, submission.user_id, &subtotal)?)
            }
            _ => None,
        };
        let discount_amount = discount
            .as_ref()
            .map(|d| d.value().amount_off(&subtotal))
            .unwrap_or_else(|| BigDecimal::from(0));
        let totals = OrderTotals::compute(subtotal, discount_amount, submission.shipping);
        check_money("total", &totals.total)?;

        let order = self.repo.create(NewOrder {
            user_id: submission.user_id,
            address_id: submission.address_id,
            payment_method: submission.payment_method.trim().to_string(),
            gateway_order_id: submission.gateway_order_id,
            totals,
            discount: discount.map(|d| d.applied()),
            items: submission.items,
        })?;
        log::info!(
            "order {} created for user {} (total {})",
            order.id,
            order.user_id,
            order.totals.total
        );
        Ok(order)
    }

    pub fn get(&self, id: Uuid) -> Result<OrderView, DomainError> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| DomainError::NotFound("Order".to_string()))
    }

    pub fn list(
        &self,
        user_id: Option<Uuid>,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        self.repo.list(user_id, page.max(1), limit.clamp(1, 100))
    }

    pub fn update_status(&self, id: Uuid, requested: &str) -> Result<OrderView, DomainError> {
        let target = OrderStatus::from_str(requested)?;
        match self.repo.update_status(id, target) {
            Ok(order) => {
                log::info!("order {} status is now {}", id, order.status);
                Ok(order)
            }
            Err(e @ DomainError::IllegalTransition { .. }) => {
                log::warn!("order {}: {}", id, e);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Admin correction only; buyers cancel through `update_status`.
    pub fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        self.repo.delete(id)?;
        log::info!("order {} deleted", id);
        Ok(())
    }

    /// Applies a gateway verdict. A failed verification is terminal for this
    /// attempt: the order is flagged and left `confirmed` for a human or a
    /// fresh client attempt.
    pub fn reconcile_payment(
        &self,
        id: Uuid,
        outcome: PaymentOutcome,
    ) -> Result<OrderView, DomainError> {
        if outcome.verified {
            let order = self.repo.settle_payment(id, &outcome.payment_id, Utc::now())?;
            log::info!("order {} paid ({})", id, outcome.payment_id);
            return Ok(order);
        }

        let payment_id = Some(outcome.payment_id.as_str()).filter(|p| !p.is_empty());
        self.repo.fail_payment(id, payment_id)?;
        log::warn!("payment verification failed for order {}", id);
        Err(DomainError::PaymentVerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{InMemoryLedger, InMemoryOrders};
    use crate::domain::discount::{DiscountValue, SpecialCoupon};
    use crate::domain::order::PaymentStatus;
    use chrono::Duration;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn service_with_coupon(
        value: DiscountValue,
        limit: i32,
    ) -> (OrderService<InMemoryOrders, InMemoryLedger>, InMemoryOrders) {
        let ledger = InMemoryLedger::default();
        ledger.special.lock().unwrap().push(SpecialCoupon {
            id: Uuid::new_v4(),
            code: "SAVE10".to_string(),
            value,
            usage_limit: limit,
            min_order_amount: dec("0"),
            expiry_date: Utc::now() + Duration::days(1),
        });
        let orders = InMemoryOrders::with_ledger(ledger.clone());
        (
            OrderService::new(orders.clone(), DiscountService::new(ledger)),
            orders,
        )
    }

    fn submission(user_id: Uuid, coupon: Option<&str>) -> CheckoutSubmission {
        CheckoutSubmission {
            user_id,
            address_id: Uuid::new_v4(),
            payment_method: "razorpay".to_string(),
            gateway_order_id: Some("order_G1".to_string()),
            shipping: dec("40"),
            coupon_code: coupon.map(str::to_string),
            items: vec![
                OrderItemInput {
                    product_id: Uuid::new_v4(),
                    variant_id: None,
                    quantity: 2,
                    unit_price: dec("100"),
                },
                OrderItemInput {
                    product_id: Uuid::new_v4(),
                    variant_id: Some(Uuid::new_v4()),
                    quantity: 1,
                    unit_price: dec("50"),
                },
            ],
        }
    }

    #[test]
    fn submit_applies_percentage_discount_and_shipping() {
        let (svc, _) = service_with_coupon(DiscountValue::Percentage(dec("10")), 5);
        let order = svc
            .submit(submission(Uuid::new_v4(), Some("save10")))
            .unwrap();
        assert_eq!(order.totals.subtotal, dec("250"));
        assert_eq!(order.totals.discount, dec("25"));
        assert_eq!(order.totals.total, dec("265"));
        assert_eq!(order.coupon_code.as_deref(), Some("SAVE10"));
        assert_eq!(order.status, OrderStatus::Confirmed);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.items.len(), 2);
    }

    #[test]
    fn submit_rejects_amounts_with_sub_cent_precision() {
        let (svc, orders) = service_with_coupon(DiscountValue::Fixed(dec("10")), 5);
        let mut bad = submission(Uuid::new_v4(), None);
        bad.items[0].unit_price = dec("9.999");
        assert!(matches!(svc.submit(bad), Err(DomainError::InvalidRequest(_))));

        let mut bad = submission(Uuid::new_v4(), None);
        bad.shipping = dec("0.005");
        assert!(matches!(svc.submit(bad), Err(DomainError::InvalidRequest(_))));
        assert!(orders.orders.lock().unwrap().is_empty());
    }

    #[test]
    fn submit_rejects_totals_beyond_column_range() {
        let (svc, _) = service_with_coupon(DiscountValue::Fixed(dec("10")), 5);
        let mut bad = submission(Uuid::new_v4(), None);
        bad.items[0].unit_price = dec("9000000000");
        assert!(matches!(svc.submit(bad), Err(DomainError::InvalidRequest(_))));
    }

    #[test]
    fn submit_with_unknown_coupon_creates_nothing() {
        let (svc, orders) = service_with_coupon(DiscountValue::Fixed(dec("10")), 5);
        assert!(matches!(
            svc.submit(submission(Uuid::new_v4(), Some("BOGUS"))),
            Err(DomainError::InvalidCode)
        ));
        assert!(orders.orders.lock().unwrap().is_empty());
    }

    #[test]
    fn submit_rejects_missing_payment_method() {
        let (svc, _) = service_with_coupon(DiscountValue::Fixed(dec("10")), 5);
        let mut bad = submission(Uuid::new_v4(), None);
        bad.payment_method = " ".to_string();
        assert!(matches!(
            svc.submit(bad),
            Err(DomainError::InvalidRequest(_))
        ));
    }

    #[test]
    fn backward_status_change_keeps_stored_status() {
        let (svc, orders) = service_with_coupon(DiscountValue::Fixed(dec("10")), 5);
        let order = svc.submit(submission(Uuid::new_v4(), None)).unwrap();
        svc.update_status(order.id, "shipped").unwrap();
        svc.update_status(order.id, "delivered").unwrap();

        let err = svc.update_status(order.id, "shipped").unwrap_err();
        assert!(err.to_string().contains("delivered"));
        assert!(err.to_string().contains("shipped"));
        assert_eq!(
            orders.snapshot(order.id).unwrap().status,
            OrderStatus::Delivered
        );
    }

    #[test]
    fn unknown_status_is_invalid_status() {
        let (svc, _) = service_with_coupon(DiscountValue::Fixed(dec("10")), 5);
        let order = svc.submit(submission(Uuid::new_v4(), None)).unwrap();
        assert!(matches!(
            svc.update_status(order.id, "teleported"),
            Err(DomainError::InvalidStatus(_))
        ));
    }

    #[test]
    fn verified_payment_redeems_coupon_once() {
        let (svc, orders) = service_with_coupon(DiscountValue::Fixed(dec("10")), 5);
        let user = Uuid::new_v4();
        let order = svc.submit(submission(user, Some("SAVE10"))).unwrap();
        let outcome = PaymentOutcome {
            verified: true,
            payment_id: "pay_1".to_string(),
        };

        let paid = svc.reconcile_payment(order.id, outcome.clone()).unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.status, OrderStatus::Confirmed);

        // Gateway retry: no second redemption.
        svc.reconcile_payment(order.id, outcome).unwrap();
        assert_eq!(orders.ledger.usages.lock().unwrap().len(), 1);
        assert_eq!(orders.ledger.special.lock().unwrap()[0].usage_limit, 4);
    }

    #[test]
    fn failed_verification_marks_order_failed_but_confirmed() {
        let (svc, orders) = service_with_coupon(DiscountValue::Fixed(dec("10")), 5);
        let order = svc.submit(submission(Uuid::new_v4(), Some("SAVE10"))).unwrap();
        let err = svc
            .reconcile_payment(
                order.id,
                PaymentOutcome {
                    verified: false,
                    payment_id: "pay_bad".to_string(),
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::PaymentVerificationFailed));

        let stored = orders.snapshot(order.id).unwrap();
        assert_eq!(stored.payment_status, PaymentStatus::Failed);
        assert_eq!(stored.status, OrderStatus::Confirmed);
        assert!(orders.ledger.usages.lock().unwrap().is_empty());
    }

    #[test]
    fn settlement_failure_leaves_order_pending() {
        let (svc, orders) = service_with_coupon(DiscountValue::Fixed(dec("10")), 1);
        let first = svc.submit(submission(Uuid::new_v4(), Some("SAVE10"))).unwrap();
        let second = svc.submit(submission(Uuid::new_v4(), Some("SAVE10"))).unwrap();

        let pay = |id| {
            svc.reconcile_payment(
                id,
                PaymentOutcome {
                    verified: true,
                    payment_id: format!("pay_{id}"),
                },
            )
        };
        pay(first.id).unwrap();
        assert!(matches!(pay(second.id), Err(DomainError::LimitReached)));
        assert_eq!(
            orders.snapshot(second.id).unwrap().payment_status,
            PaymentStatus::Pending
        );
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let (svc, _) = service_with_coupon(DiscountValue::Fixed(dec("10")), 5);
        let order = svc.submit(submission(Uuid::new_v4(), None)).unwrap();
        svc.delete(order.id).unwrap();
        assert!(matches!(svc.get(order.id), Err(DomainError::NotFound(_))));
        assert!(matches!(svc.delete(order.id), Err(DomainError::NotFound(_))));
    }

    #[test]
    fn list_clamps_paging_and_filters_by_user() {
        let (svc, _) = service_with_coupon(DiscountValue::Fixed(dec("10")), 5);
        let user = Uuid::new_v4();
        for _ in 0..3 {
            svc.submit(submission(user, None)).unwrap();
        }
        svc.submit(submission(Uuid::new_v4(), None)).unwrap();

        let page = svc.list(Some(user), 0, 2).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
    }
}
