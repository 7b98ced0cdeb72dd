use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::discount::AppliedDiscount;
use super::errors::DomainError;

/// Fulfilment status. Variant order is the transition order: an order may
/// only stay where it is or move to a later position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OrderStatus {
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    Returned,
}

impl OrderStatus {
    pub const SEQUENCE: [OrderStatus; 5] = [
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Returned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Returned => "returned",
        }
    }

    /// Checks `self -> target` against the forward-or-stay rule.
    ///
    /// Cancellation and return share the fulfilment axis, so
    /// `confirmed -> returned` is legal while `returned -> cancelled` is not.
    pub fn transition_to(self, target: OrderStatus) -> Result<OrderStatus, DomainError> {
        if target >= self {
            Ok(target)
        } else {
            Err(DomainError::IllegalTransition {
                from: self.as_str().to_string(),
                to: target.as_str().to_string(),
            })
        }
    }
}

impl FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::SEQUENCE
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| DomainError::InvalidStatus(s.to_string()))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "paid" => Ok(PaymentStatus::Paid),
            "failed" => Ok(PaymentStatus::Failed),
            other => Err(DomainError::InvalidStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrderItemInput {
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// Monetary breakdown stored on the order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotals {
    pub subtotal: BigDecimal,
    pub discount: BigDecimal,
    pub shipping: BigDecimal,
    pub total: BigDecimal,
}

impl OrderTotals {
    pub fn compute(subtotal: BigDecimal, discount: BigDecimal, shipping: BigDecimal) -> Self {
        let total = &subtotal - &discount + &shipping;
        Self {
            subtotal,
            discount,
            shipping,
            total,
        }
    }
}

/// A validated checkout submission, ready to persist.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub payment_method: String,
    pub gateway_order_id: Option<String>,
    pub totals: OrderTotals,
    pub discount: Option<AppliedDiscount>,
    pub items: Vec<OrderItemInput>,
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub variant_id: Option<Uuid>,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub address_id: Uuid,
    pub totals: OrderTotals,
    pub coupon_code: Option<String>,
    pub payment_method: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: Option<String>,
    pub payment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

/// Sum of `quantity * unit_price` over the submitted items.
pub fn subtotal(items: &[OrderItemInput]) -> BigDecimal {
    items
        .iter()
        .map(|item| &item.unit_price * BigDecimal::from(item.quantity))
        .fold(BigDecimal::from(0), |acc, line| acc + line)
}

pub fn validate_items(items: &[OrderItemInput]) -> Result<(), DomainError> {
    if items.is_empty() {
        return Err(DomainError::InvalidRequest(
            "order must contain at least one item".to_string(),
        ));
    }
    for item in items {
        if item.quantity <= 0 {
            return Err(DomainError::InvalidRequest(format!(
                "quantity for product {} must be positive",
                item.product_id
            )));
        }
        if item.unit_price < BigDecimal::from(0) {
            return Err(DomainError::InvalidRequest(format!(
                "unit_price for product {} must not be negative",
                item.product_id
            )));
        }
        check_money("unit_price", &item.unit_price)?;
    }
    Ok(())
}

/// Largest amount a `NUMERIC(12, 2)` column holds.
pub fn max_money() -> BigDecimal {
    BigDecimal::new(999_999_999_999i64.into(), 2)
}

/// Amounts are stored as `NUMERIC(12, 2)`: reject anything the column would
/// round or overflow instead of letting the store change it.
pub fn check_money(field: &str, amount: &BigDecimal) -> Result<(), DomainError> {
    if amount.with_scale(2) != *amount {
        return Err(DomainError::InvalidRequest(format!(
            "{field} must have at most 2 decimal places, got {amount}"
        )));
    }
    if amount.abs() > max_money() {
        return Err(DomainError::InvalidRequest(format!(
            "{field} exceeds the maximum of {}",
            max_money()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, price: &str) -> OrderItemInput {
        OrderItemInput {
            product_id: Uuid::new_v4(),
            variant_id: None,
            quantity,
            unit_price: BigDecimal::from_str(price).unwrap(),
        }
    }

    #[test]
    fn forward_and_stay_transitions_are_legal() {
        for (i, from) in OrderStatus::SEQUENCE.iter().enumerate() {
            for to in &OrderStatus::SEQUENCE[i..] {
                assert_eq!(from.transition_to(*to).unwrap(), *to);
            }
        }
    }

    #[test]
    fn backward_transitions_are_rejected() {
        for (i, from) in OrderStatus::SEQUENCE.iter().enumerate() {
            for to in &OrderStatus::SEQUENCE[..i] {
                assert!(matches!(
                    from.transition_to(*to),
                    Err(DomainError::IllegalTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn delivered_to_shipped_names_both_states() {
        let err = OrderStatus::Delivered
            .transition_to(OrderStatus::Shipped)
            .unwrap_err();
        match err {
            DomainError::IllegalTransition { from, to } => {
                assert_eq!(from, "delivered");
                assert_eq!(to, "shipped");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn terminal_states_share_the_fulfilment_axis() {
        assert!(OrderStatus::Confirmed
            .transition_to(OrderStatus::Returned)
            .is_ok());
        assert!(OrderStatus::Delivered
            .transition_to(OrderStatus::Cancelled)
            .is_ok());
        assert!(OrderStatus::Returned
            .transition_to(OrderStatus::Cancelled)
            .is_err());
        assert!(OrderStatus::Cancelled
            .transition_to(OrderStatus::Delivered)
            .is_err());
    }

    #[test]
    fn parses_status_case_insensitively() {
        assert_eq!(
            OrderStatus::from_str(" Shipped ").unwrap(),
            OrderStatus::Shipped
        );
        assert!(matches!(
            OrderStatus::from_str("lost"),
            Err(DomainError::InvalidStatus(_))
        ));
    }

    #[test]
    fn subtotal_multiplies_quantity_by_unit_price() {
        let items = vec![item(2, "9.99"), item(1, "5.00")];
        assert_eq!(subtotal(&items), BigDecimal::from_str("24.98").unwrap());
    }

    #[test]
    fn totals_subtract_discount_and_add_shipping() {
        let totals = OrderTotals::compute(
            BigDecimal::from(500),
            BigDecimal::from(100),
            BigDecimal::from(40),
        );
        assert_eq!(totals.total, BigDecimal::from(440));
    }

    #[test]
    fn validate_items_rejects_empty_and_non_positive_quantities() {
        assert!(validate_items(&[]).is_err());
        assert!(validate_items(&[item(0, "1.00")]).is_err());
        assert!(validate_items(&[item(1, "-1.00")]).is_err());
        assert!(validate_items(&[item(3, "1.00")]).is_ok());
    }

    #[test]
    fn prices_the_store_would_round_are_rejected() {
        let err = validate_items(&[item(1, "9.999")]).unwrap_err();
        assert!(err.to_string().contains("unit_price"));
        assert!(validate_items(&[item(1, "9.990")]).is_ok());
    }

    #[test]
    fn money_beyond_column_range_is_rejected() {
        assert!(check_money("total", &max_money()).is_ok());
        let too_big = BigDecimal::from_str("10000000000").unwrap();
        assert!(matches!(
            check_money("total", &too_big),
            Err(DomainError::InvalidRequest(_))
        ));
    }
}
