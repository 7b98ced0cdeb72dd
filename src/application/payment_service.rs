use std::collections::HashMap;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::OrderView;
use crate::domain::ports::{DiscountRepository, OrderRepository};

use super::order_service::{OrderService, PaymentOutcome};

type HmacSha256 = Hmac<Sha256>;

/// Client-relayed result of a gateway checkout.
#[derive(Debug, Clone)]
pub struct PaymentVerification {
    pub order_id: Uuid,
    pub gateway_order_id: String,
    pub payment_id: String,
    pub signature: String,
}

/// Gateway-specific proof check. Returns whether the payment is authentic.
pub trait PaymentGateway: Send + Sync + 'static {
    fn name(&self) -> &'static str;
    fn verify(&self, payment: &PaymentVerification) -> bool;
}

/// Razorpay signs `"{order_id}|{payment_id}"` with the account key secret.
pub struct RazorpayGateway {
    key_secret: String,
}

impl RazorpayGateway {
    pub fn new(key_secret: impl Into<String>) -> Self {
        Self {
            key_secret: key_secret.into(),
        }
    }
}

impl PaymentGateway for RazorpayGateway {
    fn name(&self) -> &'static str {
        "razorpay"
    }

    fn verify(&self, payment: &PaymentVerification) -> bool {
        let Ok(signature) = hex::decode(payment.signature.trim()) else {
            return false;
        };
        let mut mac = match HmacSha256::new_from_slice(self.key_secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(format!("{}|{}", payment.gateway_order_id, payment.payment_id).as_bytes());
        mac.verify_slice(&signature).is_ok()
    }
}

/// Routes gateway callbacks to the order lifecycle.
pub struct PaymentReconciler<R, D> {
    orders: Arc<OrderService<R, D>>,
    gateways: HashMap<&'static str, Box<dyn PaymentGateway>>,
}

impl<R: OrderRepository, D: DiscountRepository> PaymentReconciler<R, D> {
    pub fn new(orders: Arc<OrderService<R, D>>) -> Self {
        Self {
            orders,
            gateways: HashMap::new(),
        }
    }

    pub fn with_gateway(mut self, gateway: Box<dyn PaymentGateway>) -> Self {
        self.gateways.insert(gateway.name(), gateway);
        self
    }

    pub fn verify(
        &self,
        gateway: &str,
        payment: PaymentVerification,
    ) -> Result<OrderView, DomainError> {
        let gateway = self
            .gateways
            .get(gateway)
            .ok_or_else(|| DomainError::NotFound("Payment gateway".to_string()))?;
        let order = self.orders.get(payment.order_id)?;

        let reference_matches = order
            .gateway_order_id
            .as_deref()
            .map_or(true, |expected| expected == payment.gateway_order_id);
        let verified = reference_matches && gateway.verify(&payment);
        if !verified {
            log::warn!(
                "{} signature mismatch for order {} (gateway order {})",
                gateway.name(),
                order.id,
                payment.gateway_order_id
            );
        }

        self.orders.reconcile_payment(
            order.id,
            PaymentOutcome {
                verified,
                payment_id: payment.payment_id,
            },
        )
    }
}
