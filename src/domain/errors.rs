use bigdecimal::BigDecimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Invalid coupon code")]
    InvalidCode,
    #[error("Coupon already used")]
    AlreadyUsed,
    #[error("Coupon expired")]
    Expired,
    #[error("Coupon usage limit reached")]
    LimitReached,
    #[error("Minimum order amount of {minimum} required")]
    MinAmountNotMet { minimum: BigDecimal },
    /// Deliberately indistinguishable from "no such coupon" for non-owners.
    #[error("Coupon not found or not available")]
    NotFoundOrUnauthorized,
    #[error("Cannot change status from '{from}' to '{to}'")]
    IllegalTransition { from: String, to: String },
    #[error("Invalid status: {0}")]
    InvalidStatus(String),
    #[error("Payment verification failed")]
    PaymentVerificationFailed,
    #[error("Upstream failure: {0}")]
    UpstreamFailure(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
