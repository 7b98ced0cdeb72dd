pub mod checkout_service;
pub mod discount_service;
pub mod order_service;
pub mod payment_service;
pub mod referral_service;

#[cfg(test)]
pub(crate) mod testing;
