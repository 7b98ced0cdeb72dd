pub mod checkout;
pub mod codes;
pub mod discount;
pub mod errors;
pub mod order;
pub mod ports;
pub mod referral;
