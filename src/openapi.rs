use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{checkout, coupons, orders, payments, referrals};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Checkout API",
        version = "0.1.0",
        description = "Checkout sessions, coupons and referrals, orders and payment verification."
    ),
    paths(
        checkout::get_session,
        checkout::create_session,
        checkout::cancel_session,
        checkout::list_items,
        checkout::add_item,
        checkout::clear_items,
        coupons::validate_coupon,
        coupons::redeem_coupon,
        referrals::register_referral,
        referrals::get_referral,
        referrals::complete_referral,
        orders::create_order,
        orders::get_order,
        orders::list_orders,
        orders::update_order_status,
        orders::delete_order,
        payments::verify_payment,
    ),
    components(schemas(
        checkout::SessionResponse,
        checkout::AddItemRequest,
        checkout::CheckoutItemResponse,
        coupons::ValidateCouponRequest,
        coupons::ValidateCouponResponse,
        coupons::RedeemCouponRequest,
        coupons::RedeemCouponResponse,
        referrals::RegisterReferralRequest,
        referrals::CompleteReferralRequest,
        referrals::ReferralResponse,
        referrals::RewardCouponResponse,
        orders::CreateOrderItemRequest,
        orders::CreateOrderRequest,
        orders::UpdateStatusRequest,
        orders::OrderItemResponse,
        orders::OrderResponse,
        orders::ListOrdersResponse,
        payments::VerifyPaymentRequest,
    )),
    tags(
        (name = "checkout", description = "Checkout reservations and line items"),
        (name = "coupons", description = "Coupon validation and redemption"),
        (name = "referrals", description = "Referral codes and rewards"),
        (name = "orders", description = "Order lifecycle"),
        (name = "payments", description = "Gateway payment verification"),
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi())
}
