pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod openapi;
pub mod schema;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub use config::AppConfig;
pub use db::{create_pool, DbPool};

use handlers::{checkout, coupons, orders, payments, referrals, AppState};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    if !applied.is_empty() {
        log::info!("applied {} migration(s)", applied.len());
    }
    Ok(())
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    config: &AppConfig,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(AppState::new(pool, config));

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().error_handler(handlers::json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(handlers::query_error_handler))
            .wrap(Logger::default())
            .service(
                web::scope("/checkout")
                    .service(
                        web::resource("/session")
                            .route(web::get().to(checkout::get_session))
                            .route(web::post().to(checkout::create_session))
                            .route(web::delete().to(checkout::cancel_session)),
                    )
                    .service(
                        web::resource("/items")
                            .route(web::get().to(checkout::list_items))
                            .route(web::post().to(checkout::add_item))
                            .route(web::delete().to(checkout::clear_items)),
                    ),
            )
            .service(
                web::scope("/coupons")
                    .route("/validate", web::post().to(coupons::validate_coupon))
                    .route("/redeem", web::post().to(coupons::redeem_coupon)),
            )
            .service(
                web::scope("/referrals")
                    .route("", web::post().to(referrals::register_referral))
                    .route("/complete", web::post().to(referrals::complete_referral))
                    .route("/{user_id}", web::get().to(referrals::get_referral)),
            )
            .service(
                web::scope("/orders")
                    .route("", web::post().to(orders::create_order))
                    .route("", web::get().to(orders::list_orders))
                    .route("/{id}", web::get().to(orders::get_order))
                    .route("/{id}", web::delete().to(orders::delete_order))
                    .route("/{id}/status", web::patch().to(orders::update_order_status)),
            )
            .service(
                web::scope("/payments")
                    .route("/{gateway}/verify", web::post().to(payments::verify_payment)),
            )
            .service(openapi::swagger_ui())
    })
    .bind((host.to_string(), port))?
    .run())
}
