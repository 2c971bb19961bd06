pub mod admin;
pub mod frontend;
pub mod session;
pub mod store;
pub mod webhooks;

use actix_cors::Cors;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{web, HttpRequest, ResponseError};
use leptos::logging::warn;

use crate::config::StoreConfig;
use crate::error::StoreError;

/// Origin allow-list for one API surface. An empty list only admits same-origin calls.
pub fn cors_for(origins: &[String]) -> Cors {
    origins
        .iter()
        .fold(Cors::default(), |cors, origin| {
            if origin == "*" {
                cors.allow_any_origin()
            } else {
                cors.allowed_origin(origin)
            }
        })
        .allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

pub const PUBLISHABLE_KEY_HEADER: &str = "x-publishable-api-key";

/// With a configured key, every `/store` request must carry it.
pub fn check_publishable_key(req: &HttpRequest, expected: Option<&str>) -> Result<(), StoreError> {
    let Some(expected) = expected else {
        return Ok(());
    };
    match req
        .headers()
        .get(PUBLISHABLE_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        Some(key) if key == expected => Ok(()),
        Some(_) => Err(StoreError::Invalid(
            "A valid publishable key is required to proceed with the request".to_string(),
        )),
        None => Err(StoreError::Invalid(format!(
            "Publishable API key required in the request header: {}",
            PUBLISHABLE_KEY_HEADER
        ))),
    }
}

/// Turns extractor rejections into the same `{"message": ...}` body as
/// service errors.
fn invalid_request<E: std::fmt::Display>(err: E, req: &HttpRequest) -> actix_web::Error {
    warn!("[API] Rejected {} {}: {}", req.method(), req.path(), err);
    StoreError::Invalid(err.to_string()).into()
}

/// Registers every JSON route. Must run before the leptos server-fn catch-all
/// on `/api/{tail:.*}`.
pub fn configure(cfg: &mut web::ServiceConfig, config: &StoreConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(invalid_request))
        .app_data(web::QueryConfig::default().error_handler(invalid_request))
        .app_data(web::PathConfig::default().error_handler(invalid_request));
    let publishable_key = config.publishable_key.clone();
    cfg.service(
        web::scope("/store")
            .wrap_fn(move |req, srv| {
                let key = publishable_key.as_deref();
                let checked = match check_publishable_key(req.request(), key) {
                    Ok(()) => Ok(srv.call(req)),
                    Err(err) => {
                        warn!("[API] Rejected {} {}: {}", req.method(), req.path(), err);
                        Err(req.into_response(err.error_response()))
                    }
                };
                async move {
                    match checked {
                        Ok(call) => call.await.map(ServiceResponse::map_into_left_body),
                        Err(rejected) => Ok(rejected.map_into_right_body()),
                    }
                }
            })
            .wrap(cors_for(&config.store_cors))
            .route("/company-info", web::get().to(store::company_info))
            .route("/customers/me/wishlist", web::get().to(store::get_wishlist))
            .route(
                "/customers/me/wishlist/items",
                web::post().to(store::add_wishlist_item),
            )
            .route(
                "/customers/me/wishlist/items/{product_id}",
                web::delete().to(store::remove_wishlist_item),
            )
            .route("/reviews", web::post().to(store::create_review))
            .route("/products/{id}/reviews", web::get().to(store::product_reviews))
            .route("/collections/{id}/rating", web::get().to(store::collection_rating)),
    )
    .service(
        web::scope("/admin")
            .wrap(cors_for(&config.admin_cors))
            .route("/reviews", web::get().to(admin::list_reviews))
            .route("/reviews/status", web::post().to(admin::update_review_status))
            .route("/reviews/{id}", web::delete().to(admin::delete_review))
            .route("/orders/{id}/shipments", web::post().to(admin::create_shipment)),
    )
    .service(
        web::scope("/auth")
            .wrap(cors_for(&config.auth_cors))
            .route("/session", web::post().to(session::create_session))
            .route("/session", web::delete().to(session::delete_session)),
    )
    .route("/webhooks/stripe", web::post().to(webhooks::stripe_webhook))
    // Plain resources rather than an `/api` scope so unmatched paths still
    // reach the server functions.
    .route("/api/health", web::get().to(frontend::health))
    .route("/api/reviews/showcase", web::get().to(frontend::review_showcase));
}
