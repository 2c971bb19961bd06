// Storefront-internal endpoints.
use actix_web::{web, HttpResponse, ResponseError};
use leptos::logging::error;
use serde::Deserialize;
use serde_json::json;

use crate::container::Container;
use crate::services::reviews;

pub const SERVICE_NAME: &str = "burrowmart-storefront";

#[derive(Debug, Deserialize)]
pub struct ShowcaseQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    #[serde(rename = "minRating")]
    pub min_rating: Option<i64>,
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": SERVICE_NAME,
    }))
}

pub async fn review_showcase(
    container: web::Data<Container>,
    query: web::Query<ShowcaseQuery>,
) -> HttpResponse {
    match reviews::showcase(&container, query.limit, query.offset, query.min_rating).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => {
            error!("[API] Failed to build review showcase: {}", err);
            err.error_response()
        }
    }
}
