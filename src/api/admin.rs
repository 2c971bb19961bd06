use actix_web::{web, HttpResponse, ResponseError};
use leptos::logging::{error, log};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthenticatedAdmin;
use crate::container::Container;
use crate::models::review::ReviewStatus;
use crate::services::reviews;
use crate::workflows::order_shipped::{run_order_shipped, OrderShippedInput};

#[derive(Debug, Deserialize)]
pub struct AdminReviewQuery {
    pub status: Option<ReviewStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ModerationRequest {
    pub ids: Vec<String>,
    pub status: ReviewStatus,
}

#[derive(Debug, Deserialize)]
pub struct ShipmentRequest {
    #[serde(default)]
    pub tracking_numbers: Vec<String>,
}

pub async fn list_reviews(
    container: web::Data<Container>,
    _admin: AuthenticatedAdmin,
    query: web::Query<AdminReviewQuery>,
) -> HttpResponse {
    match reviews::admin_reviews(&container, query.status, query.limit, query.offset).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => {
            error!("[API] Failed to list reviews: {}", err);
            err.error_response()
        }
    }
}

pub async fn update_review_status(
    container: web::Data<Container>,
    admin: AuthenticatedAdmin,
    request: web::Json<ModerationRequest>,
) -> HttpResponse {
    log!(
        "[API] {} moving {} reviews to {}",
        admin.user_id,
        request.ids.len(),
        request.status
    );
    match reviews::moderate(&container, &request.ids, request.status).await {
        Ok(updated) => HttpResponse::Ok().json(json!({ "reviews": updated })),
        Err(err) => {
            error!("[API] Moderation failed: {}", err);
            err.error_response()
        }
    }
}

pub async fn delete_review(
    container: web::Data<Container>,
    _admin: AuthenticatedAdmin,
    review_id: web::Path<String>,
) -> HttpResponse {
    match reviews::delete_review(&container, &review_id).await {
        Ok(()) => HttpResponse::Ok().json(json!({
            "id": review_id.as_str(),
            "object": "review",
            "deleted": true,
        })),
        Err(err) => {
            error!("[API] Failed to delete review {}: {}", review_id, err);
            err.error_response()
        }
    }
}

pub async fn create_shipment(
    container: web::Data<Container>,
    _admin: AuthenticatedAdmin,
    order_id: web::Path<String>,
    request: web::Json<ShipmentRequest>,
) -> HttpResponse {
    let input = OrderShippedInput {
        order_id: order_id.into_inner(),
        tracking_numbers: request.into_inner().tracking_numbers,
    };
    match run_order_shipped(&container, input).await {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(err) => {
            error!("[API] Shipment workflow failed: {}", err);
            err.error_response()
        }
    }
}
