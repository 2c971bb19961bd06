use actix_web::{web, HttpResponse, ResponseError};
use leptos::logging::{error, log};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthenticatedCustomer;
use crate::container::Container;
use crate::models::review::NewReview;
use crate::services::{company, reviews, wishlist};

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct WishlistItemRequest {
    pub product_id: String,
}

pub async fn company_info(container: web::Data<Container>) -> HttpResponse {
    match company::company_info(&container).await {
        Ok(company) => HttpResponse::Ok().json(json!({ "company": company })),
        Err(err) => {
            error!("[API] Failed to load company info: {}", err);
            err.error_response()
        }
    }
}

pub async fn get_wishlist(
    container: web::Data<Container>,
    customer: AuthenticatedCustomer,
) -> HttpResponse {
    match wishlist::wishlist(&container, &customer.customer_id).await {
        Ok(wishlist) => HttpResponse::Ok().json(json!({ "wishlist": wishlist })),
        Err(err) => {
            error!(
                "[API] Failed to load wishlist for {}: {}",
                customer.customer_id, err
            );
            err.error_response()
        }
    }
}

pub async fn add_wishlist_item(
    container: web::Data<Container>,
    customer: AuthenticatedCustomer,
    request: web::Json<WishlistItemRequest>,
) -> HttpResponse {
    match wishlist::add_item(&container, &customer.customer_id, &request.product_id).await {
        Ok(wishlist) => HttpResponse::Ok().json(json!({ "wishlist": wishlist })),
        Err(err) => {
            error!("[API] Failed to add wishlist item: {}", err);
            err.error_response()
        }
    }
}

pub async fn remove_wishlist_item(
    container: web::Data<Container>,
    customer: AuthenticatedCustomer,
    product_id: web::Path<String>,
) -> HttpResponse {
    match wishlist::remove_item(&container, &customer.customer_id, &product_id).await {
        Ok(wishlist) => HttpResponse::Ok().json(json!({ "wishlist": wishlist })),
        Err(err) => {
            error!("[API] Failed to remove wishlist item: {}", err);
            err.error_response()
        }
    }
}

pub async fn create_review(
    container: web::Data<Container>,
    customer: AuthenticatedCustomer,
    request: web::Json<NewReview>,
) -> HttpResponse {
    log!(
        "[API] Review submission from {} for product {}",
        customer.customer_id,
        request.product_id
    );
    match reviews::submit_review(&container, &customer.customer_id, request.into_inner()).await {
        Ok(review) => HttpResponse::Created().json(json!({ "review": review })),
        Err(err) => {
            error!("[API] Review submission rejected: {}", err);
            err.error_response()
        }
    }
}

pub async fn product_reviews(
    container: web::Data<Container>,
    product_id: web::Path<String>,
    query: web::Query<PageQuery>,
) -> HttpResponse {
    match reviews::product_reviews(&container, &product_id, query.limit, query.offset).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(err) => {
            error!("[API] Failed to list reviews for {}: {}", product_id, err);
            err.error_response()
        }
    }
}

pub async fn collection_rating(
    container: web::Data<Container>,
    collection_id: web::Path<String>,
) -> HttpResponse {
    match reviews::collection_rating(&container, &collection_id).await {
        Ok(rating) => HttpResponse::Ok().json(rating),
        Err(err) => {
            error!("[API] Failed to aggregate collection {}: {}", collection_id, err);
            err.error_response()
        }
    }
}
