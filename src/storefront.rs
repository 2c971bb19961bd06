//! Server functions backing the storefront pages.
use leptos::*;

use crate::models::company::CompanyInfo;
use crate::models::content::MarketingPage;
use crate::models::review::{Review, ReviewPage};

#[server(GetReviewShowcase, "/api")]
pub async fn get_review_showcase(
    limit: Option<i64>,
    min_rating: Option<i64>,
) -> Result<ReviewPage, ServerFnError> {
    use crate::container::Container;
    use crate::services::reviews;
    use actix_web::web;

    let container: web::Data<Container> = leptos_actix::extract().await?;
    reviews::showcase(&container, limit, None, min_rating)
        .await
        .map_err(|e| ServerFnError::ServerError(e.to_string()))
}

#[server(GetCompanyInfo, "/api")]
pub async fn get_company_info() -> Result<CompanyInfo, ServerFnError> {
    use crate::container::Container;
    use crate::services::company;
    use actix_web::web;

    let container: web::Data<Container> = leptos_actix::extract().await?;
    company::company_info(&container)
        .await
        .map_err(|e| ServerFnError::ServerError(e.to_string()))
}

#[server(GetProductReviews, "/api")]
pub async fn get_product_reviews(
    product_id: String,
    offset: Option<i64>,
) -> Result<ReviewPage, ServerFnError> {
    use crate::container::Container;
    use crate::services::reviews;
    use actix_web::web;

    let container: web::Data<Container> = leptos_actix::extract().await?;
    reviews::product_reviews(&container, &product_id, None, offset)
        .await
        .map_err(|e| ServerFnError::ServerError(e.to_string()))
}

/// Submits a review as the customer signed in through the auth cookie.
#[server(SubmitReview, "/api")]
pub async fn submit_review(
    product_id: String,
    order_id: String,
    title: Option<String>,
    content: String,
    rating: i64,
    first_name: String,
    last_name: String,
) -> Result<Review, ServerFnError> {
    use crate::auth::AuthenticatedCustomer;
    use crate::container::Container;
    use crate::models::review::NewReview;
    use crate::services::reviews;
    use actix_web::web;
    use leptos::logging::log;

    let container: web::Data<Container> = leptos_actix::extract().await?;
    let customer: AuthenticatedCustomer = leptos_actix::extract().await?;
    log!("[API] Storefront review from {}", customer.customer_id);

    let submission = NewReview {
        title: title.filter(|t| !t.trim().is_empty()),
        content,
        rating,
        first_name,
        last_name,
        product_id,
        order_id,
    };
    reviews::submit_review(&container, &customer.customer_id, submission)
        .await
        .map_err(|e| ServerFnError::ServerError(e.to_string()))
}

/// `None` when the content platform is not configured or has no such page.
#[server(GetMarketingPage, "/api")]
pub async fn get_marketing_page(slug: String) -> Result<Option<MarketingPage>, ServerFnError> {
    use crate::container::Container;
    use actix_web::web;
    use leptos::logging::warn;

    let container: web::Data<Container> = leptos_actix::extract().await?;
    let Some(client) = &container.content else {
        return Ok(None);
    };
    match client.fetch_page(&slug).await {
        Ok(page) => Ok(page),
        Err(e) => {
            warn!("[CONTENT] Falling back without page '{}': {}", slug, e);
            Ok(None)
        }
    }
}
