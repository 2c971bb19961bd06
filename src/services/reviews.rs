use leptos::logging::{log, warn};
use serde_json::json;

use crate::container::Container;
use crate::db::reviews::{ReviewFilter, ReviewListing};
use crate::db::{is_unique_violation, new_id, now};
use crate::error::StoreError;
use crate::models::review::{
    CollectionRating, NewReview, Review, ReviewPage, ReviewStatus, MAX_RATING, MIN_RATING,
};
use crate::notifications::{Notification, TEMPLATE_REVIEW_APPROVED};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;
pub const SHOWCASE_DEFAULT_LIMIT: i64 = 6;
pub const SHOWCASE_DEFAULT_MIN_RATING: i64 = 4;

const ALREADY_REVIEWED: &str = "This product has already been reviewed for this order";

/// Clamps user-supplied paging to `1..=MAX_PAGE_SIZE` and a non-negative offset.
pub fn clamp_page(limit: Option<i64>, offset: Option<i64>, default_limit: i64) -> (i64, i64) {
    let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
    let offset = offset.unwrap_or(0).max(0);
    (limit, offset)
}

fn page(listing: ReviewListing, limit: i64, offset: i64) -> ReviewPage {
    ReviewPage {
        reviews: listing.reviews,
        count: listing.count,
        average_rating: listing.average_rating,
        limit,
        offset,
    }
}

/// Creates a pending review for a product the customer bought on `order_id`.
pub async fn submit_review(
    container: &Container,
    customer_id: &str,
    submission: NewReview,
) -> Result<Review, StoreError> {
    submission.validate().map_err(StoreError::Invalid)?;

    let product = container
        .db
        .get_product(&submission.product_id)
        .await?
        .ok_or_else(|| {
            StoreError::NotFound(format!(
                "Product with id {} was not found",
                submission.product_id
            ))
        })?;

    let purchased = container
        .db
        .customer_purchased(customer_id, &submission.order_id, &product.id)
        .await?;
    if !purchased {
        return Err(StoreError::NotAllowed(
            "Reviews can only be left for purchased products".to_string(),
        ));
    }

    if container
        .db
        .find_review_for_purchase(&submission.order_id, &product.id)
        .await?
        .is_some()
    {
        return Err(StoreError::Duplicate(ALREADY_REVIEWED.to_string()));
    }

    let ts = now();
    let review = Review {
        id: new_id("rev"),
        title: submission
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty()),
        content: submission.content.trim().to_string(),
        rating: submission.rating,
        first_name: submission.first_name.trim().to_string(),
        last_name: submission.last_name.trim().to_string(),
        status: ReviewStatus::Pending,
        product_id: product.id,
        customer_id: Some(customer_id.to_string()),
        order_id: submission.order_id,
        collection_id: product.collection_id,
        created_at: ts.clone(),
        updated_at: ts,
        deleted_at: None,
    };
    // A concurrent submission can pass the check above; the live-review index decides.
    container.db.insert_review(&review).await.map_err(|e| {
        if is_unique_violation(&e) {
            StoreError::Duplicate(ALREADY_REVIEWED.to_string())
        } else {
            StoreError::from(e)
        }
    })?;
    log!(
        "[API] Review {} submitted for product {}",
        review.id,
        review.product_id
    );
    Ok(review)
}

pub async fn product_reviews(
    container: &Container,
    product_id: &str,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<ReviewPage, StoreError> {
    if container.db.get_product(product_id).await?.is_none() {
        return Err(StoreError::NotFound(format!(
            "Product with id {} was not found",
            product_id
        )));
    }
    let (limit, offset) = clamp_page(limit, offset, DEFAULT_PAGE_SIZE);
    let filter = ReviewFilter {
        status: Some(ReviewStatus::Approved),
        product_id: Some(product_id.to_string()),
        min_rating: None,
    };
    let listing = container.db.list_reviews(&filter, limit, offset).await?;
    Ok(page(listing, limit, offset))
}

/// Approved reviews rated at least `min_rating`, newest first.
pub async fn showcase(
    container: &Container,
    limit: Option<i64>,
    offset: Option<i64>,
    min_rating: Option<i64>,
) -> Result<ReviewPage, StoreError> {
    let (limit, offset) = clamp_page(limit, offset, SHOWCASE_DEFAULT_LIMIT);
    let min_rating = min_rating
        .unwrap_or(SHOWCASE_DEFAULT_MIN_RATING)
        .clamp(MIN_RATING, MAX_RATING);
    let filter = ReviewFilter {
        status: Some(ReviewStatus::Approved),
        product_id: None,
        min_rating: Some(min_rating),
    };
    let listing = container.db.list_reviews(&filter, limit, offset).await?;
    Ok(page(listing, limit, offset))
}

pub async fn admin_reviews(
    container: &Container,
    status: Option<ReviewStatus>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> Result<ReviewPage, StoreError> {
    let (limit, offset) = clamp_page(limit, offset, DEFAULT_PAGE_SIZE);
    let filter = ReviewFilter {
        status,
        ..Default::default()
    };
    let listing = container.db.list_reviews(&filter, limit, offset).await?;
    Ok(page(listing, limit, offset))
}

/// Moves reviews to `status`. Reviews that become approved notify their
/// author; a failed notification is logged and does not undo the moderation.
pub async fn moderate(
    container: &Container,
    ids: &[String],
    status: ReviewStatus,
) -> Result<Vec<Review>, StoreError> {
    if ids.is_empty() {
        return Err(StoreError::Invalid("ids must not be empty".to_string()));
    }
    let moderated = container.db.update_review_status(ids, status).await?;
    let changed = moderated.iter().filter(|m| m.changed()).count();
    log!("[API] {} of {} reviews moved to {}", changed, moderated.len(), status);

    if status == ReviewStatus::Approved {
        for entry in moderated.iter().filter(|m| m.changed()) {
            notify_approved(container, &entry.review).await;
        }
    }
    Ok(moderated.into_iter().map(|m| m.review).collect())
}

async fn notify_approved(container: &Container, review: &Review) {
    let Some(customer_id) = &review.customer_id else {
        return;
    };
    let email = match container.db.get_customer_email(customer_id).await {
        Ok(Some(email)) => email,
        Ok(None) => return,
        Err(e) => {
            warn!("[API] Could not load customer {}: {}", customer_id, e);
            return;
        }
    };
    let product_title = match container.db.get_product(&review.product_id).await {
        Ok(Some(product)) => product.title,
        _ => "your purchase".to_string(),
    };
    let notification = Notification::email(
        &email,
        TEMPLATE_REVIEW_APPROVED,
        json!({
            "first_name": review.first_name,
            "product_title": product_title,
            "product_url": format!(
                "{}/products/{}",
                container.config.backend_url, review.product_id
            ),
            "review_id": review.id,
        }),
    );
    if let Err(e) = container.notifications.send(&notification).await {
        warn!("[API] Review {} approval notice failed: {}", review.id, e);
    }
}

pub async fn delete_review(container: &Container, review_id: &str) -> Result<(), StoreError> {
    if !container.db.soft_delete_review(review_id).await? {
        return Err(StoreError::NotFound(format!(
            "Review with id {} was not found",
            review_id
        )));
    }
    Ok(())
}

pub async fn collection_rating(
    container: &Container,
    collection_id: &str,
) -> Result<CollectionRating, StoreError> {
    Ok(container.db.collection_rating(collection_id).await?)
}
