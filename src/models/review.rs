// src/models/review.rs
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "approved" => Ok(ReviewStatus::Approved),
            "rejected" => Ok(ReviewStatus::Rejected),
            other => Err(format!("unknown review status '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Review {
    pub id: String,
    pub title: Option<String>,
    pub content: String,
    pub rating: i64,
    pub first_name: String,
    pub last_name: String,
    pub status: ReviewStatus,
    pub product_id: String,
    pub customer_id: Option<String>,
    pub order_id: String,
    pub collection_id: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl Review {
    /// Name shown next to a review on the storefront, e.g. "Bilbo B."
    pub fn display_name(&self) -> String {
        match self.last_name.chars().next() {
            Some(initial) => format!("{} {}.", self.first_name, initial),
            None => self.first_name.clone(),
        }
    }
}

/// Payload a customer submits from the storefront.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NewReview {
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    pub rating: i64,
    pub first_name: String,
    pub last_name: String,
    pub product_id: String,
    pub order_id: String,
}

impl NewReview {
    pub fn validate(&self) -> Result<(), String> {
        if self.content.trim().is_empty() {
            return Err("content must not be empty".to_string());
        }
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(format!(
                "rating must be between {} and {}",
                MIN_RATING, MAX_RATING
            ));
        }
        if self.first_name.trim().is_empty() || self.last_name.trim().is_empty() {
            return Err("first_name and last_name are required".to_string());
        }
        if self.product_id.trim().is_empty() || self.order_id.trim().is_empty() {
            return Err("product_id and order_id are required".to_string());
        }
        Ok(())
    }
}

/// A page of reviews plus the aggregate over every row matching the filter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub count: i64,
    pub average_rating: Option<f64>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CollectionRating {
    pub collection_id: String,
    pub count: i64,
    pub average_rating: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission() -> NewReview {
        NewReview {
            title: Some("Snug".into()),
            content: "Fits a hobbit hole perfectly".into(),
            rating: 5,
            first_name: "Bilbo".into(),
            last_name: "Baggins".into(),
            product_id: "prod_1".into(),
            order_id: "order_1".into(),
        }
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("approved".parse::<ReviewStatus>(), Ok(ReviewStatus::Approved));
        assert!("archived".parse::<ReviewStatus>().is_err());
        assert_eq!(ReviewStatus::default(), ReviewStatus::Pending);
    }

    #[test]
    fn test_validation_rejects_out_of_range_rating() {
        let mut review = submission();
        assert!(review.validate().is_ok());
        review.rating = 0;
        assert!(review.validate().is_err());
        review.rating = 6;
        assert!(review.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_blank_content() {
        let mut review = submission();
        review.content = "   ".into();
        assert!(review.validate().is_err());
    }
}
