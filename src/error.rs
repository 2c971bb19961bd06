use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::migrations::MigrationError;
use crate::notifications::NotificationError;
use crate::payments::PaymentError;

/// Error surfaced by services and mapped to an HTTP status at the route boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error(transparent)]
    Migration(#[from] MigrationError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Notification(#[from] NotificationError),
    #[error(transparent)]
    Payment(#[from] PaymentError),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NotAllowed(String),
    #[error("{0}")]
    Duplicate(String),
}

impl ResponseError for StoreError {
    fn status_code(&self) -> StatusCode {
        match self {
            StoreError::Invalid(_) | StoreError::Payment(_) => StatusCode::BAD_REQUEST,
            StoreError::Auth(_) => StatusCode::UNAUTHORIZED,
            StoreError::NotAllowed(_) => StatusCode::FORBIDDEN,
            StoreError::NotFound(_) => StatusCode::NOT_FOUND,
            StoreError::Duplicate(_) => StatusCode::CONFLICT,
            StoreError::Database(_)
            | StoreError::Migration(_)
            | StoreError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        // Internal details stay in the server log.
        let message = if status.is_server_error() {
            "An unknown error occurred.".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(status).json(json!({ "message": message }))
    }
}
