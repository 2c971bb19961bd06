use leptos::logging::{log, warn};
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::content::SanityClient;
use crate::db::Database;
use crate::error::StoreError;
use crate::migrations::Migrator;
use crate::notifications::{provider_from_config, NotificationProvider};
use crate::payments::{PaymentWebhookProcessor, StripeWebhookProcessor};

/// Shared application state: the database plus the providers routes call into.
#[derive(Clone)]
pub struct Container {
    pub config: Arc<StoreConfig>,
    pub db: Arc<Database>,
    pub payments: Arc<dyn PaymentWebhookProcessor>,
    pub notifications: Arc<dyn NotificationProvider>,
    pub content: Option<SanityClient>,
}

impl Container {
    /// Opens the database, creates the commerce tables, runs pending review
    /// migrations and wires the configured providers.
    pub async fn bootstrap(config: StoreConfig) -> Result<Self, StoreError> {
        let db = Arc::new(Database::new(&config.database_path)?);
        db.create_schema().await?;
        let applied = Migrator::reviews()?.up(&db).await?;
        log!("[SERVER] Applied {} review migrations", applied.len());

        let notifications = provider_from_config(&config)?;
        log!("[SERVER] Notification provider: {}", notifications.name());
        let payments = Arc::new(StripeWebhookProcessor::new(
            db.clone(),
            config.stripe_webhook_secret.clone(),
        ));

        log!("[SERVER] Public URL: {}", config.backend_url);
        if config.publishable_key.is_none() {
            warn!("[SERVER] PUBLISHABLE_KEY not set, /store accepts requests without a key");
        }

        let content = config.sanity.clone().map(SanityClient::new);
        if content.is_none() {
            log!("[SERVER] SANITY_PROJECT_ID not set, marketing pages disabled");
        }

        Ok(Container {
            content,
            config: Arc::new(config),
            db,
            payments,
            notifications,
        })
    }

    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationProvider>) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn with_payments(mut self, payments: Arc<dyn PaymentWebhookProcessor>) -> Self {
        self.payments = payments;
        self
    }
}
