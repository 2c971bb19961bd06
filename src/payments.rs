//! Stripe webhook verification and the payment-status updates it drives.
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use leptos::logging::{log, warn};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use thiserror::Error;

use crate::db::Database;

type HmacSha256 = Hmac<Sha256>;

/// Accepted distance between the signed timestamp and now, in seconds.
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("webhook secret is not configured")]
    MissingSecret,
    #[error("malformed signature header")]
    MalformedHeader,
    #[error("no signatures found matching the expected signature for payload")]
    SignatureMismatch,
    #[error("timestamp outside the tolerance zone")]
    StaleTimestamp,
    #[error("invalid event payload: {0}")]
    InvalidPayload(String),
    #[error("failed to record payment: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAction {
    Captured { order_id: String },
    Failed { order_id: String },
    Refunded { order_id: String },
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookOutcome {
    pub event_id: String,
    pub event_type: String,
    pub action: WebhookAction,
}

#[async_trait]
pub trait PaymentWebhookProcessor: Send + Sync {
    async fn process_webhook(
        &self,
        signature: &str,
        raw_body: &[u8],
    ) -> Result<WebhookOutcome, PaymentError>;
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: Value,
}

#[derive(Debug, PartialEq)]
struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_signature_header(header: &str) -> Result<SignatureHeader, PaymentError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();
    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => {
                timestamp = Some(
                    value
                        .parse::<i64>()
                        .map_err(|_| PaymentError::MalformedHeader)?,
                )
            }
            // Non-hex v1 entries can never match; skip them.
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }
    let timestamp = timestamp.ok_or(PaymentError::MalformedHeader)?;
    if signatures.is_empty() {
        return Err(PaymentError::SignatureMismatch);
    }
    Ok(SignatureHeader {
        timestamp,
        signatures,
    })
}

/// Builds a `stripe-signature` header value for `payload` signed at `timestamp`.
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Some(format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Checks a `stripe-signature` header against the raw body.
pub fn verify_signature(
    secret: &str,
    header: &str,
    payload: &[u8],
    now: i64,
) -> Result<(), PaymentError> {
    let parsed = parse_signature_header(header)?;
    let matched = parsed.signatures.iter().any(|candidate| {
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(parsed.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.verify_slice(candidate).is_ok()
    });
    if !matched {
        return Err(PaymentError::SignatureMismatch);
    }
    if now.abs_diff(parsed.timestamp) > SIGNATURE_TOLERANCE_SECS.unsigned_abs() {
        return Err(PaymentError::StaleTimestamp);
    }
    Ok(())
}

pub struct StripeWebhookProcessor {
    db: Arc<Database>,
    secret: Option<String>,
}

impl StripeWebhookProcessor {
    pub fn new(db: Arc<Database>, secret: Option<String>) -> Self {
        StripeWebhookProcessor { db, secret }
    }

    async fn apply(&self, event: &StripeEvent) -> Result<WebhookAction, PaymentError> {
        let status = match event.event_type.as_str() {
            "payment_intent.succeeded" => "captured",
            "payment_intent.payment_failed" => "failed",
            "charge.refunded" => "refunded",
            _ => return Ok(WebhookAction::Ignored),
        };

        let Some(order_id) = event
            .data
            .object
            .pointer("/metadata/order_id")
            .and_then(Value::as_str)
            .map(str::to_string)
        else {
            warn!(
                "[WEBHOOK] {} {} carries no order_id metadata",
                event.event_type, event.id
            );
            return Ok(WebhookAction::Ignored);
        };

        let updated = self.db.set_payment_status(&order_id, status).await?;
        if updated == 0 {
            warn!("[WEBHOOK] {} names unknown order {}", event.id, order_id);
            return Ok(WebhookAction::Ignored);
        }
        log!("[WEBHOOK] Order {} payment {}", order_id, status);
        Ok(match status {
            "captured" => WebhookAction::Captured { order_id },
            "failed" => WebhookAction::Failed { order_id },
            _ => WebhookAction::Refunded { order_id },
        })
    }
}

#[async_trait]
impl PaymentWebhookProcessor for StripeWebhookProcessor {
    async fn process_webhook(
        &self,
        signature: &str,
        raw_body: &[u8],
    ) -> Result<WebhookOutcome, PaymentError> {
        let secret = self.secret.as_deref().ok_or(PaymentError::MissingSecret)?;
        verify_signature(secret, signature, raw_body, chrono::Utc::now().timestamp())?;

        let event: StripeEvent = serde_json::from_slice(raw_body)
            .map_err(|e| PaymentError::InvalidPayload(e.to_string()))?;
        let action = self.apply(&event).await?;
        Ok(WebhookOutcome {
            event_id: event.id,
            event_type: event.event_type,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{schema_db, seed_shop};
    use serde_json::json;

    const SECRET: &str = "whsec_test";

    #[test]
    fn test_signature_roundtrip() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign_payload(SECRET, 1_700_000_000, body).unwrap();
        assert!(verify_signature(SECRET, &header, body, 1_700_000_010).is_ok());
    }

    #[test]
    fn test_rejects_tampered_body_and_wrong_secret() {
        let body = br#"{"id":"evt_1"}"#;
        let header = sign_payload(SECRET, 1_700_000_000, body).unwrap();
        assert!(matches!(
            verify_signature(SECRET, &header, br#"{"id":"evt_2"}"#, 1_700_000_000),
            Err(PaymentError::SignatureMismatch)
        ));
        assert!(matches!(
            verify_signature("whsec_other", &header, body, 1_700_000_000),
            Err(PaymentError::SignatureMismatch)
        ));
    }

    #[test]
    fn test_rejects_stale_timestamp() {
        let body = b"{}";
        let header = sign_payload(SECRET, 1_700_000_000, body).unwrap();
        assert!(matches!(
            verify_signature(SECRET, &header, body, 1_700_000_000 + SIGNATURE_TOLERANCE_SECS + 1),
            Err(PaymentError::StaleTimestamp)
        ));
    }

    #[test]
    fn test_extreme_timestamps_are_stale() {
        let body = b"{}";
        for timestamp in [i64::MIN, i64::MAX] {
            let header = sign_payload(SECRET, timestamp, body).unwrap();
            assert!(matches!(
                verify_signature(SECRET, &header, body, 1_700_000_000),
                Err(PaymentError::StaleTimestamp)
            ));
        }
        let header = sign_payload(SECRET, 1_700_000_000, body).unwrap();
        assert!(matches!(
            verify_signature(SECRET, &header, body, i64::MIN),
            Err(PaymentError::StaleTimestamp)
        ));
    }

    #[test]
    fn test_header_with_multiple_signatures() {
        let body = b"{}";
        let good = sign_payload(SECRET, 1_700_000_000, body).unwrap();
        let good_sig = good.split("v1=").nth(1).unwrap();
        let header = format!("t=1700000000,v1={},v0=legacy,v1={}", "00".repeat(32), good_sig);
        assert!(verify_signature(SECRET, &header, body, 1_700_000_000).is_ok());
        assert!(matches!(
            verify_signature(SECRET, "v1=abcd", body, 0),
            Err(PaymentError::MalformedHeader)
        ));
    }

    #[tokio::test]
    async fn test_payment_succeeded_captures_order() {
        let db = Arc::new(schema_db().await);
        let shop = seed_shop(&db).await;
        let processor = StripeWebhookProcessor::new(db.clone(), Some(SECRET.to_string()));

        let body = serde_json::to_vec(&json!({
            "id": "evt_1",
            "type": "payment_intent.succeeded",
            "data": {"object": {"id": "pi_1", "metadata": {"order_id": shop.order_id}}}
        }))
        .unwrap();
        let header = sign_payload(SECRET, chrono::Utc::now().timestamp(), &body).unwrap();

        let outcome = processor.process_webhook(&header, &body).await.unwrap();
        assert_eq!(
            outcome.action,
            WebhookAction::Captured {
                order_id: shop.order_id.clone()
            }
        );
        let order = db.get_order(&shop.order_id).await.unwrap().unwrap();
        assert_eq!(order.payment_status, "captured");
    }

    #[tokio::test]
    async fn test_unhandled_event_is_ignored() {
        let db = Arc::new(schema_db().await);
        let processor = StripeWebhookProcessor::new(db, Some(SECRET.to_string()));
        let body = br#"{"id":"evt_2","type":"customer.created","data":{"object":{}}}"#;
        let header = sign_payload(SECRET, chrono::Utc::now().timestamp(), body).unwrap();
        let outcome = processor.process_webhook(&header, body).await.unwrap();
        assert_eq!(outcome.action, WebhookAction::Ignored);
    }

    #[tokio::test]
    async fn test_missing_secret_fails() {
        let db = Arc::new(schema_db().await);
        let processor = StripeWebhookProcessor::new(db, None);
        assert!(matches!(
            processor.process_webhook("t=1,v1=00", b"{}").await,
            Err(PaymentError::MissingSecret)
        ));
    }
}
