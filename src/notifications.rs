//! Notification providers. Email goes out through the Resend API; without an
//! API key the local provider logs and keeps the notifications in memory.
use async_trait::async_trait;
use leptos::logging::{log, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::config::StoreConfig;
use crate::db::new_id;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

pub const TEMPLATE_ORDER_SHIPPED: &str = "order-shipped";
pub const TEMPLATE_REVIEW_APPROVED: &str = "review-approved";

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("channel '{0}' is not supported, only 'email'")]
    UnsupportedChannel(String),
    #[error("unknown notification template '{0}'")]
    UnknownTemplate(String),
    #[error("template '{template}' requires '{field}'")]
    MissingData {
        template: &'static str,
        field: &'static str,
    },
    #[error("notification provider misconfigured: {0}")]
    Misconfigured(String),
    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub channel: String,
    pub template: String,
    pub data: Value,
}

impl Notification {
    pub fn email(to: &str, template: &str, data: Value) -> Self {
        Notification {
            to: to.to_string(),
            channel: "email".to_string(),
            template: template.to_string(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationReceipt {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait NotificationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, notification: &Notification)
        -> Result<NotificationReceipt, NotificationError>;
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn required_str<'a>(
    data: &'a Value,
    template: &'static str,
    field: &'static str,
) -> Result<&'a str, NotificationError> {
    data.get(field)
        .and_then(Value::as_str)
        .ok_or(NotificationError::MissingData { template, field })
}

pub fn render_template(template: &str, data: &Value) -> Result<RenderedEmail, NotificationError> {
    match template {
        TEMPLATE_ORDER_SHIPPED => {
            let display_id = data.get("order_display_id").and_then(Value::as_i64).ok_or(
                NotificationError::MissingData {
                    template: TEMPLATE_ORDER_SHIPPED,
                    field: "order_display_id",
                },
            )?;
            let tracking: Vec<String> = data
                .get("tracking_numbers")
                .and_then(Value::as_array)
                .map(|numbers| {
                    numbers
                        .iter()
                        .filter_map(Value::as_str)
                        .map(|n| format!("<li>{}</li>", escape_html(n)))
                        .collect()
                })
                .unwrap_or_default();
            let greeting = data
                .get("customer_name")
                .and_then(Value::as_str)
                .map(|name| format!("Hi {},", escape_html(name)))
                .unwrap_or_else(|| "Hi,".to_string());
            let tracking_html = if tracking.is_empty() {
                String::new()
            } else {
                format!("<p>Tracking numbers:</p><ul>{}</ul>", tracking.join(""))
            };
            Ok(RenderedEmail {
                subject: format!("Your order #{} has shipped", display_id),
                html: format!(
                    "<p>{}</p><p>Good news: order #{} is on its way.</p>{}",
                    greeting, display_id, tracking_html
                ),
            })
        }
        TEMPLATE_REVIEW_APPROVED => {
            let first_name = required_str(data, TEMPLATE_REVIEW_APPROVED, "first_name")?;
            let product_title = required_str(data, TEMPLATE_REVIEW_APPROVED, "product_title")?;
            let product = match data.get("product_url").and_then(Value::as_str) {
                Some(url) => format!(
                    "<a href=\"{}\">{}</a>",
                    escape_html(url),
                    escape_html(product_title)
                ),
                None => escape_html(product_title),
            };
            Ok(RenderedEmail {
                subject: "Your review is live".to_string(),
                html: format!(
                    "<p>Hi {},</p><p>Thanks for reviewing {}. Your review is now visible in the store.</p>",
                    escape_html(first_name),
                    product
                ),
            })
        }
        other => Err(NotificationError::UnknownTemplate(other.to_string())),
    }
}

fn ensure_email_channel(notification: &Notification) -> Result<(), NotificationError> {
    if notification.channel != "email" {
        return Err(NotificationError::UnsupportedChannel(
            notification.channel.clone(),
        ));
    }
    Ok(())
}

pub struct ResendNotificationProvider {
    client: reqwest::Client,
    api_key: String,
    from: String,
    endpoint: String,
}

impl ResendNotificationProvider {
    pub fn new(api_key: &str, from: &str) -> Result<Self, NotificationError> {
        if api_key.trim().is_empty() {
            return Err(NotificationError::Misconfigured(
                "RESEND_API_KEY is required".to_string(),
            ));
        }
        if from.trim().is_empty() {
            return Err(NotificationError::Misconfigured(
                "RESEND_FROM_EMAIL is required".to_string(),
            ));
        }
        Ok(ResendNotificationProvider {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            from: from.to_string(),
            endpoint: RESEND_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

#[async_trait]
impl NotificationProvider for ResendNotificationProvider {
    fn name(&self) -> &'static str {
        "resend"
    }

    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<NotificationReceipt, NotificationError> {
        ensure_email_channel(notification)?;
        let email = render_template(&notification.template, &notification.data)?;

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "from": self.from,
                "to": [notification.to],
                "subject": email.subject,
                "html": email.html,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                "[NOTIFICATION] Resend rejected '{}' to {}: {}",
                notification.template, notification.to, status
            );
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let sent: ResendResponse = response.json().await?;
        log!(
            "[NOTIFICATION] Sent '{}' to {} (id {})",
            notification.template,
            notification.to,
            sent.id
        );
        Ok(NotificationReceipt { id: sent.id })
    }
}

/// Development provider: renders, logs and remembers every notification.
#[derive(Default)]
pub struct LocalNotificationProvider {
    sent: Mutex<Vec<Notification>>,
}

impl LocalNotificationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationProvider for LocalNotificationProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<NotificationReceipt, NotificationError> {
        ensure_email_channel(notification)?;
        let email = render_template(&notification.template, &notification.data)?;
        log!(
            "[NOTIFICATION] (local) to {}: {}",
            notification.to,
            email.subject
        );
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        Ok(NotificationReceipt {
            id: new_id("noti"),
        })
    }
}

/// Resend when an API key is configured, otherwise the local provider.
pub fn provider_from_config(
    config: &StoreConfig,
) -> Result<Arc<dyn NotificationProvider>, NotificationError> {
    match &config.resend_api_key {
        Some(api_key) => {
            let from = config.resend_from.as_deref().unwrap_or_default();
            Ok(Arc::new(ResendNotificationProvider::new(api_key, from)?))
        }
        None => {
            warn!("[NOTIFICATION] RESEND_API_KEY not set, notifications stay local");
            Ok(Arc::new(LocalNotificationProvider::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_shipped_template() {
        let email = render_template(
            TEMPLATE_ORDER_SHIPPED,
            &json!({
                "order_display_id": 7,
                "customer_name": "Frodo",
                "tracking_numbers": ["TRK<1>"],
            }),
        )
        .unwrap();
        assert_eq!(email.subject, "Your order #7 has shipped");
        assert!(email.html.contains("Hi Frodo,"));
        assert!(email.html.contains("<li>TRK&lt;1&gt;</li>"));
    }

    #[test]
    fn test_template_errors() {
        assert!(matches!(
            render_template("welcome", &json!({})),
            Err(NotificationError::UnknownTemplate(_))
        ));
        assert!(matches!(
            render_template(TEMPLATE_REVIEW_APPROVED, &json!({"first_name": "Sam"})),
            Err(NotificationError::MissingData {
                field: "product_title",
                ..
            })
        ));
    }

    #[test]
    fn test_review_approved_links_product_page() {
        let email = render_template(
            TEMPLATE_REVIEW_APPROVED,
            &json!({
                "first_name": "Sam",
                "product_title": "Elven Rope",
                "product_url": "https://burrowmart.shop/products/prod_1",
            }),
        )
        .unwrap();
        assert!(email
            .html
            .contains("<a href=\"https://burrowmart.shop/products/prod_1\">Elven Rope</a>"));
    }

    #[test]
    fn test_resend_requires_configuration() {
        assert!(ResendNotificationProvider::new("", "store@example.com").is_err());
        assert!(ResendNotificationProvider::new("re_123", " ").is_err());
        assert!(ResendNotificationProvider::new("re_123", "store@example.com").is_ok());
    }

    #[tokio::test]
    async fn test_local_provider_records_and_rejects_sms() {
        let provider = LocalNotificationProvider::new();
        let notification = Notification::email(
            "sam@shire.me",
            TEMPLATE_REVIEW_APPROVED,
            json!({"first_name": "Sam", "product_title": "Elven Rope"}),
        );
        provider.send(&notification).await.unwrap();
        assert_eq!(provider.sent(), vec![notification.clone()]);

        let sms = Notification {
            channel: "sms".into(),
            ..notification
        };
        assert!(matches!(
            provider.send(&sms).await,
            Err(NotificationError::UnsupportedChannel(_))
        ));
    }

    /// Requests seen by the stand-in email API: Authorization header and JSON body.
    #[derive(Default)]
    struct CapturedEmails {
        requests: Mutex<Vec<(Option<String>, Value)>>,
    }

    async fn capture_email(
        req: actix_web::HttpRequest,
        body: actix_web::web::Json<Value>,
        captured: actix_web::web::Data<CapturedEmails>,
    ) -> actix_web::HttpResponse {
        let auth = req
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        captured.requests.lock().unwrap().push((auth, body.into_inner()));
        match req.path() {
            "/emails" => actix_web::HttpResponse::Ok().json(json!({ "id": "email_123" })),
            "/overloaded" => actix_web::HttpResponse::ServiceUnavailable().body("try later"),
            _ => actix_web::HttpResponse::UnprocessableEntity().body("invalid `from` field"),
        }
    }

    /// Serves `capture_email` on an ephemeral local port.
    fn email_api() -> (String, actix_web::web::Data<CapturedEmails>) {
        use actix_web::{web, App, HttpServer};

        let captured = web::Data::new(CapturedEmails::default());
        let data = captured.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .default_service(web::post().to(capture_email))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());
        (format!("http://{}", addr), captured)
    }

    fn approved_review() -> Notification {
        Notification::email(
            "sam@shire.me",
            TEMPLATE_REVIEW_APPROVED,
            json!({"first_name": "Sam", "product_title": "Elven Rope"}),
        )
    }

    #[actix_web::test]
    async fn test_resend_posts_email_and_returns_receipt() {
        let (base, captured) = email_api();
        let provider = ResendNotificationProvider::new("re_test", "store@burrowmart.shop")
            .unwrap()
            .with_endpoint(&format!("{}/emails", base));

        let receipt = provider.send(&approved_review()).await.unwrap();
        assert_eq!(receipt.id, "email_123");

        let requests = captured.requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 1);
        let (auth, body) = &requests[0];
        assert_eq!(auth.as_deref(), Some("Bearer re_test"));
        let rendered = render_template(
            TEMPLATE_REVIEW_APPROVED,
            &json!({"first_name": "Sam", "product_title": "Elven Rope"}),
        )
        .unwrap();
        assert_eq!(
            body,
            &json!({
                "from": "store@burrowmart.shop",
                "to": ["sam@shire.me"],
                "subject": rendered.subject,
                "html": rendered.html,
            })
        );
    }

    #[actix_web::test]
    async fn test_resend_error_statuses_are_rejections() {
        let (base, captured) = email_api();

        let provider = ResendNotificationProvider::new("re_test", "nobody")
            .unwrap()
            .with_endpoint(&format!("{}/invalid", base));
        match provider.send(&approved_review()).await {
            Err(NotificationError::Rejected { status, body }) => {
                assert_eq!(status, 422);
                assert_eq!(body, "invalid `from` field");
            }
            other => panic!("expected a rejection, got {:?}", other),
        }

        let provider = ResendNotificationProvider::new("re_test", "store@burrowmart.shop")
            .unwrap()
            .with_endpoint(&format!("{}/overloaded", base));
        assert!(matches!(
            provider.send(&approved_review()).await,
            Err(NotificationError::Rejected { status: 503, .. })
        ));

        // Nothing is sent for a template that fails to render
        let broken = Notification::email("sam@shire.me", "welcome", json!({}));
        assert!(matches!(
            provider.send(&broken).await,
            Err(NotificationError::UnknownTemplate(_))
        ));
        assert_eq!(captured.requests.lock().unwrap().len(), 2);
    }
}
