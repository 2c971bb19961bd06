use actix_web::{web, HttpRequest, HttpResponse};
use leptos::logging::{error, log};
use serde_json::json;

use crate::container::Container;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Stripe webhook ingress. The raw body is handed to the payment processor
/// untouched; any failure is a 400 and nothing is retried here.
pub async fn stripe_webhook(
    container: web::Data<Container>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let Some(signature) = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
    else {
        log!("[WEBHOOK] Rejected request without {} header", SIGNATURE_HEADER);
        return HttpResponse::BadRequest()
            .json(json!({ "message": "Missing stripe-signature header" }));
    };

    match container.payments.process_webhook(signature, &body).await {
        Ok(outcome) => {
            log!(
                "[WEBHOOK] Processed {} ({})",
                outcome.event_id,
                outcome.event_type
            );
            HttpResponse::Ok().json(json!({
                "received": true,
                "event_type": outcome.event_type,
            }))
        }
        Err(err) => {
            error!("[WEBHOOK] Processing failed: {}", err);
            HttpResponse::BadRequest().json(json!({ "message": format!("Webhook Error: {}", err) }))
        }
    }
}
