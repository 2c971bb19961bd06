use actix_web::cookie::{Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use leptos::logging::{log, warn};
use serde_json::json;

use crate::auth::{header_token, seal_session, verify_token, AuthError, AUTH_COOKIE};
use crate::container::Container;
use crate::error::StoreError;

fn session_cookie(value: String, secure: bool) -> Cookie<'static> {
    Cookie::build(AUTH_COOKIE, value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(secure)
        .finish()
}

/// Trades a bearer token for a sealed session cookie, so the storefront can
/// authenticate without script access to the token.
pub async fn create_session(container: web::Data<Container>, req: HttpRequest) -> HttpResponse {
    let result = header_token(&req)
        .ok_or(AuthError::MissingToken)
        .and_then(|token| {
            let claims = verify_token(
                &token,
                &container.config.jwt_secret,
                chrono::Utc::now().timestamp(),
            )?;
            let sealed = seal_session(&token, &container.config.cookie_secret)?;
            Ok((claims, sealed))
        });

    match result {
        Ok((claims, sealed)) => {
            log!("[API] Session opened for {}", claims.actor_id);
            let secure = container.config.backend_url.starts_with("https://");
            HttpResponse::Ok()
                .cookie(session_cookie(sealed, secure))
                .json(json!({
                    "user": { "actor_id": claims.actor_id, "actor_type": claims.actor_type }
                }))
        }
        Err(err) => {
            warn!("[API] Session refused: {}", err);
            StoreError::from(err).error_response()
        }
    }
}

pub async fn delete_session() -> HttpResponse {
    let mut removal = session_cookie(String::new(), false);
    removal.make_removal();
    HttpResponse::Ok()
        .cookie(removal)
        .json(json!({ "success": true }))
}
