//! Bearer tokens for customers and admin users.
//!
//! Tokens are compact JWTs signed with HS256 over the configured `JWT_SECRET`.
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::future::{ready, Ready};
use thiserror::Error;

use crate::container::Container;
use crate::error::StoreError;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;
pub const AUTH_COOKIE: &str = "_burrow_jwt";
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 60 * 60 * 24;

#[derive(Debug, Error, PartialEq)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("token is not valid for this actor type")]
    WrongActor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorType {
    Customer,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub actor_id: String,
    pub actor_type: ActorType,
    pub exp: i64,
}

pub fn sign_token(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    let header = URL_SAFE_NO_PAD.encode(TOKEN_HEADER);
    let payload =
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).map_err(|_| AuthError::Malformed)?);
    let signing_input = format!("{}.{}", header, payload);
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::Malformed)?;
    mac.update(signing_input.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{}.{}", signing_input, signature))
}

/// Issues a token for `actor_id` that expires `ttl_secs` from now.
pub fn issue_token(
    actor_id: &str,
    actor_type: ActorType,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, AuthError> {
    let claims = Claims {
        actor_id: actor_id.to_string(),
        actor_type,
        exp: chrono::Utc::now().timestamp() + ttl_secs,
    };
    sign_token(&claims, secret)
}

pub fn verify_token(token: &str, secret: &str, now: i64) -> Result<Claims, AuthError> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(AuthError::Malformed);
    };

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::Malformed)?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let expected = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| AuthError::Malformed)?;
    mac.verify_slice(&expected)
        .map_err(|_| AuthError::InvalidSignature)?;

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| AuthError::Malformed)?;
    let claims: Claims =
        serde_json::from_slice(&payload_bytes).map_err(|_| AuthError::Malformed)?;
    if claims.exp <= now {
        return Err(AuthError::Expired);
    }
    Ok(claims)
}

fn cookie_mac(token: &str, cookie_secret: &str) -> Result<HmacSha256, AuthError> {
    let mut mac =
        HmacSha256::new_from_slice(cookie_secret.as_bytes()).map_err(|_| AuthError::Malformed)?;
    mac.update(token.as_bytes());
    Ok(mac)
}

/// Session cookie value: the token followed by `~` and an HMAC tag keyed by
/// `COOKIE_SECRET`.
pub fn seal_session(token: &str, cookie_secret: &str) -> Result<String, AuthError> {
    let tag = cookie_mac(token, cookie_secret)?.finalize().into_bytes();
    Ok(format!("{}~{}", token, hex::encode(tag)))
}

/// Returns the token inside a session cookie value once its tag checks out.
pub fn open_session(value: &str, cookie_secret: &str) -> Result<String, AuthError> {
    let (token, tag) = value.rsplit_once('~').ok_or(AuthError::Malformed)?;
    let tag = hex::decode(tag).map_err(|_| AuthError::Malformed)?;
    cookie_mac(token, cookie_secret)?
        .verify_slice(&tag)
        .map_err(|_| AuthError::InvalidSignature)?;
    Ok(token.to_string())
}

pub fn header_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// The bearer header wins over the session cookie.
fn request_token(req: &HttpRequest, cookie_secret: &str) -> Result<String, AuthError> {
    if let Some(token) = header_token(req) {
        return Ok(token);
    }
    let cookie = req.cookie(AUTH_COOKIE).ok_or(AuthError::MissingToken)?;
    open_session(cookie.value(), cookie_secret)
}

fn authenticate(req: &HttpRequest, expected: ActorType) -> Result<Claims, StoreError> {
    let container = req
        .app_data::<web::Data<Container>>()
        .ok_or_else(|| StoreError::Invalid("container not registered".to_string()))?;
    let token = request_token(req, &container.config.cookie_secret)?;
    let claims = verify_token(
        &token,
        &container.config.jwt_secret,
        chrono::Utc::now().timestamp(),
    )?;
    if claims.actor_type != expected {
        return Err(AuthError::WrongActor.into());
    }
    Ok(claims)
}

/// Extractor for routes under `/store/customers/me`.
#[derive(Debug, Clone)]
pub struct AuthenticatedCustomer {
    pub customer_id: String,
}

impl FromRequest for AuthenticatedCustomer {
    type Error = StoreError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req, ActorType::Customer).map(|claims| AuthenticatedCustomer {
            customer_id: claims.actor_id,
        }))
    }
}

/// Extractor for `/admin` routes.
#[derive(Debug, Clone)]
pub struct AuthenticatedAdmin {
    pub user_id: String,
}

impl FromRequest for AuthenticatedAdmin {
    type Error = StoreError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req, ActorType::User).map(|claims| AuthenticatedAdmin {
            user_id: claims.actor_id,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn claims(exp: i64) -> Claims {
        Claims {
            actor_id: "cus_01".into(),
            actor_type: ActorType::Customer,
            exp,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let token = sign_token(&claims(2_000), SECRET).unwrap();
        let verified = verify_token(&token, SECRET, 1_000).unwrap();
        assert_eq!(verified, claims(2_000));
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let token = sign_token(&claims(2_000), SECRET).unwrap();
        assert_eq!(
            verify_token(&token, "other", 1_000),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_rejects_expired() {
        let token = sign_token(&claims(2_000), SECRET).unwrap();
        assert_eq!(verify_token(&token, SECRET, 2_000), Err(AuthError::Expired));
    }

    #[test]
    fn test_rejects_tampered_payload() {
        let token = sign_token(&claims(2_000), SECRET).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&Claims {
                actor_type: ActorType::User,
                ..claims(2_000)
            })
            .unwrap(),
        );
        parts[1] = &forged;
        assert_eq!(
            verify_token(&parts.join("."), SECRET, 1_000),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_session_cookie_roundtrip_and_tampering() {
        let token = sign_token(&claims(2_000), SECRET).unwrap();
        let sealed = seal_session(&token, "cookie-secret").unwrap();
        assert_eq!(open_session(&sealed, "cookie-secret").unwrap(), token);
        assert_eq!(
            open_session(&sealed, "other-cookie-secret"),
            Err(AuthError::InvalidSignature)
        );
        // A bare token without its tag is not a session
        assert_eq!(open_session(&token, "cookie-secret"), Err(AuthError::Malformed));
        let swapped = sealed.replacen(&token, &sign_token(&claims(9_000), SECRET).unwrap(), 1);
        assert_eq!(
            open_session(&swapped, "cookie-secret"),
            Err(AuthError::InvalidSignature)
        );
    }

    #[test]
    fn test_rejects_malformed() {
        assert_eq!(verify_token("abc", SECRET, 0), Err(AuthError::Malformed));
        assert_eq!(verify_token("a.b.c.d", SECRET, 0), Err(AuthError::Malformed));
    }
}
