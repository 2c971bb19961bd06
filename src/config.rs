use leptos::logging::warn;
use std::env;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite://burrowmart.db";
const DEFAULT_SECRET: &str = "supersecret";
const DEFAULT_BACKEND_URL: &str = "http://localhost:9000";
const DEFAULT_COMPANY_NAME: &str = "Burrowmart";
const DEFAULT_COMPANY_EMAIL: &str = "hello@burrowmart.shop";
const DEFAULT_SANITY_DATASET: &str = "production";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SanityConfig {
    pub project_id: String,
    pub dataset: String,
    pub token: Option<String>,
}

/// Startup configuration, read once from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub database_path: String,
    pub store_cors: Vec<String>,
    pub admin_cors: Vec<String>,
    pub auth_cors: Vec<String>,
    pub jwt_secret: String,
    pub cookie_secret: String,
    pub resend_api_key: Option<String>,
    pub resend_from: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub backend_url: String,
    pub publishable_key: Option<String>,
    pub sanity: Option<SanityConfig>,
    pub company_name: String,
    pub company_email: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_path =
            parse_database_url(&get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into()))?;

        let jwt_secret = get("JWT_SECRET").unwrap_or_else(|| {
            warn!("[CONFIG] JWT_SECRET not set, using the development default");
            DEFAULT_SECRET.to_string()
        });
        let cookie_secret = get("COOKIE_SECRET").unwrap_or_else(|| DEFAULT_SECRET.to_string());

        let backend_url = get("BACKEND_URL").unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        if !(backend_url.starts_with("http://") || backend_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "BACKEND_URL",
                reason: format!("'{}' is not an http(s) URL", backend_url),
            });
        }

        let sanity = get("SANITY_PROJECT_ID").map(|project_id| SanityConfig {
            project_id,
            dataset: get("SANITY_DATASET").unwrap_or_else(|| DEFAULT_SANITY_DATASET.to_string()),
            token: get("SANITY_API_TOKEN"),
        });

        Ok(StoreConfig {
            database_path,
            store_cors: split_origins(get("STORE_CORS")),
            admin_cors: split_origins(get("ADMIN_CORS")),
            auth_cors: split_origins(get("AUTH_CORS")),
            jwt_secret,
            cookie_secret,
            resend_api_key: get("RESEND_API_KEY"),
            resend_from: get("RESEND_FROM_EMAIL"),
            stripe_webhook_secret: get("STRIPE_WEBHOOK_SECRET"),
            backend_url: backend_url.trim_end_matches('/').to_string(),
            publishable_key: get("PUBLISHABLE_KEY"),
            sanity,
            company_name: get("COMPANY_NAME").unwrap_or_else(|| DEFAULT_COMPANY_NAME.to_string()),
            company_email: get("COMPANY_EMAIL").unwrap_or_else(|| DEFAULT_COMPANY_EMAIL.to_string()),
        })
    }

    /// Configuration for tests: in-memory database, fixed secrets.
    pub fn for_tests() -> Self {
        StoreConfig {
            database_path: ":memory:".to_string(),
            store_cors: vec![],
            admin_cors: vec![],
            auth_cors: vec![],
            jwt_secret: "test-jwt-secret".to_string(),
            cookie_secret: "test-cookie-secret".to_string(),
            resend_api_key: None,
            resend_from: None,
            stripe_webhook_secret: Some("whsec_test".to_string()),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            publishable_key: None,
            sanity: None,
            company_name: DEFAULT_COMPANY_NAME.to_string(),
            company_email: DEFAULT_COMPANY_EMAIL.to_string(),
        }
    }
}

/// Accepts `sqlite://path`, `sqlite:path`, `:memory:` or a bare file path.
fn parse_database_url(url: &str) -> Result<String, ConfigError> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);
    if path.is_empty() {
        return Err(ConfigError::Invalid {
            key: "DATABASE_URL",
            reason: "missing database path".to_string(),
        });
    }
    if path.contains("://") {
        return Err(ConfigError::Invalid {
            key: "DATABASE_URL",
            reason: format!("unsupported scheme in '{}'", url),
        });
    }
    Ok(path.to_string())
}

fn split_origins(raw: Option<String>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(|origin| origin.trim().trim_end_matches('/').to_string())
            .filter(|origin| !origin.is_empty())
            .collect()
    })
    .unwrap_or_default()
}
