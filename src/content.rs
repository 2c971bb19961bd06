use leptos::logging::{log, warn};
use serde::Deserialize;
use thiserror::Error;

use crate::config::SanityConfig;
use crate::models::content::MarketingPage;

const SANITY_API_VERSION: &str = "v2023-05-03";

const PAGE_QUERY: &str = r#"*[_type == "page" && slug.current == $slug][0]{title, "slug": slug.current, "body": body[]{heading, "text": coalesce(text, pt::text(@))}}"#;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("content platform returned {0}")]
    Rejected(u16),
}

#[derive(Deserialize)]
struct QueryResponse<T> {
    result: Option<T>,
}

/// Read-only GROQ client for marketing pages.
#[derive(Clone)]
pub struct SanityClient {
    client: reqwest::Client,
    config: SanityConfig,
}

impl SanityClient {
    pub fn new(config: SanityConfig) -> Self {
        SanityClient {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn query_url(&self, query: &str, slug: &str) -> String {
        format!(
            "https://{}.api.sanity.io/{}/data/query/{}?query={}&$slug={}",
            self.config.project_id,
            SANITY_API_VERSION,
            self.config.dataset,
            urlencoding::encode(query),
            urlencoding::encode(&format!("\"{}\"", slug)),
        )
    }

    /// `Ok(None)` when no page has that slug.
    pub async fn fetch_page(&self, slug: &str) -> Result<Option<MarketingPage>, ContentError> {
        let url = self.query_url(PAGE_QUERY, slug);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("[CONTENT] Page '{}' query failed with {}", slug, status);
            return Err(ContentError::Rejected(status.as_u16()));
        }

        let body: QueryResponse<MarketingPage> = response.json().await?;
        log!(
            "[CONTENT] Page '{}' {}",
            slug,
            if body.result.is_some() { "found" } else { "missing" }
        );
        Ok(body.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(token: Option<&str>) -> SanityClient {
        SanityClient::new(SanityConfig {
            project_id: "burrow42".to_string(),
            dataset: "production".to_string(),
            token: token.map(str::to_string),
        })
    }

    #[test]
    fn test_query_url_encodes_query_and_slug() {
        let url = client(None).query_url("*[_type == \"page\"]", "about us");
        assert_eq!(
            url,
            "https://burrow42.api.sanity.io/v2023-05-03/data/query/production\
             ?query=%2A%5B_type%20%3D%3D%20%22page%22%5D&$slug=%22about%20us%22"
        );
    }

    #[test]
    fn test_page_response_without_result() {
        let body: QueryResponse<MarketingPage> = serde_json::from_str(r#"{"result": null}"#).unwrap();
        assert!(body.result.is_none());

        let body: QueryResponse<MarketingPage> = serde_json::from_str(
            r#"{"result": {"title": "About", "slug": "about", "body": [{"text": "Second breakfast."}]}}"#,
        )
        .unwrap();
        let page = body.result.unwrap();
        assert_eq!(page.slug, "about");
        assert_eq!(page.body[0].heading, None);
    }
}
