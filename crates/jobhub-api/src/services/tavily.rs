//! Tavily Extract API client.
//!
//! Fetches the readable content of a job posting page so the client can
//! prefill a listing from a URL.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    urls: [&'a str; 1],
    include_images: bool,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    results: Vec<ExtractResult>,
    #[serde(default)]
    failed_results: Vec<FailedResult>,
}

#[derive(Debug, Deserialize)]
struct ExtractResult {
    url: String,
    #[serde(default)]
    raw_content: String,
    #[serde(default)]
    images: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FailedResult {
    #[serde(default)]
    error: String,
}

/// Content extracted from one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedPage {
    pub url: String,
    pub content: String,
    pub images: Vec<String>,
}

/// Tavily API client.
#[derive(Clone)]
pub struct TavilyClient {
    api_key: String,
    base_url: String,
    client: Client,
}

impl TavilyClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to build Tavily client: {}", e)))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Extract the content of `url`.
    pub async fn extract(&self, url: &str) -> ApiResult<ExtractedPage> {
        let request = ExtractRequest {
            urls: [url],
            include_images: true,
        };

        let response = self
            .client
            .post(format!("{}/extract", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::upstream(format!("Tavily request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, "Tavily extract failed");
            return Err(ApiError::upstream(format!(
                "Tavily API returned {}: {}",
                status, error_text
            )));
        }

        let body: ExtractResponse = response
            .json()
            .await
            .map_err(|e| ApiError::upstream(format!("Failed to parse Tavily response: {}", e)))?;

        match body.results.into_iter().next() {
            Some(result) => {
                info!(url = %result.url, chars = result.raw_content.len(), "Extracted page content");
                Ok(ExtractedPage {
                    url: result.url,
                    content: result.raw_content,
                    images: result.images,
                })
            }
            None => {
                let reason = body
                    .failed_results
                    .into_iter()
                    .next()
                    .map(|f| f.error)
                    .filter(|e| !e.is_empty())
                    .unwrap_or_else(|| "no content returned".to_string());
                Err(ApiError::upstream(format!("Tavily could not extract {}: {}", url, reason)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> TavilyClient {
        TavilyClient::new("tvly-test", server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_extract_returns_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract"))
            .and(header("Authorization", "Bearer tvly-test"))
            .and(body_partial_json(json!({"urls": ["https://acme.example/jobs/1"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "url": "https://acme.example/jobs/1",
                    "raw_content": "Senior Developer at Acme",
                    "images": ["https://acme.example/logo.png"]
                }],
                "failed_results": [],
                "response_time": 0.4
            })))
            .mount(&server)
            .await;

        let page = client(&server)
            .extract("https://acme.example/jobs/1")
            .await
            .unwrap();
        assert_eq!(page.content, "Senior Developer at Acme");
        assert_eq!(page.images.len(), 1);
    }

    #[tokio::test]
    async fn test_extract_failure_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [],
                "failed_results": [{"url": "https://x.example", "error": "blocked"}]
            })))
            .mount(&server)
            .await;

        let err = client(&server).extract("https://x.example").await.unwrap_err();
        match err {
            ApiError::Upstream(msg) => assert!(msg.contains("blocked")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_error_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/extract"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        assert!(matches!(
            client(&server).extract("https://x.example").await,
            Err(ApiError::Upstream(_))
        ));
    }
}
