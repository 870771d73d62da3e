//! Appwrite Databases REST API client.
//!
//! Server-side client authenticated with a project API key:
//! - HTTP client tuning (pooling, timeouts)
//! - Optional retry with exponential backoff and jitter
//! - Observability (tracing spans, metrics)

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info_span, Instrument};

use crate::error::{AppwriteError, AppwriteResult, ErrorBody};
use crate::metrics::{record_documents_returned, record_request};
use crate::query::Query;
use crate::retry::{with_retry, RetryConfig};
use crate::types::{
    CreateDocumentRequest, Document, DocumentList, UpdateDocumentRequest, COUNT_CAP,
    MAX_PAGE_SIZE, UNIQUE_ID,
};

// =============================================================================
// Configuration
// =============================================================================

/// Collection ids for the three collections the backend uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionIds {
    pub jobs: String,
    pub profiles: String,
    pub search_usage: String,
}

impl Default for CollectionIds {
    fn default() -> Self {
        Self {
            jobs: "jobs".to_string(),
            profiles: "profiles".to_string(),
            search_usage: "search_usage".to_string(),
        }
    }
}

/// Appwrite client configuration.
#[derive(Clone)]
pub struct AppwriteConfig {
    /// API endpoint including the version segment, e.g. `https://cloud.appwrite.io/v1`
    pub endpoint: String,
    pub project_id: String,
    /// Server API key with databases scope
    pub api_key: String,
    pub database_id: String,
    pub collections: CollectionIds,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
}

impl fmt::Debug for AppwriteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppwriteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .field("database_id", &self.database_id)
            .field("collections", &self.collections)
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

impl AppwriteConfig {
    /// Create config from environment variables.
    pub fn from_env() -> AppwriteResult<Self> {
        let required = |key: &str| -> AppwriteResult<String> {
            match std::env::var(key) {
                Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
                Ok(_) => Err(AppwriteError::config(format!("{} cannot be empty", key))),
                Err(_) => Err(AppwriteError::config(format!(
                    "{} must be set to access Appwrite",
                    key
                ))),
            }
        };
        let optional = |key: &str, default: &str| -> String {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let secs = |key: &str, default: u64| -> Duration {
            Duration::from_secs(
                std::env::var(key)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default),
            )
        };

        let defaults = CollectionIds::default();

        Ok(Self {
            endpoint: optional("APPWRITE_ENDPOINT", "https://cloud.appwrite.io/v1"),
            project_id: required("APPWRITE_PROJECT_ID")?,
            api_key: required("APPWRITE_API_KEY")?,
            database_id: required("APPWRITE_DATABASE_ID")?,
            collections: CollectionIds {
                jobs: optional("APPWRITE_JOBS_COLLECTION_ID", &defaults.jobs),
                profiles: optional("APPWRITE_PROFILES_COLLECTION_ID", &defaults.profiles),
                search_usage: optional(
                    "APPWRITE_SEARCH_USAGE_COLLECTION_ID",
                    &defaults.search_usage,
                ),
            },
            timeout: secs("APPWRITE_TIMEOUT_SECS", 30),
            connect_timeout: secs("APPWRITE_CONNECT_TIMEOUT_SECS", 5),
            retry: RetryConfig::from_env(),
        })
    }
}

// =============================================================================
// Client
// =============================================================================

/// Appwrite Databases REST API client. Cheap to clone.
#[derive(Clone)]
pub struct AppwriteClient {
    http: Client,
    config: Arc<AppwriteConfig>,
    collections_url: String,
}

impl AppwriteClient {
    /// Create a new Appwrite client.
    pub fn new(config: AppwriteConfig) -> AppwriteResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Appwrite-Project",
            HeaderValue::from_str(&config.project_id)
                .map_err(|_| AppwriteError::config("APPWRITE_PROJECT_ID is not a valid header value"))?,
        );
        let mut key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| AppwriteError::config("APPWRITE_API_KEY is not a valid header value"))?;
        key.set_sensitive(true);
        headers.insert("X-Appwrite-Key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("jobhub-appwrite/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let collections_url = format!(
            "{}/databases/{}/collections",
            config.endpoint.trim_end_matches('/'),
            config.database_id
        );

        Ok(Self {
            http,
            config: Arc::new(config),
            collections_url,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> AppwriteResult<Self> {
        Self::new(AppwriteConfig::from_env()?)
    }

    pub fn collections(&self) -> &CollectionIds {
        &self.config.collections
    }

    fn documents_url(&self, collection: &str) -> String {
        format!("{}/{}/documents", self.collections_url, collection)
    }

    fn document_url(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/documents/{}", self.collections_url, collection, doc_id)
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// List documents matching `queries`.
    pub async fn list_documents<T: DeserializeOwned>(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> AppwriteResult<DocumentList<T>> {
        let url = self.documents_url(collection);
        let url = url.as_str();
        let params: Vec<(&str, String)> =
            queries.iter().map(|q| ("queries[]", q.to_string())).collect();
        let params = params.as_slice();

        let list: DocumentList<T> = self
            .execute("list_documents", collection, None, move || async move {
                let response = self.http.get(url).query(params).send().await?;
                Self::parse_response(response).await
            })
            .await?;

        record_documents_returned(collection, list.documents.len());
        Ok(list)
    }

    /// Get a document. Returns `None` when it does not exist.
    pub async fn get_document<T: DeserializeOwned>(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> AppwriteResult<Option<Document<T>>> {
        let url = self.document_url(collection, doc_id);
        let url = url.as_str();

        self.execute("get_document", collection, Some(doc_id), move || async move {
            let response = self.http.get(url).send().await?;
            if response.status() == StatusCode::NOT_FOUND {
                return Ok(None);
            }
            Self::parse_response(response).await.map(Some)
        })
        .await
    }

    /// Create a document. `doc_id = None` lets Appwrite generate one.
    pub async fn create_document<T>(
        &self,
        collection: &str,
        doc_id: Option<&str>,
        data: &T,
    ) -> AppwriteResult<Document<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let url = self.documents_url(collection);
        let url = url.as_str();
        let body = CreateDocumentRequest {
            document_id: doc_id.unwrap_or(UNIQUE_ID),
            data,
        };
        let body = &body;

        self.execute("create_document", collection, doc_id, move || async move {
            let response = self.http.post(url).json(body).send().await?;
            Self::parse_response(response).await
        })
        .await
    }

    /// Update a document, merging the attributes in `patch`.
    pub async fn update_document<P, T>(
        &self,
        collection: &str,
        doc_id: &str,
        patch: &P,
    ) -> AppwriteResult<Document<T>>
    where
        P: Serialize,
        T: DeserializeOwned,
    {
        let url = self.document_url(collection, doc_id);
        let url = url.as_str();
        let body = UpdateDocumentRequest { data: patch };
        let body = &body;

        self.execute("update_document", collection, Some(doc_id), move || async move {
            let response = self.http.patch(url).json(body).send().await?;
            Self::parse_response(response).await
        })
        .await
    }

    // =========================================================================
    // Counting
    // =========================================================================

    /// Exact number of documents matching `filters`.
    ///
    /// Appwrite stops counting at [`COUNT_CAP`]; past that the ids are paged
    /// through with `cursorAfter` so the result is never an undercount.
    pub async fn count_documents(&self, collection: &str, filters: &[Query]) -> AppwriteResult<u64> {
        let mut queries = filters.to_vec();
        queries.push(Query::select(&["$id"]));
        queries.push(Query::limit(1));

        let first: DocumentList<serde_json::Map<String, serde_json::Value>> =
            self.list_documents(collection, &queries).await?;
        if first.total < COUNT_CAP {
            return Ok(first.total);
        }

        debug!(collection = %collection, "Count reached Appwrite cap, paging for exact total");

        let mut total = 0u64;
        let mut cursor: Option<String> = None;
        loop {
            let mut queries = filters.to_vec();
            queries.push(Query::select(&["$id"]));
            queries.push(Query::limit(MAX_PAGE_SIZE));
            if let Some(ref last) = cursor {
                queries.push(Query::cursor_after(last));
            }

            let page: DocumentList<serde_json::Map<String, serde_json::Value>> =
                self.list_documents(collection, &queries).await?;
            let returned = page.documents.len();
            total += returned as u64;

            if returned < MAX_PAGE_SIZE as usize {
                return Ok(total);
            }
            cursor = page.documents.last().map(|d| d.id.clone());
        }
    }

    /// Cheap reachability check against a collection.
    pub async fn ping(&self, collection: &str) -> AppwriteResult<()> {
        let _: DocumentList<serde_json::Map<String, serde_json::Value>> = self
            .list_documents(collection, &[Query::select(&["$id"]), Query::limit(1)])
            .await?;
        Ok(())
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing, metrics and the configured retry policy.
    async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        op: F,
    ) -> AppwriteResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = AppwriteResult<T>>,
    {
        let span = match doc_id {
            Some(id) => info_span!("appwrite_request", operation = %operation, collection = %collection, doc_id = %id),
            None => info_span!("appwrite_request", operation = %operation, collection = %collection),
        };

        let start = Instant::now();
        let result = with_retry(&self.config.retry, operation, op)
            .instrument(span)
            .await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn parse_response<T: DeserializeOwned>(response: Response) -> AppwriteResult<T> {
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn error_from_response(response: Response) -> AppwriteError {
        let status = response.status().as_u16();
        let retry_after_ms = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let url = response.url().path().to_string();
        let body = response.text().await.unwrap_or_default();

        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody { message, kind: Some(kind) }) => format!("{} ({})", message, kind),
            Ok(ErrorBody { message, kind: None }) => message,
            Err(_) => body,
        };

        match AppwriteError::from_http_status(status, format!("{} failed: {}", url, message)) {
            AppwriteError::RateLimited(default_ms) => {
                AppwriteError::RateLimited(retry_after_ms.unwrap_or(default_ms))
            }
            other => other,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "APPWRITE_ENDPOINT",
            "APPWRITE_PROJECT_ID",
            "APPWRITE_API_KEY",
            "APPWRITE_DATABASE_ID",
            "APPWRITE_JOBS_COLLECTION_ID",
            "APPWRITE_CONNECT_TIMEOUT_SECS",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_config_requires_project_key_and_database() {
        clear_env();
        assert!(AppwriteConfig::from_env().is_err());

        std::env::set_var("APPWRITE_PROJECT_ID", "proj");
        std::env::set_var("APPWRITE_API_KEY", "key");
        assert!(AppwriteConfig::from_env().is_err());

        std::env::set_var("APPWRITE_DATABASE_ID", "main");
        assert!(AppwriteConfig::from_env().is_ok());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_defaults() {
        clear_env();
        std::env::set_var("APPWRITE_PROJECT_ID", "proj");
        std::env::set_var("APPWRITE_API_KEY", "key");
        std::env::set_var("APPWRITE_DATABASE_ID", "main");

        let config = AppwriteConfig::from_env().unwrap();
        assert_eq!(config.endpoint, "https://cloud.appwrite.io/v1");
        assert_eq!(config.collections, CollectionIds::default());
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_retries, 0);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_config_debug_redacts_key() {
        clear_env();
        std::env::set_var("APPWRITE_PROJECT_ID", "proj");
        std::env::set_var("APPWRITE_API_KEY", "super-secret");
        std::env::set_var("APPWRITE_DATABASE_ID", "main");

        let config = AppwriteConfig::from_env().unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        clear_env();
    }
}
