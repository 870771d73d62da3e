//! API configuration.

use std::fmt;
use std::time::Duration;

use jobhub_models::{SearchLimits, DEFAULT_FREE_SEARCH_LIMIT, PREMIUM_SEARCH_LIMIT};

/// Which document store backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Appwrite Databases over REST.
    Appwrite,
    /// Process-local store; data is lost on restart.
    Memory,
}

impl StoreBackend {
    /// Parse from string (case-insensitive). Unknown values select Appwrite.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "memory" | "in-memory" | "inmemory" => StoreBackend::Memory,
            _ => StoreBackend::Appwrite,
        }
    }
}

/// API server configuration.
#[derive(Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Timeout for ordinary API routes
    pub request_timeout: Duration,
    /// Timeout for the AI enrichment route
    pub generation_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Public site origin used in sitemap and robots URLs, without trailing slash
    pub site_url: String,
    pub search_limits: SearchLimits,
    pub store_backend: StoreBackend,
    pub tavily_api_key: Option<String>,
    pub tavily_api_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_api_url: String,
    /// Bearer token the cron trigger must present. Unset disables the check.
    pub cron_secret: Option<String>,
    /// Jobs enriched per cron invocation
    pub enrichment_batch_size: u32,
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            request_timeout: Duration::from_secs(30),
            generation_timeout: Duration::from_secs(300),
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            site_url: "http://localhost:3000".to_string(),
            search_limits: SearchLimits::default(),
            store_backend: StoreBackend::Appwrite,
            tavily_api_key: None,
            tavily_api_url: "https://api.tavily.com".to_string(),
            gemini_api_key: None,
            gemini_api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            cron_secret: None,
            enrichment_batch_size: 5,
            metrics_enabled: true,
        }
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("ApiConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("cors_origins", &self.cors_origins)
            .field("rate_limit_rps", &self.rate_limit_rps)
            .field("request_timeout", &self.request_timeout)
            .field("generation_timeout", &self.generation_timeout)
            .field("max_body_size", &self.max_body_size)
            .field("environment", &self.environment)
            .field("site_url", &self.site_url)
            .field("search_limits", &self.search_limits)
            .field("store_backend", &self.store_backend)
            .field("tavily_api_key", &redact(&self.tavily_api_key))
            .field("gemini_api_key", &redact(&self.gemini_api_key))
            .field("cron_secret", &redact(&self.cron_secret))
            .field("enrichment_batch_size", &self.enrichment_batch_size)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn env_secret(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: env_parse("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            generation_timeout: env_parse("GENERATION_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.generation_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            site_url: std::env::var("SITE_URL")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_url),
            search_limits: SearchLimits {
                free: env_parse("FREE_SEARCH_LIMIT").unwrap_or(DEFAULT_FREE_SEARCH_LIMIT),
                premium: env_parse("PREMIUM_SEARCH_LIMIT").unwrap_or(PREMIUM_SEARCH_LIMIT),
            },
            store_backend: std::env::var("STORE_BACKEND")
                .map(|s| StoreBackend::from_str(&s))
                .unwrap_or(defaults.store_backend),
            tavily_api_key: env_secret("TAVILY_API_KEY"),
            tavily_api_url: std::env::var("TAVILY_API_URL").unwrap_or(defaults.tavily_api_url),
            gemini_api_key: env_secret("GEMINI_API_KEY"),
            gemini_api_url: std::env::var("GEMINI_API_URL").unwrap_or(defaults.gemini_api_url),
            cron_secret: env_secret("CRON_SECRET"),
            enrichment_batch_size: env_parse("ENRICHMENT_BATCH_SIZE")
                .unwrap_or(defaults.enrichment_batch_size),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}
