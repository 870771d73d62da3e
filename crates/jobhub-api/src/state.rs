//! Application state.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{ApiConfig, StoreBackend};
use crate::error::ApiResult;
use crate::services::{
    EnrichmentService, GeminiEnricher, JobQueryService, SearchUsageTracker, SitemapGenerator,
    TavilyClient,
};
use crate::store::{AppwriteStore, MemoryStore, ProfileStore, Stores};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub jobs: JobQueryService,
    pub usage: SearchUsageTracker,
    pub profiles: Arc<dyn ProfileStore>,
    pub sitemap: SitemapGenerator,
    /// `None` when no Tavily key is configured.
    pub tavily: Option<TavilyClient>,
    /// `None` when no Gemini key is configured.
    pub enrichment: Option<EnrichmentService>,
}

impl AppState {
    /// Create state for the configured store backend.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let stores = match config.store_backend {
            StoreBackend::Appwrite => Stores::appwrite(AppwriteStore::from_env()?),
            StoreBackend::Memory => {
                warn!("Using in-memory store; data is lost on restart");
                Stores::memory(Arc::new(MemoryStore::new()))
            }
        };

        Ok(Self::with_stores(config, stores)?)
    }

    /// Create state over explicit stores.
    pub fn with_stores(config: ApiConfig, stores: Stores) -> ApiResult<Self> {
        let jobs = JobQueryService::new(stores.jobs);
        let usage = SearchUsageTracker::new(
            stores.usage,
            Arc::clone(&stores.profiles),
            config.search_limits,
        );
        let sitemap = SitemapGenerator::new(config.site_url.clone());

        let tavily = match &config.tavily_api_key {
            Some(key) => Some(TavilyClient::new(
                key.clone(),
                config.tavily_api_url.clone(),
                config.request_timeout,
            )?),
            None => {
                info!("TAVILY_API_KEY not set; extraction endpoint disabled");
                None
            }
        };

        let enrichment = match &config.gemini_api_key {
            Some(key) => {
                let enricher = GeminiEnricher::new(
                    key.clone(),
                    config.gemini_api_url.clone(),
                    config.generation_timeout,
                )?;
                Some(EnrichmentService::new(
                    jobs.clone(),
                    enricher,
                    config.enrichment_batch_size,
                ))
            }
            None => {
                info!("GEMINI_API_KEY not set; enrichment endpoint disabled");
                None
            }
        };

        Ok(Self {
            config: Arc::new(config),
            jobs,
            usage,
            profiles: stores.profiles,
            sitemap,
            tavily,
            enrichment,
        })
    }
}
