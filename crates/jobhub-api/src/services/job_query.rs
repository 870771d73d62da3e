//! Job query façade.
//!
//! Shapes listing and search requests (trimming, defaults, limit clamping)
//! before handing them to the job store. Matching semantics belong to the
//! store.

use std::sync::Arc;

use tracing::debug;

use jobhub_models::{Job, JobId};

use crate::error::{ApiError, ApiResult};
use crate::store::JobStore;

/// Page size when the caller does not ask for one.
pub const DEFAULT_LIMIT: u32 = 20;

/// Largest page a caller may request.
pub const MAX_LIMIT: u32 = 100;

/// Location applied to searches that do not name one.
pub const DEFAULT_LOCATION: &str = "Remote";

/// Clamp a requested page size to `1..=MAX_LIMIT`.
pub fn clamp_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

/// Search results together with the inputs actually used.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub jobs: Vec<Job>,
    pub query: String,
    pub location: String,
}

#[derive(Clone)]
pub struct JobQueryService {
    store: Arc<dyn JobStore>,
}

impl JobQueryService {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, limit: Option<u32>, offset: Option<u32>) -> ApiResult<Vec<Job>> {
        let limit = clamp_limit(limit);
        let offset = offset.unwrap_or(0);
        Ok(self.store.list(limit, offset).await?)
    }

    pub async fn search(
        &self,
        query: &str,
        location: Option<&str>,
        limit: Option<u32>,
    ) -> ApiResult<SearchOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::bad_request("Search query is required"));
        }
        let location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_LOCATION);
        let limit = clamp_limit(limit);

        debug!(query = %query, location = %location, limit, "Searching jobs");
        let jobs = self.store.search(query, Some(location), limit).await?;

        Ok(SearchOutcome {
            jobs,
            query: query.to_string(),
            location: location.to_string(),
        })
    }

    /// Exact number of jobs.
    pub async fn count(&self) -> ApiResult<u64> {
        Ok(self.store.count().await?)
    }

    pub async fn get_by_slug(&self, slug: &str) -> ApiResult<Option<Job>> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(None);
        }
        Ok(self.store.get_by_slug(slug).await?)
    }

    /// `count` jobs starting at `offset`, in stable creation order.
    pub async fn range(&self, offset: u64, count: u64) -> ApiResult<Vec<Job>> {
        Ok(self.store.range(offset, count).await?)
    }

    pub async fn pending_enrichment(&self, limit: u32) -> ApiResult<Vec<Job>> {
        Ok(self.store.pending_enrichment(limit.clamp(1, MAX_LIMIT)).await?)
    }

    pub async fn set_enhanced_description(&self, id: &JobId, text: &str) -> ApiResult<()> {
        Ok(self.store.set_enhanced_description(id, text).await?)
    }

    pub async fn ping(&self) -> ApiResult<()> {
        Ok(self.store.ping().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::store::MemoryStore;

    fn job(id: &str, title: &str, location: &str) -> Job {
        Job {
            id: JobId::from(id),
            title: title.to_string(),
            company: "Acme".to_string(),
            location: location.to_string(),
            description: String::new(),
            apply_url: None,
            slug: None,
            source: None,
            job_type: None,
            salary: None,
            enhanced_description: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 20);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(5000)), 100);
    }

    #[tokio::test]
    async fn test_search_defaults_location_to_remote() {
        let store = Arc::new(MemoryStore::with_jobs(vec![
            job("a", "Rust Engineer", "Remote"),
            job("b", "Rust Engineer", "Dhaka"),
        ]));
        let service = JobQueryService::new(store);

        let outcome = service.search("  rust ", None, None).await.unwrap();
        assert_eq!(outcome.query, "rust");
        assert_eq!(outcome.location, "Remote");
        assert_eq!(outcome.jobs.len(), 1);

        let dhaka = service.search("rust", Some("Dhaka"), None).await.unwrap();
        assert_eq!(dhaka.jobs[0].id.as_str(), "b");
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let service = JobQueryService::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            service.search("   ", None, None).await,
            Err(ApiError::BadRequest(_))
        ));
    }
}
