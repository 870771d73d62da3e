//! Document store abstraction.
//!
//! Route logic and services only see these traits; the Appwrite and
//! in-memory backends are interchangeable.

mod appwrite;
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use jobhub_appwrite::AppwriteError;
use jobhub_models::{Job, JobId, Profile, ProfileUpdate, SearchUsageRecord};

pub use appwrite::AppwriteStore;
pub use memory::MemoryStore;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store failures as seen by the API layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store unreachable, timing out or answering with a server fault.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Store reachable but refused the request (bad query, auth, schema).
    #[error("Store rejected request: {0}")]
    Rejected(String),
}

impl From<AppwriteError> for StoreError {
    fn from(err: AppwriteError) -> Self {
        match err {
            AppwriteError::NotFound(msg) => StoreError::NotFound(msg),
            e if e.is_unavailable() => StoreError::Unavailable(e.to_string()),
            e => StoreError::Rejected(e.to_string()),
        }
    }
}

/// Job listings.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Newest first, offset paginated.
    async fn list(&self, limit: u32, offset: u32) -> StoreResult<Vec<Job>>;

    /// Keyword match on title or description, optional location filter.
    async fn search(&self, keyword: &str, location: Option<&str>, limit: u32)
        -> StoreResult<Vec<Job>>;

    /// Exact number of jobs.
    async fn count(&self) -> StoreResult<u64>;

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Job>>;

    /// `count` jobs from `offset` in creation order, oldest first.
    async fn range(&self, offset: u64, count: u64) -> StoreResult<Vec<Job>>;

    /// Jobs lacking an enhanced description, newest first.
    async fn pending_enrichment(&self, limit: u32) -> StoreResult<Vec<Job>>;

    async fn set_enhanced_description(&self, id: &JobId, text: &str) -> StoreResult<()>;

    /// Reachability check used by readiness.
    async fn ping(&self) -> StoreResult<()>;
}

/// User profiles, one per user id.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: &str) -> StoreResult<Option<Profile>>;

    /// Create if absent, otherwise merge.
    async fn upsert(&self, update: ProfileUpdate) -> StoreResult<Profile>;
}

/// Per-user daily search counters.
#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn get_for_day(&self, user_id: &str, date: &str)
        -> StoreResult<Option<SearchUsageRecord>>;

    /// Add one search, creating the day's record at 1 when absent.
    /// Not atomic with respect to concurrent increments.
    async fn increment(&self, user_id: &str, date: &str) -> StoreResult<SearchUsageRecord>;
}

/// The three store handles the application runs on.
#[derive(Clone)]
pub struct Stores {
    pub jobs: Arc<dyn JobStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub usage: Arc<dyn UsageStore>,
}

impl Stores {
    pub fn appwrite(store: AppwriteStore) -> Self {
        let store = Arc::new(store);
        Self {
            jobs: store.clone(),
            profiles: store.clone(),
            usage: store,
        }
    }

    pub fn memory(store: Arc<MemoryStore>) -> Self {
        Self {
            jobs: store.clone(),
            profiles: store.clone(),
            usage: store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appwrite_error_classification() {
        assert!(matches!(
            StoreError::from(AppwriteError::ServerError(503, "down".into())),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            StoreError::from(AppwriteError::not_found("jobs/x")),
            StoreError::NotFound(_)
        ));
        assert!(matches!(
            StoreError::from(AppwriteError::Unauthorized("bad key".into())),
            StoreError::Rejected(_)
        ));
    }
}
