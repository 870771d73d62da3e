//! Appwrite-backed store.

use async_trait::async_trait;

use jobhub_appwrite::{
    AppwriteClient, AppwriteResult, JobRepository, ProfileRepository, SearchUsageRepository,
};
use jobhub_models::{Job, JobId, Profile, ProfileUpdate, SearchUsageRecord};

use super::{JobStore, ProfileStore, StoreResult, UsageStore};

/// All three stores over one Appwrite client.
#[derive(Clone)]
pub struct AppwriteStore {
    jobs: JobRepository,
    profiles: ProfileRepository,
    usage: SearchUsageRepository,
}

impl AppwriteStore {
    pub fn new(client: AppwriteClient) -> Self {
        Self {
            jobs: JobRepository::new(client.clone()),
            profiles: ProfileRepository::new(client.clone()),
            usage: SearchUsageRepository::new(client),
        }
    }

    pub fn from_env() -> AppwriteResult<Self> {
        Ok(Self::new(AppwriteClient::from_env()?))
    }
}

#[async_trait]
impl JobStore for AppwriteStore {
    async fn list(&self, limit: u32, offset: u32) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.list(limit, offset).await?)
    }

    async fn search(
        &self,
        keyword: &str,
        location: Option<&str>,
        limit: u32,
    ) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.search(keyword, location, limit).await?)
    }

    async fn count(&self) -> StoreResult<u64> {
        Ok(self.jobs.count().await?)
    }

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Job>> {
        Ok(self.jobs.get_by_slug(slug).await?)
    }

    async fn range(&self, offset: u64, count: u64) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.range(offset, count).await?)
    }

    async fn pending_enrichment(&self, limit: u32) -> StoreResult<Vec<Job>> {
        Ok(self.jobs.pending_enrichment(limit).await?)
    }

    async fn set_enhanced_description(&self, id: &JobId, text: &str) -> StoreResult<()> {
        self.jobs.set_enhanced_description(id, text).await?;
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(self.jobs.ping().await?)
    }
}

#[async_trait]
impl ProfileStore for AppwriteStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        Ok(self.profiles.get(user_id).await?)
    }

    async fn upsert(&self, update: ProfileUpdate) -> StoreResult<Profile> {
        Ok(self.profiles.upsert(update).await?)
    }
}

#[async_trait]
impl UsageStore for AppwriteStore {
    async fn get_for_day(
        &self,
        user_id: &str,
        date: &str,
    ) -> StoreResult<Option<SearchUsageRecord>> {
        Ok(self.usage.get_for_day(user_id, date).await?)
    }

    async fn increment(&self, user_id: &str, date: &str) -> StoreResult<SearchUsageRecord> {
        Ok(self.usage.increment(user_id, date).await?)
    }
}
