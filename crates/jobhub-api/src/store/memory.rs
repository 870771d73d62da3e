//! Process-local store for local runs and tests.
//!
//! Keyword and location matching are case-insensitive substring matches.
//! `set_failing(true)` makes every call fail as if the backend were down.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use jobhub_models::{Job, JobId, Profile, ProfileUpdate, SearchUsageRecord};

use super::{JobStore, ProfileStore, StoreError, StoreResult, UsageStore};

#[derive(Default)]
struct MemoryData {
    jobs: Vec<Job>,
    profiles: HashMap<String, Profile>,
    usage: HashMap<(String, String), SearchUsageRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<MemoryData>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        Self {
            data: RwLock::new(MemoryData {
                jobs,
                ..Default::default()
            }),
            failing: AtomicBool::new(false),
        }
    }

    pub async fn insert_job(&self, job: Job) {
        self.data.write().await.jobs.push(job);
    }

    /// Simulate an outage (or recovery) of the backing store.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Mark a user premium (or not), creating the profile if needed.
    pub async fn set_premium(&self, user_id: &str, is_premium: bool) {
        let now = Utc::now();
        let mut data = self.data.write().await;
        let profile = data
            .profiles
            .entry(user_id.to_string())
            .or_insert_with(|| Profile::new(user_id, now));
        profile.is_premium = is_premium;
        profile.updated_at = now;
    }

    pub async fn profile_count(&self) -> usize {
        self.data.read().await.profiles.len()
    }

    fn check_available(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store set to fail".to_string()))
        } else {
            Ok(())
        }
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn newest_first(jobs: &mut [Job]) {
    jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn list(&self, limit: u32, offset: u32) -> StoreResult<Vec<Job>> {
        self.check_available()?;
        let mut jobs = self.data.read().await.jobs.clone();
        newest_first(&mut jobs);
        Ok(jobs
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn search(
        &self,
        keyword: &str,
        location: Option<&str>,
        limit: u32,
    ) -> StoreResult<Vec<Job>> {
        self.check_available()?;
        let mut jobs: Vec<Job> = self
            .data
            .read()
            .await
            .jobs
            .iter()
            .filter(|j| contains_ci(&j.title, keyword) || contains_ci(&j.description, keyword))
            .filter(|j| match location {
                Some(loc) if !loc.is_empty() => contains_ci(&j.location, loc),
                _ => true,
            })
            .cloned()
            .collect();
        newest_first(&mut jobs);
        jobs.truncate(limit as usize);
        Ok(jobs)
    }

    async fn count(&self) -> StoreResult<u64> {
        self.check_available()?;
        Ok(self.data.read().await.jobs.len() as u64)
    }

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Option<Job>> {
        self.check_available()?;
        Ok(self
            .data
            .read()
            .await
            .jobs
            .iter()
            .find(|j| j.public_slug() == Some(slug))
            .cloned())
    }

    async fn range(&self, offset: u64, count: u64) -> StoreResult<Vec<Job>> {
        self.check_available()?;
        let mut jobs = self.data.read().await.jobs.clone();
        jobs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(jobs
            .into_iter()
            .skip(offset as usize)
            .take(count as usize)
            .collect())
    }

    async fn pending_enrichment(&self, limit: u32) -> StoreResult<Vec<Job>> {
        self.check_available()?;
        let mut jobs: Vec<Job> = self
            .data
            .read()
            .await
            .jobs
            .iter()
            .filter(|j| j.needs_enrichment())
            .cloned()
            .collect();
        newest_first(&mut jobs);
        jobs.truncate(limit as usize);
        Ok(jobs)
    }

    async fn set_enhanced_description(&self, id: &JobId, text: &str) -> StoreResult<()> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let job = data
            .jobs
            .iter_mut()
            .find(|j| &j.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("jobs/{}", id)))?;
        job.enhanced_description = Some(text.to_string());
        job.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_available()
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get(&self, user_id: &str) -> StoreResult<Option<Profile>> {
        self.check_available()?;
        Ok(self.data.read().await.profiles.get(user_id).cloned())
    }

    async fn upsert(&self, update: ProfileUpdate) -> StoreResult<Profile> {
        self.check_available()?;
        let now = Utc::now();
        let mut data = self.data.write().await;
        let profile = data
            .profiles
            .entry(update.user_id.clone())
            .or_insert_with(|| Profile::new(&update.user_id, now));
        profile.apply(update, now);
        Ok(profile.clone())
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn get_for_day(
        &self,
        user_id: &str,
        date: &str,
    ) -> StoreResult<Option<SearchUsageRecord>> {
        self.check_available()?;
        Ok(self
            .data
            .read()
            .await
            .usage
            .get(&(user_id.to_string(), date.to_string()))
            .cloned())
    }

    async fn increment(&self, user_id: &str, date: &str) -> StoreResult<SearchUsageRecord> {
        self.check_available()?;
        let mut data = self.data.write().await;
        let record = data
            .usage
            .entry((user_id.to_string(), date.to_string()))
            .or_insert_with(|| SearchUsageRecord::new(user_id, date));
        record.searches_used = record.searches_used.saturating_add(1);
        Ok(record.clone())
    }
}
