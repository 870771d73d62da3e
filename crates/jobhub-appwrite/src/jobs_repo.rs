//! Jobs collection repository.
//!
//! Attribute names follow the collection schema (snake_case); the Appwrite
//! system fields `$id`, `$createdAt` and `$updatedAt` become the job's id and
//! timestamps.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use jobhub_models::{Job, JobId};

use crate::client::AppwriteClient;
use crate::error::AppwriteResult;
use crate::query::Query;
use crate::types::{Document, MAX_PAGE_SIZE};

/// User attributes of a job document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobAttributes {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_description: Option<String>,
}

impl From<Document<JobAttributes>> for Job {
    fn from(doc: Document<JobAttributes>) -> Self {
        let attrs = doc.data;
        Job {
            id: JobId::from(doc.id),
            title: attrs.title,
            company: attrs.company,
            location: attrs.location,
            description: attrs.description,
            apply_url: attrs.apply_url,
            slug: attrs.slug,
            source: attrs.source,
            job_type: attrs.job_type,
            salary: attrs.salary,
            enhanced_description: attrs.enhanced_description,
            created_at: doc.created_at.unwrap_or_default(),
            updated_at: doc.updated_at,
        }
    }
}

/// Repository for the `jobs` collection.
#[derive(Clone)]
pub struct JobRepository {
    client: AppwriteClient,
    collection: String,
}

impl JobRepository {
    pub fn new(client: AppwriteClient) -> Self {
        let collection = client.collections().jobs.clone();
        Self { client, collection }
    }

    /// Newest jobs first, offset paginated.
    pub async fn list(&self, limit: u32, offset: u32) -> AppwriteResult<Vec<Job>> {
        let queries = [
            Query::order_desc("$createdAt"),
            Query::limit(limit.min(MAX_PAGE_SIZE)),
            Query::offset(offset),
        ];
        self.fetch(&queries).await
    }

    /// Jobs whose title or description contains `keyword`, filtered to
    /// `location` when one is given.
    pub async fn search(
        &self,
        keyword: &str,
        location: Option<&str>,
        limit: u32,
    ) -> AppwriteResult<Vec<Job>> {
        let mut queries = vec![Query::or(vec![
            Query::contains("title", keyword),
            Query::contains("description", keyword),
        ])];
        if let Some(location) = location.filter(|l| !l.is_empty()) {
            queries.push(Query::contains("location", location));
        }
        queries.push(Query::order_desc("$createdAt"));
        queries.push(Query::limit(limit.min(MAX_PAGE_SIZE)));

        self.fetch(&queries).await
    }

    /// Exact number of jobs in the collection.
    pub async fn count(&self) -> AppwriteResult<u64> {
        self.client.count_documents(&self.collection, &[]).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> AppwriteResult<Option<Job>> {
        let queries = [Query::equal("slug", slug), Query::limit(1)];
        Ok(self.fetch(&queries).await?.into_iter().next())
    }

    /// `count` jobs starting at `offset`, oldest first so shard contents are
    /// stable as new jobs arrive.
    pub async fn range(&self, offset: u64, count: u64) -> AppwriteResult<Vec<Job>> {
        let mut jobs = Vec::with_capacity(count.min(10_000) as usize);
        let mut position = offset;
        let end = offset.saturating_add(count);

        while position < end {
            let page_size = (end - position).min(MAX_PAGE_SIZE as u64) as u32;
            let queries = [
                Query::order_asc("$createdAt"),
                Query::limit(page_size),
                Query::offset(position.min(u32::MAX as u64) as u32),
            ];
            let page = self.fetch(&queries).await?;
            let returned = page.len();
            jobs.extend(page);

            if returned < page_size as usize {
                break;
            }
            position += returned as u64;
        }

        debug!(offset, fetched = jobs.len(), "Fetched job range");
        Ok(jobs)
    }

    /// Jobs still lacking an enhanced description, newest first.
    pub async fn pending_enrichment(&self, limit: u32) -> AppwriteResult<Vec<Job>> {
        let queries = [
            pending_enrichment_filter(),
            Query::order_desc("$createdAt"),
            Query::limit(limit.min(MAX_PAGE_SIZE)),
        ];
        self.fetch(&queries).await
    }

    pub async fn set_enhanced_description(&self, id: &JobId, text: &str) -> AppwriteResult<Job> {
        let doc: Document<JobAttributes> = self
            .client
            .update_document(
                &self.collection,
                id.as_str(),
                &json!({ "enhanced_description": text }),
            )
            .await?;
        Ok(doc.into())
    }

    /// Reachability check against the jobs collection.
    pub async fn ping(&self) -> AppwriteResult<()> {
        self.client.ping(&self.collection).await
    }

    async fn fetch(&self, queries: &[Query]) -> AppwriteResult<Vec<Job>> {
        let list = self
            .client
            .list_documents::<JobAttributes>(&self.collection, queries)
            .await?;
        Ok(list.documents.into_iter().map(Job::from).collect())
    }
}

/// Server-side form of `Job::needs_enrichment`: null or empty.
fn pending_enrichment_filter() -> Query {
    Query::or(vec![
        Query::is_null("enhanced_description"),
        Query::equal("enhanced_description", ""),
    ])
}
