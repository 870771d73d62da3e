//! Daily search usage repository.
//!
//! One document per (userId, date). The read and the increment are separate
//! requests; two concurrent increments for the same user can both read the
//! same value and one of them is lost.

use serde_json::json;
use tracing::debug;

use jobhub_models::SearchUsageRecord;

use crate::client::AppwriteClient;
use crate::error::AppwriteResult;
use crate::query::Query;
use crate::types::Document;

/// Repository for the `search_usage` collection.
#[derive(Clone)]
pub struct SearchUsageRepository {
    client: AppwriteClient,
    collection: String,
}

impl SearchUsageRepository {
    pub fn new(client: AppwriteClient) -> Self {
        let collection = client.collections().search_usage.clone();
        Self { client, collection }
    }

    /// The user's record for `date` ("YYYY-MM-DD"), if one exists.
    pub async fn get_for_day(
        &self,
        user_id: &str,
        date: &str,
    ) -> AppwriteResult<Option<SearchUsageRecord>> {
        Ok(self.find(user_id, date).await?.map(|doc| doc.data))
    }

    /// Add one search to the user's record for `date`, creating it at 1.
    pub async fn increment(&self, user_id: &str, date: &str) -> AppwriteResult<SearchUsageRecord> {
        match self.find(user_id, date).await? {
            Some(doc) => {
                let next = doc.data.searches_used.saturating_add(1);
                let updated: Document<SearchUsageRecord> = self
                    .client
                    .update_document(&self.collection, &doc.id, &json!({ "searchesUsed": next }))
                    .await?;
                debug!(user_id = %user_id, date = %date, searches_used = next, "Incremented search usage");
                Ok(updated.data)
            }
            None => {
                let mut record = SearchUsageRecord::new(user_id, date);
                record.searches_used = 1;
                let created = self
                    .client
                    .create_document(&self.collection, None, &record)
                    .await?;
                debug!(user_id = %user_id, date = %date, "Created search usage record");
                Ok(created.data)
            }
        }
    }

    async fn find(
        &self,
        user_id: &str,
        date: &str,
    ) -> AppwriteResult<Option<Document<SearchUsageRecord>>> {
        let queries = [
            Query::equal("userId", user_id),
            Query::equal("date", date),
            Query::limit(1),
        ];
        let list = self
            .client
            .list_documents::<SearchUsageRecord>(&self.collection, &queries)
            .await?;
        Ok(list.documents.into_iter().next())
    }
}
