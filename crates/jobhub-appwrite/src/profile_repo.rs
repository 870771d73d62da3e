//! Profiles collection repository.
//!
//! One document per user. The document id is the user id when it is a
//! valid Appwrite id; lookups always go through the `userId` attribute so
//! both cases resolve the same way.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use jobhub_models::{Profile, ProfileUpdate, UserType};

use crate::client::AppwriteClient;
use crate::error::{AppwriteError, AppwriteResult};
use crate::query::Query;
use crate::types::{is_valid_document_id, Document};

/// User attributes of a profile document.
///
/// Appwrite has no map attribute type, so preferences are kept as a JSON
/// encoded string.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileAttributes {
    pub user_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub premium_until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preferences: Option<String>,
}

impl ProfileAttributes {
    fn from_profile(profile: &Profile) -> AppwriteResult<Self> {
        let preferences = if profile.preferences.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&profile.preferences)?)
        };

        Ok(Self {
            user_id: profile.user_id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            user_type: Some(profile.user_type.as_str().to_string()),
            location: profile.location.clone(),
            skills: profile.skills.clone(),
            is_premium: profile.is_premium,
            premium_until: profile.premium_until,
            preferences,
        })
    }
}

impl From<Document<ProfileAttributes>> for Profile {
    fn from(doc: Document<ProfileAttributes>) -> Self {
        let attrs = doc.data;
        let created_at = doc.created_at.unwrap_or_default();
        // A malformed preferences string is dropped rather than failing the read
        let preferences: HashMap<String, serde_json::Value> = attrs
            .preferences
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
            .unwrap_or_default();

        Profile {
            user_id: attrs.user_id,
            name: attrs.name,
            email: attrs.email,
            user_type: attrs
                .user_type
                .as_deref()
                .map(UserType::from_str)
                .unwrap_or_default(),
            location: attrs.location,
            skills: attrs.skills,
            is_premium: attrs.is_premium,
            premium_until: attrs.premium_until,
            preferences,
            created_at,
            updated_at: doc.updated_at.unwrap_or(created_at),
        }
    }
}

/// Repository for the `profiles` collection.
#[derive(Clone)]
pub struct ProfileRepository {
    client: AppwriteClient,
    collection: String,
}

impl ProfileRepository {
    pub fn new(client: AppwriteClient) -> Self {
        let collection = client.collections().profiles.clone();
        Self { client, collection }
    }

    pub async fn get(&self, user_id: &str) -> AppwriteResult<Option<Profile>> {
        Ok(self.find(user_id).await?.map(Profile::from))
    }

    /// Create the profile if absent, otherwise merge `update` into it.
    pub async fn upsert(&self, update: ProfileUpdate) -> AppwriteResult<Profile> {
        let user_id = update.user_id.clone();

        if let Some(existing) = self.find(&user_id).await? {
            return self.merge_into(existing, update).await;
        }

        let now = Utc::now();
        let mut profile = Profile::new(&user_id, now);
        profile.apply(update.clone(), now);
        let attrs = ProfileAttributes::from_profile(&profile)?;
        let doc_id = is_valid_document_id(&user_id).then_some(user_id.as_str());

        match self.client.create_document(&self.collection, doc_id, &attrs).await {
            Ok(doc) => {
                info!(user_id = %user_id, "Created profile");
                Ok(doc.into())
            }
            Err(AppwriteError::AlreadyExists(_)) => {
                // Lost a create race; the other writer's document wins and we merge into it
                debug!(user_id = %user_id, "Profile created concurrently, merging");
                let existing = self
                    .find(&user_id)
                    .await?
                    .ok_or_else(|| AppwriteError::not_found(format!("profiles/{}", user_id)))?;
                self.merge_into(existing, update).await
            }
            Err(e) => Err(e),
        }
    }

    async fn merge_into(
        &self,
        existing: Document<ProfileAttributes>,
        update: ProfileUpdate,
    ) -> AppwriteResult<Profile> {
        let doc_id = existing.id.clone();
        let mut profile = Profile::from(existing);
        profile.apply(update, Utc::now());
        let attrs = ProfileAttributes::from_profile(&profile)?;

        let doc: Document<ProfileAttributes> = self
            .client
            .update_document(&self.collection, &doc_id, &attrs)
            .await?;
        debug!(user_id = %profile.user_id, "Updated profile");
        Ok(doc.into())
    }

    async fn find(&self, user_id: &str) -> AppwriteResult<Option<Document<ProfileAttributes>>> {
        let queries = [Query::equal("userId", user_id), Query::limit(1)];
        let list = self
            .client
            .list_documents::<ProfileAttributes>(&self.collection, &queries)
            .await?;
        Ok(list.documents.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preferences_round_trip_through_string() {
        let mut profile = Profile::new("user-1", Utc::now());
        profile
            .preferences
            .insert("remote".to_string(), json!(true));

        let attrs = ProfileAttributes::from_profile(&profile).unwrap();
        assert_eq!(attrs.preferences.as_deref(), Some(r#"{"remote":true}"#));
        assert_eq!(attrs.user_type.as_deref(), Some("job_seeker"));
    }

    #[test]
    fn test_document_to_profile_tolerates_bad_preferences() {
        let doc: Document<ProfileAttributes> = serde_json::from_value(json!({
            "$id": "user-1",
            "$createdAt": "2025-03-01T10:00:00.000+00:00",
            "userId": "user-1",
            "name": "Rahim",
            "userType": "employer",
            "isPremium": true,
            "preferences": "{not json"
        }))
        .unwrap();

        let profile = Profile::from(doc);
        assert_eq!(profile.user_type, UserType::Employer);
        assert!(profile.is_premium);
        assert!(profile.preferences.is_empty());
        assert_eq!(profile.updated_at, profile.created_at);
    }
}
