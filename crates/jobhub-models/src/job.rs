//! Job posting models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned identifier of a job posting.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A job posting as returned to API callers.
///
/// Store-internal bookkeeping (collection, database, permissions) never
/// reaches this type; `createdAt`/`updatedAt` come from the store's own
/// document timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub id: JobId,

    pub title: String,

    #[serde(default)]
    pub company: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_url: Option<String>,

    /// Public URL segment. Jobs without one are not linkable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,

    /// Where the posting came from (e.g. "ai-generated", "manual").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,

    /// Written only by the AI enrichment batch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_description: Option<String>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,

    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    /// The slug used for public URLs, if the job has a non-blank one.
    pub fn public_slug(&self) -> Option<&str> {
        self.slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Timestamp reported to crawlers: last update, else creation.
    pub fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(self.created_at)
    }

    /// Whether the enrichment batch still has to process this job: no
    /// enhanced description, or an empty one. Stores that filter server-side
    /// must select exactly these jobs.
    pub fn needs_enrichment(&self) -> bool {
        self.enhanced_description
            .as_deref()
            .map(str::is_empty)
            .unwrap_or(true)
    }
}
