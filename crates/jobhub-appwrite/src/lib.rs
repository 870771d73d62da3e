//! Appwrite Databases REST API client.
//!
//! This crate provides:
//! - A typed client for list/get/create/update/delete on collections
//! - A query builder for Appwrite's JSON query syntax
//! - Exact document counting past Appwrite's capped `total`
//! - Typed repositories for jobs, profiles and daily search usage
//! - Retry with backoff, tracing spans and request metrics

pub mod client;
pub mod error;
pub mod jobs_repo;
pub mod metrics;
pub mod profile_repo;
pub mod query;
pub mod retry;
pub mod search_usage_repo;
pub mod types;

#[cfg(test)]
mod client_tests;

pub use client::{AppwriteClient, AppwriteConfig, CollectionIds};
pub use error::{AppwriteError, AppwriteResult};
pub use jobs_repo::JobRepository;
pub use profile_repo::ProfileRepository;
pub use query::Query;
pub use search_usage_repo::SearchUsageRepository;
pub use types::{is_valid_document_id, Document, DocumentList};
