//! Shared data models for the JobHub backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job postings and their public slugs
//! - User profiles and premium status
//! - Daily search usage records and quota decisions

pub mod job;
pub mod profile;
pub mod search_usage;

// Re-export common types
pub use job::{Job, JobId};
pub use profile::{Profile, ProfileUpdate, UserType};
pub use search_usage::{
    usage_date_key, SearchAllowance, SearchLimits, SearchUsageRecord, DEFAULT_FREE_SEARCH_LIMIT,
    PREMIUM_SEARCH_LIMIT,
};
