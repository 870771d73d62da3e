//! Daily search quota tracking.
//!
//! The check and the increment are separate store calls, so two searches
//! from the same user racing each other can both pass the check. Store
//! failures never block a search: the check fails open and a failed
//! increment is only logged.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use jobhub_models::{usage_date_key, SearchAllowance, SearchLimits, SearchUsageRecord};

use crate::metrics;
use crate::store::{ProfileStore, UsageStore};

/// A user's quota position for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageStatus {
    pub allowance: SearchAllowance,
    pub is_premium: bool,
    /// Ceiling for the user's tier.
    pub limit: u32,
}

/// Search-usage tracker over the usage and profile stores.
#[derive(Clone)]
pub struct SearchUsageTracker {
    usage: Arc<dyn UsageStore>,
    profiles: Arc<dyn ProfileStore>,
    limits: SearchLimits,
}

impl SearchUsageTracker {
    pub fn new(
        usage: Arc<dyn UsageStore>,
        profiles: Arc<dyn ProfileStore>,
        limits: SearchLimits,
    ) -> Self {
        Self {
            usage,
            profiles,
            limits,
        }
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    /// Whether `user_id` may run another search today.
    pub async fn can_search(&self, user_id: &str, is_premium: bool) -> SearchAllowance {
        self.can_search_at(user_id, is_premium, Utc::now()).await
    }

    pub(crate) async fn can_search_at(
        &self,
        user_id: &str,
        is_premium: bool,
        now: DateTime<Utc>,
    ) -> SearchAllowance {
        let date = usage_date_key(now);

        match self.usage.get_for_day(user_id, &date).await {
            Ok(record) => {
                let used = record.map(|r| r.searches_used).unwrap_or(0);
                let allowance = SearchAllowance::evaluate(used, is_premium, self.limits);
                metrics::record_search_usage_check(if allowance.allowed {
                    "allowed"
                } else {
                    "blocked"
                });
                allowance
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Search usage lookup failed, allowing search");
                metrics::record_search_usage_check("fail_open");
                SearchAllowance::fail_open(self.limits)
            }
        }
    }

    /// Premium status from the user's profile. A missing profile is free
    /// tier; `None` means the profile could not be read.
    pub async fn is_premium(&self, user_id: &str) -> Option<bool> {
        match self.profiles.get(user_id).await {
            Ok(Some(profile)) => Some(profile.is_premium_at(Utc::now())),
            Ok(None) => Some(false),
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Profile lookup failed, premium status unknown");
                None
            }
        }
    }

    /// Resolve premium status, then check the quota. When the tier cannot
    /// be resolved the check fails open, since a premium user must never
    /// be blocked.
    pub async fn status(&self, user_id: &str) -> UsageStatus {
        match self.is_premium(user_id).await {
            Some(is_premium) => UsageStatus {
                allowance: self.can_search(user_id, is_premium).await,
                is_premium,
                limit: self.limits.for_tier(is_premium),
            },
            None => {
                metrics::record_search_usage_check("fail_open");
                UsageStatus {
                    allowance: SearchAllowance::fail_open(self.limits),
                    is_premium: false,
                    limit: self.limits.free,
                }
            }
        }
    }

    /// Count one performed search. Never fails the caller.
    pub async fn record_search(&self, user_id: &str) -> Option<SearchUsageRecord> {
        self.record_search_at(user_id, Utc::now()).await
    }

    pub(crate) async fn record_search_at(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Option<SearchUsageRecord> {
        let date = usage_date_key(now);

        match self.usage.increment(user_id, &date).await {
            Ok(record) => {
                debug!(user_id = %user_id, searches_used = record.searches_used, "Recorded search");
                metrics::record_search_recorded(true);
                Some(record)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to record search usage");
                metrics::record_search_recorded(false);
                None
            }
        }
    }
}
