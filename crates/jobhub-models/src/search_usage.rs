//! Daily search usage and quota decisions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Searches a free user may run per UTC day unless configured otherwise.
pub const DEFAULT_FREE_SEARCH_LIMIT: u32 = 5;

/// Nominal daily ceiling reported to premium users. Never enforced.
pub const PREMIUM_SEARCH_LIMIT: u32 = 100;

/// Day key ("YYYY-MM-DD", UTC) identifying a usage record.
pub fn usage_date_key(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// One user's search counter for one day.
///
/// A new day means a new record; old records are left in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsageRecord {
    pub user_id: String,
    pub date: String,
    #[serde(default)]
    pub searches_used: u32,
}

impl SearchUsageRecord {
    pub fn new(user_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            date: date.into(),
            searches_used: 0,
        }
    }
}

/// Daily search ceilings per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchLimits {
    /// Enforced ceiling for free users.
    pub free: u32,
    /// Reported ceiling for premium users. Never enforced.
    pub premium: u32,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            free: DEFAULT_FREE_SEARCH_LIMIT,
            premium: PREMIUM_SEARCH_LIMIT,
        }
    }
}

impl SearchLimits {
    /// Limit that applies to the caller's tier.
    pub fn for_tier(&self, is_premium: bool) -> u32 {
        if is_premium {
            self.premium
        } else {
            self.free
        }
    }
}

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SearchAllowance {
    pub allowed: bool,
    pub used: u32,
    pub remaining: u32,
}

impl SearchAllowance {
    /// Decide whether a user with `used` searches today may search again.
    ///
    /// Premium users are always allowed; their `remaining` is reported
    /// against the premium ceiling and floors at zero.
    pub fn evaluate(used: u32, is_premium: bool, limits: SearchLimits) -> Self {
        if is_premium {
            return Self {
                allowed: true,
                used,
                remaining: limits.premium.saturating_sub(used),
            };
        }

        Self {
            allowed: used < limits.free,
            used,
            remaining: limits.free.saturating_sub(used),
        }
    }

    /// Answer given when usage cannot be read: permit, with a full free quota.
    pub fn fail_open(limits: SearchLimits) -> Self {
        Self {
            allowed: true,
            used: 0,
            remaining: limits.free,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_usage_date_key_format() {
        let now = Utc.with_ymd_and_hms(2025, 3, 7, 23, 59, 59).unwrap();
        assert_eq!(usage_date_key(now), "2025-03-07");
    }

    #[test]
    fn test_free_user_blocked_at_limit() {
        let limits = SearchLimits::default();
        let limit = limits.free;
        for used in 0..limit {
            let a = SearchAllowance::evaluate(used, false, limits);
            assert!(a.allowed, "used={} should be allowed", used);
            assert_eq!(a.remaining, limit - used);
        }

        let at_limit = SearchAllowance::evaluate(limit, false, limits);
        assert!(!at_limit.allowed);
        assert_eq!(at_limit.remaining, 0);

        let over = SearchAllowance::evaluate(limit + 7, false, limits);
        assert!(!over.allowed);
        assert_eq!(over.remaining, 0);
    }

    #[test]
    fn test_premium_never_blocked() {
        for used in [0, 5, 99, 100, 101, 10_000] {
            let a = SearchAllowance::evaluate(used, true, SearchLimits::default());
            assert!(a.allowed);
            assert_eq!(a.remaining, PREMIUM_SEARCH_LIMIT.saturating_sub(used));
        }
    }

    #[test]
    fn test_fail_open() {
        let limits = SearchLimits { free: 3, premium: 100 };
        let a = SearchAllowance::fail_open(limits);
        assert!(a.allowed);
        assert_eq!(a.used, 0);
        assert_eq!(a.remaining, 3);
        assert_eq!(limits.for_tier(true), 100);
    }

    #[test]
    fn test_record_deserializes_missing_counter() {
        let record: SearchUsageRecord =
            serde_json::from_str(r#"{"userId":"u1","date":"2025-01-01"}"#).unwrap();
        assert_eq!(record.searches_used, 0);
    }
}
