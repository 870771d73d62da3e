//! User profile models.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Kind of account a profile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    JobSeeker,
    Employer,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::JobSeeker => "job_seeker",
            UserType::Employer => "employer",
        }
    }

    /// Parse from string (case-insensitive). Unknown values map to job seeker.
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "employer" | "recruiter" => UserType::Employer,
            _ => UserType::JobSeeker,
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A user's profile. Exactly one per auth identity, keyed by `user_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default)]
    pub user_type: UserType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default)]
    pub skills: Vec<String>,

    /// Set by billing, never by the profile upsert endpoint.
    #[serde(default)]
    pub is_premium: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub premium_until: Option<DateTime<Utc>>,

    /// Free-form preferences (job types, salary expectations, alerts...).
    #[serde(default)]
    pub preferences: HashMap<String, serde_json::Value>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Empty profile for a user seen for the first time.
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            name: None,
            email: None,
            user_type: UserType::default(),
            location: None,
            skills: Vec::new(),
            is_premium: false,
            premium_until: None,
            preferences: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Premium status at `now`. An expired `premium_until` revokes the flag.
    pub fn is_premium_at(&self, now: DateTime<Utc>) -> bool {
        self.is_premium && self.premium_until.map(|until| until > now).unwrap_or(true)
    }

    /// Merge an update into this profile.
    ///
    /// Fields present in the update overwrite; preference keys are merged
    /// one by one so partial preference updates do not wipe the rest.
    pub fn apply(&mut self, update: ProfileUpdate, now: DateTime<Utc>) {
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
        if let Some(user_type) = update.user_type {
            self.user_type = user_type;
        }
        if let Some(location) = update.location {
            self.location = Some(location);
        }
        if let Some(skills) = update.skills {
            self.skills = skills;
        }
        if let Some(preferences) = update.preferences {
            for (key, value) in preferences {
                self.preferences.insert(key, value);
            }
        }
        self.updated_at = now;
    }
}

/// Body of a profile upsert: `userId` plus any subset of editable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    #[validate(length(min = 1, max = 36, message = "userId must be 1-36 characters"))]
    pub user_id: String,

    #[validate(length(max = 128))]
    pub name: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    pub user_type: Option<UserType>,

    #[validate(length(max = 128))]
    pub location: Option<String>,

    #[validate(length(max = 50))]
    pub skills: Option<Vec<String>>,

    pub preferences: Option<HashMap<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_user_type_parsing() {
        assert_eq!(UserType::from_str("Employer"), UserType::Employer);
        assert_eq!(UserType::from_str("job_seeker"), UserType::JobSeeker);
        assert_eq!(UserType::from_str("unknown"), UserType::JobSeeker);
    }

    #[test]
    fn test_premium_expiry() {
        let mut profile = Profile::new("user-1", now());
        assert!(!profile.is_premium_at(now()));

        profile.is_premium = true;
        assert!(profile.is_premium_at(now()));

        profile.premium_until = Some(now() - Duration::days(1));
        assert!(!profile.is_premium_at(now()));

        profile.premium_until = Some(now() + Duration::days(30));
        assert!(profile.is_premium_at(now()));
    }

    #[test]
    fn test_apply_merges_fields_and_preferences() {
        let mut profile = Profile::new("user-1", now());
        profile.name = Some("Old".to_string());
        profile
            .preferences
            .insert("remote".to_string(), serde_json::json!(true));

        let mut prefs = HashMap::new();
        prefs.insert("jobTypes".to_string(), serde_json::json!(["full-time"]));

        let later = now() + Duration::hours(1);
        profile.apply(
            ProfileUpdate {
                user_id: "user-1".to_string(),
                name: Some("New".to_string()),
                preferences: Some(prefs),
                ..Default::default()
            },
            later,
        );

        assert_eq!(profile.name.as_deref(), Some("New"));
        assert_eq!(profile.preferences.len(), 2);
        assert_eq!(profile.updated_at, later);
        assert_eq!(profile.created_at, now());
    }

    #[test]
    fn test_update_validation() {
        let ok = ProfileUpdate {
            user_id: "user-1".to_string(),
            email: Some("dev@example.com".to_string()),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());

        let bad_email = ProfileUpdate {
            user_id: "user-1".to_string(),
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());

        let missing_user = ProfileUpdate::default();
        assert!(missing_user.validate().is_err());
    }

    #[test]
    fn test_update_ignores_premium_fields() {
        let update: ProfileUpdate = serde_json::from_value(serde_json::json!({
            "userId": "user-1",
            "name": "Rahim",
            "isPremium": true
        }))
        .unwrap();

        let mut profile = Profile::new("user-1", now());
        profile.apply(update, now());
        assert!(!profile.is_premium);
        assert_eq!(profile.name.as_deref(), Some("Rahim"));
    }
}
