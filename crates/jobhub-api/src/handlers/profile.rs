//! Profile handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use jobhub_models::{Profile, ProfileUpdate};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileParams {
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile: Profile,
}

/// Get a user's profile.
pub async fn get_profile(
    State(state): State<AppState>,
    Query(params): Query<ProfileParams>,
) -> ApiResult<Json<Profile>> {
    let user_id = params
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("userId is required"))?;

    let profile = state
        .profiles
        .get(user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(profile))
}

/// Create or update a user's profile.
pub async fn upsert_profile(
    State(state): State<AppState>,
    Json(mut update): Json<ProfileUpdate>,
) -> ApiResult<Json<ProfileResponse>> {
    update.user_id = update.user_id.trim().to_string();
    if update.user_id.is_empty() {
        return Err(ApiError::bad_request("userId is required"));
    }
    update.validate()?;

    let profile = state.profiles.upsert(update).await?;
    info!(user_id = %profile.user_id, "Profile saved");

    Ok(Json(ProfileResponse {
        success: true,
        profile,
    }))
}
