//! Search quota handlers.

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::services::UsageStatus;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsageParams {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSearchRequest {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchUsageResponse {
    pub can_search: bool,
    pub searches_used: u32,
    pub searches_remaining: u32,
    pub is_premium: bool,
    pub limit: u32,
}

impl From<UsageStatus> for SearchUsageResponse {
    fn from(status: UsageStatus) -> Self {
        Self {
            can_search: status.allowance.allowed,
            searches_used: status.allowance.used,
            searches_remaining: status.allowance.remaining,
            is_premium: status.is_premium,
            limit: status.limit,
        }
    }
}

fn require_user_id(user_id: Option<&str>) -> ApiResult<&str> {
    user_id
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("userId is required"))
}

/// Today's quota position. Store failures yield the fail-open payload.
pub async fn get_search_usage(
    State(state): State<AppState>,
    Query(params): Query<SearchUsageParams>,
) -> ApiResult<Json<SearchUsageResponse>> {
    let user_id = require_user_id(params.user_id.as_deref())?;
    Ok(Json(state.usage.status(user_id).await.into()))
}

/// Count one performed search and return the updated position. A user
/// already at their limit gets 429 and the counter is left unchanged.
pub async fn record_search_usage(
    State(state): State<AppState>,
    Json(request): Json<RecordSearchRequest>,
) -> ApiResult<Json<SearchUsageResponse>> {
    let user_id = require_user_id(Some(&request.user_id))?;

    let status = state.usage.status(user_id).await;
    if !status.allowance.allowed {
        return Err(ApiError::QuotaExceeded {
            used: status.allowance.used,
            limit: status.limit,
        });
    }

    state.usage.record_search(user_id).await;
    Ok(Json(state.usage.status(user_id).await.into()))
}
