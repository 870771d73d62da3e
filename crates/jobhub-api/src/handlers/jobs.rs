//! Job listing and search handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use jobhub_models::Job;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Lenient numeric query parameter: anything unparsable means "not given".
fn parse_u32(value: &Option<String>) -> Option<u32> {
    value.as_deref().and_then(|v| v.trim().parse().ok())
}

#[derive(Debug, Deserialize)]
pub struct ListJobsParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Serialize)]
pub struct ListJobsResponse {
    pub success: bool,
    pub count: usize,
    pub jobs: Vec<Job>,
}

/// List jobs, newest first.
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsParams>,
) -> ApiResult<Json<ListJobsResponse>> {
    let jobs = state
        .jobs
        .list(parse_u32(&params.limit), parse_u32(&params.offset))
        .await?;

    Ok(Json(ListJobsResponse {
        success: true,
        count: jobs.len(),
        jobs,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchJobsParams {
    pub q: Option<String>,
    pub location: Option<String>,
    pub limit: Option<String>,
    /// When present the search counts against this user's daily quota.
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct SearchJobsResponse {
    pub jobs: Vec<Job>,
    pub total: usize,
    pub query: String,
    pub location: String,
    pub source: &'static str,
    pub cached: bool,
}

/// Keyword search, optionally gated by the caller's search quota.
pub async fn search_jobs(
    State(state): State<AppState>,
    Query(params): Query<SearchJobsParams>,
) -> ApiResult<Json<SearchJobsResponse>> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(ApiError::bad_request("Search query is required"));
    }

    let user_id = params
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty());

    if let Some(user_id) = user_id {
        let status = state.usage.status(user_id).await;
        if !status.allowance.allowed {
            info!(user_id = %user_id, used = status.allowance.used, "Search blocked by daily limit");
            return Err(ApiError::QuotaExceeded {
                used: status.allowance.used,
                limit: status.limit,
            });
        }
    }

    let outcome = state
        .jobs
        .search(query, params.location.as_deref(), parse_u32(&params.limit))
        .await?;

    if let Some(user_id) = user_id {
        state.usage.record_search(user_id).await;
    }

    Ok(Json(SearchJobsResponse {
        total: outcome.jobs.len(),
        jobs: outcome.jobs,
        query: outcome.query,
        location: outcome.location,
        source: "database",
        cached: true,
    }))
}

#[derive(Serialize)]
pub struct JobResponse {
    pub success: bool,
    pub job: Job,
}

/// Look up one job by its public slug.
pub async fn get_job_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<JobResponse>> {
    let job = state
        .jobs
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("Job not found"))?;

    Ok(Json(JobResponse { success: true, job }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_u32_is_lenient() {
        assert_eq!(parse_u32(&Some("25".to_string())), Some(25));
        assert_eq!(parse_u32(&Some(" 7 ".to_string())), Some(7));
        assert_eq!(parse_u32(&Some("abc".to_string())), None);
        assert_eq!(parse_u32(&Some("-1".to_string())), None);
        assert_eq!(parse_u32(&None), None);
    }
}
