//! Scheduled enrichment trigger.

use axum::extract::State;
use axum::Json;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Serialize)]
pub struct GenerateJobsResponse {
    pub success: bool,
    pub processed: usize,
    pub enriched: usize,
    pub failed: usize,
}

/// With no secret configured the endpoint is open.
fn authorize(secret: Option<&str>, bearer: Option<&Bearer>) -> ApiResult<()> {
    match secret {
        None => Ok(()),
        Some(expected) if bearer.map(Bearer::token) == Some(expected) => Ok(()),
        Some(_) => Err(ApiError::unauthorized("Invalid cron secret")),
    }
}

/// Enrich one batch of jobs that have no AI description yet.
pub async fn generate_jobs(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> ApiResult<Json<GenerateJobsResponse>> {
    let bearer = auth.as_ref().map(|TypedHeader(Authorization(b))| b);
    if let Err(e) = authorize(state.config.cron_secret.as_deref(), bearer) {
        warn!("Rejected cron request with missing or wrong secret");
        return Err(e);
    }

    let enrichment = state
        .enrichment
        .as_ref()
        .ok_or_else(|| ApiError::internal("Gemini API key is not configured"))?;

    let report = enrichment.run_batch().await?;
    info!(
        processed = report.processed,
        enriched = report.enriched,
        failed = report.failed,
        "Cron enrichment run finished"
    );

    Ok(Json(GenerateJobsResponse {
        success: true,
        processed: report.processed,
        enriched: report.enriched,
        failed: report.failed,
    }))
}
