//! Job page extraction handler.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ExtractRequest {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub url: String,
    pub content: String,
    pub images: Vec<String>,
}

/// Only absolute http(s) URLs are forwarded to the provider.
fn validate_url(raw: Option<&str>) -> ApiResult<Url> {
    let raw = raw
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::bad_request("url is required"))?;

    let url = Url::parse(raw).map_err(|_| ApiError::bad_request("url is not a valid URL"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ApiError::bad_request("url must use http or https")),
    }
}

/// Extract the readable content of a job posting page.
pub async fn extract_job_info(
    State(state): State<AppState>,
    Json(request): Json<ExtractRequest>,
) -> ApiResult<Json<ExtractResponse>> {
    let url = validate_url(request.url.as_deref())?;

    let tavily = state
        .tavily
        .as_ref()
        .ok_or_else(|| ApiError::internal("Tavily API key is not configured"))?;

    let page = tavily.extract(url.as_str()).await?;

    Ok(Json(ExtractResponse {
        success: true,
        url: page.url,
        content: page.content,
        images: page.images,
    }))
}
