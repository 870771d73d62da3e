//! Sitemap and robots handlers.
//!
//! Store failures never surface as errors here: crawlers get a valid empty
//! document with status 200.

use axum::extract::{Path, State};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use tracing::warn;

use crate::metrics;
use crate::services::sitemap::{parse_shard_file, shard_offset, URLS_PER_SHARD};
use crate::state::AppState;

const CACHE_POLICY: &str = "public, max-age=3600";

fn xml_response(body: String) -> Response {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "application/xml; charset=utf-8"),
            (CACHE_CONTROL, CACHE_POLICY),
        ],
        body,
    )
        .into_response()
}

/// Sitemap index.
pub async fn sitemap_index(State(state): State<AppState>) -> Response {
    let body = match state.jobs.count().await {
        Ok(total) => state.sitemap.generate_index(total, Utc::now()),
        Err(e) => {
            warn!(error = %e, "Job count failed, serving empty sitemap index");
            metrics::record_sitemap_fallback("index");
            state.sitemap.empty_index()
        }
    };
    xml_response(body)
}

/// One sitemap shard, requested as `/sitemap-{id}.xml`.
pub async fn sitemap_shard(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    let Some(shard_id) = parse_shard_file(&file) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let body = match state.jobs.range(shard_offset(shard_id), URLS_PER_SHARD).await {
        Ok(jobs) => state.sitemap.generate_shard(shard_id, &jobs, Utc::now()),
        Err(e) => {
            warn!(shard_id, error = %e, "Job fetch failed, serving empty sitemap shard");
            metrics::record_sitemap_fallback("shard");
            state.sitemap.empty_urlset()
        }
    };
    xml_response(body)
}

/// robots.txt pointing crawlers at the sitemap index.
pub async fn robots_txt(State(state): State<AppState>) -> Response {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8"),
            (CACHE_CONTROL, CACHE_POLICY),
        ],
        state.sitemap.robots_txt(),
    )
        .into_response()
}
