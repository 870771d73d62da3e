//! API routes.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers::{
    extract_job_info, generate_jobs, get_job_by_slug, get_profile, get_search_usage, health,
    list_jobs, ready, record_search_usage, robots_txt, search_jobs, sitemap_index, sitemap_shard,
    upsert_profile,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, mask_internal_errors, rate_limit_middleware, request_id, request_logging,
    security_headers, RateLimiterCache,
};
use crate::state::AppState;

/// Requests exceeding `timeout` are answered with 408.
fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/jobs", get(list_jobs))
        .route("/jobs/search", get(search_jobs))
        .route("/jobs/slug/:slug", get(get_job_by_slug))
        .route("/jobs/extract-info", post(extract_job_info));

    let user_routes = Router::new()
        .route(
            "/search-usage",
            get(get_search_usage).post(record_search_usage),
        )
        .route("/profile", get(get_profile).post(upsert_profile));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(job_routes)
        .merge(user_routes)
        .layer(timeout_layer(state.config.request_timeout))
        .layer(middleware::from_fn_with_state(
            rate_limiter,
            rate_limit_middleware,
        ));

    // AI generation runs well past the normal request timeout
    let cron_routes = Router::new()
        .route("/cron/generate-jobs", get(generate_jobs).post(generate_jobs))
        .layer(timeout_layer(state.config.generation_timeout));

    // `/:file` serves `sitemap-{id}.xml`; any other name is a 404
    let seo_routes = Router::new()
        .route("/sitemap.xml", get(sitemap_index))
        .route("/robots.txt", get(robots_txt))
        .route("/:file", get(sitemap_shard));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes.merge(cron_routes))
        .merge(seo_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            mask_internal_errors,
        ))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
