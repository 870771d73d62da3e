//! Prometheus metrics for the API server.

use std::sync::OnceLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex_lite::Regex;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "jobhub_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "jobhub_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "jobhub_http_requests_in_flight";

    // Search quota metrics
    pub const SEARCH_USAGE_CHECKS_TOTAL: &str = "jobhub_search_usage_checks_total";
    pub const SEARCHES_RECORDED_TOTAL: &str = "jobhub_searches_recorded_total";

    // Sitemap metrics
    pub const SITEMAP_FALLBACKS_TOTAL: &str = "jobhub_sitemap_fallbacks_total";

    // Enrichment metrics
    pub const ENRICHMENT_JOBS_TOTAL: &str = "jobhub_enrichment_jobs_total";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "jobhub_rate_limit_hits_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a quota check outcome: `allowed`, `blocked` or `fail_open`.
pub fn record_search_usage_check(outcome: &'static str) {
    counter!(names::SEARCH_USAGE_CHECKS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record a search counted against a user's quota.
pub fn record_search_recorded(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!(names::SEARCHES_RECORDED_TOTAL, "result" => result).increment(1);
}

/// Record a sitemap served empty because the store failed.
pub fn record_sitemap_fallback(kind: &'static str) {
    counter!(names::SITEMAP_FALLBACKS_TOTAL, "kind" => kind).increment(1);
}

/// Record one job's enrichment outcome: `enriched` or `failed`.
pub fn record_enrichment(outcome: &'static str) {
    counter!(names::ENRICHMENT_JOBS_TOTAL, "outcome" => outcome).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", sanitize_path(endpoint))];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

fn path_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"/jobs/slug/[^/]+", "/jobs/slug/:slug"),
            (r"^/sitemap-[0-9]+\.xml$", "/sitemap-:id.xml"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
        .collect()
    })
}

/// Sanitize path for metrics labels (collapse slugs and shard ids).
fn sanitize_path(path: &str) -> String {
    path_patterns()
        .iter()
        .fold(path.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(
            sanitize_path("/api/jobs/slug/senior-dev-dhaka"),
            "/api/jobs/slug/:slug"
        );
        assert_eq!(sanitize_path("/sitemap-12.xml"), "/sitemap-:id.xml");
        assert_eq!(sanitize_path("/sitemap.xml"), "/sitemap.xml");
        assert_eq!(sanitize_path("/api/jobs/search"), "/api/jobs/search");
    }
}
