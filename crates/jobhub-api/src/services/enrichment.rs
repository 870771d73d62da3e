//! AI enrichment batch driven by the cron endpoint.

use futures_util::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use jobhub_models::Job;

use crate::error::ApiResult;
use crate::metrics;
use crate::services::gemini::GeminiEnricher;
use crate::services::job_query::JobQueryService;

/// Outcome of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    pub processed: usize,
    pub enriched: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct EnrichmentService {
    jobs: JobQueryService,
    enricher: GeminiEnricher,
    batch_size: u32,
}

impl EnrichmentService {
    pub fn new(jobs: JobQueryService, enricher: GeminiEnricher, batch_size: u32) -> Self {
        Self {
            jobs,
            enricher,
            batch_size,
        }
    }

    /// Enrich up to `batch_size` pending jobs concurrently. Per-job failures
    /// are counted; only failing to list pending jobs is an error.
    pub async fn run_batch(&self) -> ApiResult<EnrichmentReport> {
        let pending = self.jobs.pending_enrichment(self.batch_size).await?;
        if pending.is_empty() {
            info!("No jobs pending enrichment");
            return Ok(EnrichmentReport::default());
        }

        let results = join_all(pending.iter().map(|job| self.enrich_one(job))).await;

        let enriched = results.iter().filter(|ok| **ok).count();
        let report = EnrichmentReport {
            processed: results.len(),
            enriched,
            failed: results.len() - enriched,
        };

        info!(
            processed = report.processed,
            enriched = report.enriched,
            failed = report.failed,
            "Enrichment batch finished"
        );
        Ok(report)
    }

    async fn enrich_one(&self, job: &Job) -> bool {
        let outcome = match self.enricher.enhance(job).await {
            Ok(text) => self.jobs.set_enhanced_description(&job.id, &text).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(()) => {
                metrics::record_enrichment("enriched");
                true
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "Failed to enrich job");
                metrics::record_enrichment("failed");
                false
            }
        }
    }
}
