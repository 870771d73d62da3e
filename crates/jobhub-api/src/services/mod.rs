//! Business logic services.

pub mod enrichment;
pub mod gemini;
pub mod job_query;
pub mod search_usage;
pub mod sitemap;
pub mod tavily;

pub use enrichment::{EnrichmentReport, EnrichmentService};
pub use gemini::GeminiEnricher;
pub use job_query::JobQueryService;
pub use search_usage::{SearchUsageTracker, UsageStatus};
pub use sitemap::SitemapGenerator;
pub use tavily::TavilyClient;
