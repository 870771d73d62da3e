//! Sitemap protocol XML generation.
//!
//! Job URLs are split into shards of [`URLS_PER_SHARD`]; the index always
//! lists at least [`MIN_SHARDS`] shards so crawlers see a stable set of
//! files while the catalogue is small.

use std::fmt::Write as _;

use chrono::{DateTime, SecondsFormat, Utc};

use jobhub_models::Job;

/// Job URLs per shard file (sitemap protocol limit is 50k; we stay lower).
pub const URLS_PER_SHARD: u64 = 10_000;

/// Shards the index lists even when fewer are needed.
pub const MIN_SHARDS: u64 = 3;

/// Marketing pages listed at the top of shard 0, with crawl priority.
pub const STATIC_PAGES: &[(&str, &str, &str)] = &[
    ("/", "daily", "1.0"),
    ("/jobs", "hourly", "0.9"),
    ("/about", "monthly", "0.5"),
    ("/pricing", "monthly", "0.6"),
    ("/contact", "monthly", "0.4"),
    ("/privacy", "yearly", "0.3"),
    ("/terms", "yearly", "0.3"),
];

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Number of shards the index references for `total_jobs`.
pub fn shard_count(total_jobs: u64) -> u64 {
    total_jobs.div_ceil(URLS_PER_SHARD).max(MIN_SHARDS)
}

/// Offset of the first job in `shard_id`.
pub fn shard_offset(shard_id: u64) -> u64 {
    shard_id.saturating_mul(URLS_PER_SHARD)
}

/// Parse a shard file name such as `sitemap-3.xml`.
pub fn parse_shard_file(file: &str) -> Option<u64> {
    let id = file.strip_prefix("sitemap-")?.strip_suffix(".xml")?;
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    id.parse().ok()
}

/// Escape the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn w3c_datetime(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Pure sitemap renderer bound to the public site origin.
#[derive(Debug, Clone)]
pub struct SitemapGenerator {
    site_url: String,
}

impl SitemapGenerator {
    pub fn new(site_url: impl Into<String>) -> Self {
        let site_url = site_url.into();
        Self {
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn site_url(&self) -> &str {
        &self.site_url
    }

    /// Public URL of a job page.
    pub fn job_url(&self, slug: &str) -> String {
        format!("{}/jobs/{}", self.site_url, urlencoding::encode(slug))
    }

    /// Sitemap index listing `shard_count(total_jobs)` shard files.
    pub fn generate_index(&self, total_jobs: u64, now: DateTime<Utc>) -> String {
        let lastmod = w3c_datetime(now);
        let mut xml = String::new();
        let _ = writeln!(xml, "{}", XML_DECLARATION);
        let _ = writeln!(xml, r#"<sitemapindex xmlns="{}">"#, SITEMAP_NS);

        for shard_id in 0..shard_count(total_jobs) {
            let loc = format!("{}/sitemap-{}.xml", self.site_url, shard_id);
            let _ = writeln!(
                xml,
                "  <sitemap>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n  </sitemap>",
                escape_xml(&loc),
                lastmod
            );
        }

        xml.push_str("</sitemapindex>\n");
        xml
    }

    /// One shard. Shard 0 starts with the static pages; jobs without a slug
    /// are skipped.
    pub fn generate_shard(&self, shard_id: u64, jobs: &[Job], now: DateTime<Utc>) -> String {
        let mut xml = String::new();
        let _ = writeln!(xml, "{}", XML_DECLARATION);
        let _ = writeln!(xml, r#"<urlset xmlns="{}">"#, SITEMAP_NS);

        if shard_id == 0 {
            let lastmod = w3c_datetime(now);
            for (path, changefreq, priority) in STATIC_PAGES {
                let loc = format!("{}{}", self.site_url, path);
                push_url(&mut xml, &loc, &lastmod, changefreq, priority);
            }
        }

        for job in jobs {
            let Some(slug) = job.public_slug() else {
                continue;
            };
            let lastmod = w3c_datetime(job.last_modified());
            push_url(&mut xml, &self.job_url(slug), &lastmod, "weekly", "0.8");
        }

        xml.push_str("</urlset>\n");
        xml
    }

    /// Valid index with no entries.
    pub fn empty_index(&self) -> String {
        format!(
            "{}\n<sitemapindex xmlns=\"{}\">\n</sitemapindex>\n",
            XML_DECLARATION, SITEMAP_NS
        )
    }

    /// Valid urlset with no entries.
    pub fn empty_urlset(&self) -> String {
        format!("{}\n<urlset xmlns=\"{}\">\n</urlset>\n", XML_DECLARATION, SITEMAP_NS)
    }

    pub fn robots_txt(&self) -> String {
        format!(
            "User-agent: *\nAllow: /\nDisallow: /api/\n\nSitemap: {}/sitemap.xml\n",
            self.site_url
        )
    }
}

fn push_url(xml: &mut String, loc: &str, lastmod: &str, changefreq: &str, priority: &str) {
    let _ = writeln!(
        xml,
        "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>",
        escape_xml(loc),
        lastmod,
        changefreq,
        priority
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use jobhub_models::JobId;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    fn job(id: &str, slug: Option<&str>) -> Job {
        Job {
            id: JobId::from(id),
            title: "Senior Developer".to_string(),
            company: "Acme".to_string(),
            location: "Dhaka".to_string(),
            description: String::new(),
            apply_url: None,
            slug: slug.map(str::to_string),
            source: None,
            job_type: None,
            salary: None,
            enhanced_description: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    #[test]
    fn test_shard_count_has_floor_of_three() {
        for (total, expected) in [(0, 3), (1, 3), (10_000, 3), (10_001, 3), (25_000, 3)] {
            assert_eq!(shard_count(total), expected, "total={}", total);
        }
        assert_eq!(shard_count(30_000), 3);
        assert_eq!(shard_count(30_001), 4);
        assert_eq!(shard_count(95_000), 10);
    }

    #[test]
    fn test_index_lists_every_shard() {
        let gen = SitemapGenerator::new("https://jobs.example.com/");
        let xml = gen.generate_index(40_001, now());
        assert_eq!(xml.matches("<sitemap>").count(), 5);
        assert!(xml.contains("<loc>https://jobs.example.com/sitemap-0.xml</loc>"));
        assert!(xml.contains("<loc>https://jobs.example.com/sitemap-4.xml</loc>"));
        assert!(!xml.contains("sitemap-5.xml"));
    }

    #[test]
    fn test_shard_skips_slugless_jobs() {
        let gen = SitemapGenerator::new("https://jobs.example.com");
        let jobs = vec![
            job("1", Some("senior-dev-dhaka")),
            job("2", None),
            job("3", Some("   ")),
        ];
        let xml = gen.generate_shard(1, &jobs, now());

        assert!(xml.contains("<loc>https://jobs.example.com/jobs/senior-dev-dhaka</loc>"));
        assert_eq!(xml.matches("<url>").count(), 1);
        assert!(xml.contains("<lastmod>2025-01-01T08:00:00Z</lastmod>"));
    }

    #[test]
    fn test_shard_zero_starts_with_static_pages() {
        let gen = SitemapGenerator::new("https://jobs.example.com");
        let xml = gen.generate_shard(0, &[job("1", Some("a"))], now());

        assert_eq!(xml.matches("<url>").count(), STATIC_PAGES.len() + 1);
        let pricing = xml.find("https://jobs.example.com/pricing").unwrap();
        let job_url = xml.find("https://jobs.example.com/jobs/a").unwrap();
        assert!(pricing < job_url);

        let other = gen.generate_shard(2, &[], now());
        assert_eq!(other.matches("<url>").count(), 0);
    }

    #[test]
    fn test_lastmod_prefers_update_time() {
        let gen = SitemapGenerator::new("https://jobs.example.com");
        let mut j = job("1", Some("a"));
        j.updated_at = Some(Utc.with_ymd_and_hms(2025, 2, 3, 4, 5, 6).unwrap());
        let xml = gen.generate_shard(1, &[j], now());
        assert!(xml.contains("<lastmod>2025-02-03T04:05:06Z</lastmod>"));
    }

    #[test]
    fn test_entities_are_escaped() {
        let gen = SitemapGenerator::new("https://jobs.example.com");
        let xml = gen.generate_shard(1, &[job("1", Some("r&d <lead>"))], now());
        assert!(xml.contains("/jobs/r%26d%20%3Clead%3E"));
        assert!(!xml.contains("<lead>"));
        assert_eq!(escape_xml(r#"a&b<"c'>"#), "a&amp;b&lt;&quot;c&apos;&gt;");
    }

    #[test]
    fn test_parse_shard_file() {
        assert_eq!(parse_shard_file("sitemap-0.xml"), Some(0));
        assert_eq!(parse_shard_file("sitemap-12.xml"), Some(12));
        assert_eq!(parse_shard_file("sitemap-.xml"), None);
        assert_eq!(parse_shard_file("sitemap--1.xml"), None);
        assert_eq!(parse_shard_file("sitemap-1.txt"), None);
        assert_eq!(parse_shard_file("favicon.ico"), None);
    }

    #[test]
    fn test_empty_documents_are_well_formed() {
        let gen = SitemapGenerator::new("https://jobs.example.com");
        assert!(gen.empty_index().starts_with(XML_DECLARATION));
        assert!(gen.empty_index().trim_end().ends_with("</sitemapindex>"));
        assert!(gen.empty_urlset().trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_robots_points_to_index() {
        let gen = SitemapGenerator::new("https://jobs.example.com");
        let robots = gen.robots_txt();
        assert!(robots.contains("Disallow: /api/"));
        assert!(robots.contains("Sitemap: https://jobs.example.com/sitemap.xml"));
    }
}
