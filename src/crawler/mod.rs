//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a per-request timeout
//! - HTML parsing and link extraction
//! - The frontier and the visited set
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod parser;

pub use coordinator::{run_crawl, Coordinator, CrawlOutcome, CrawlSession};
pub use fetcher::{build_crawl_client, build_http_client, fetch_url, FetchResult};
pub use frontier::{FrontierItem, VisitedSet};
pub use parser::{extract_links, parse_html, HtmlLinkExtractor, LinkExtractor};

use crate::config::Config;
use crate::SitemapError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and build the HTTP client
/// 2. Load robots.txt (when enabled)
/// 3. Crawl the site breadth-first, one depth round at a time
/// 4. Return the accepted pages and the crawl statistics
///
/// Writing or uploading the sitemap is left to the caller.
///
/// # Returns
///
/// * `Ok(CrawlOutcome)` - Crawl completed
/// * `Err(SitemapError)` - Setup failed
pub async fn crawl(config: Config) -> Result<CrawlOutcome, SitemapError> {
    run_crawl(config).await
}
