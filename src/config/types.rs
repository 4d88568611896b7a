use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// usable configuration that the CLI can then override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
}

/// The site being mapped
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Host that discovered links must match exactly
    pub domain: String,

    /// URL the crawl starts from (depth 0)
    #[serde(rename = "start-url")]
    pub start_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: "www.example.com".to_string(),
            start_url: "https://www.example.com/home".to_string(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrawlerConfig {
    /// Maximum number of hops from the start URL
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Size of the worker pool
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: u32,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Whether robots.txt is consulted before fetching
    #[serde(rename = "respect-robots-txt", default = "default_true")]
    pub respect_robots_txt: bool,

    /// Stop dispatching new depth rounds after this many seconds
    #[serde(rename = "max-crawl-duration", default)]
    pub max_crawl_duration: Option<u64>,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn max_crawl_duration(&self) -> Option<Duration> {
        self.max_crawl_duration.map(Duration::from_secs)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_workers: default_max_workers(),
            request_timeout: default_request_timeout(),
            respect_robots_txt: true,
            max_crawl_duration: None,
        }
    }
}

/// Modification-time filter configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    /// Whether pages must be modified after `threshold` to be recorded
    #[serde(rename = "use-time-filter", default = "default_true")]
    pub use_time_filter: bool,

    /// RFC 3339 timestamp, e.g. "2022-09-20T00:00:00Z"
    #[serde(default = "default_threshold")]
    pub threshold: DateTime<Utc>,

    /// What to do with pages that carry no usable Last-Modified header
    #[serde(rename = "undated-pages", default)]
    pub undated_pages: UndatedPolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            use_time_filter: true,
            threshold: default_threshold(),
            undated_pages: UndatedPolicy::default(),
        }
    }
}

/// Policy for pages without a usable Last-Modified header
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UndatedPolicy {
    /// Stamp the page with the fetch time; it always passes the time filter
    #[default]
    AssumeFresh,
    /// Reject the page when the time filter is enabled
    Exclude,
}

/// Client identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserAgentConfig {
    /// Sent as the User-Agent header and matched against robots.txt groups
    #[serde(rename = "client-identifier")]
    pub client_identifier: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            client_identifier: "SitemapGenerator/1.0".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// Path of the sitemap file written locally
    #[serde(default = "default_output_path")]
    pub path: String,

    /// When false, the written file is also uploaded to the remote store
    #[serde(rename = "run-locally", default = "default_true")]
    pub run_locally: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            run_locally: true,
        }
    }
}

/// Remote object store destination
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    /// Base URL of the object store
    #[serde(default = "default_remote_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_remote_bucket")]
    pub bucket: String,

    #[serde(default = "default_remote_key")]
    pub key: String,

    /// Region used in the request signature scope
    #[serde(default = "default_remote_region")]
    pub region: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: default_remote_endpoint(),
            bucket: default_remote_bucket(),
            key: default_remote_key(),
            region: default_remote_region(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_depth() -> u32 {
    10
}

fn default_max_workers() -> u32 {
    5
}

fn default_request_timeout() -> u64 {
    30
}

fn default_threshold() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2022, 9, 20, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn default_output_path() -> String {
    "sitemap.xml".to_string()
}

fn default_remote_endpoint() -> String {
    "https://s3.amazonaws.com".to_string()
}

fn default_remote_bucket() -> String {
    "example-s3-bucket".to_string()
}

fn default_remote_key() -> String {
    "/path/to/sitemap.xml".to_string()
}

fn default_remote_region() -> String {
    "us-east-1".to_string()
}
