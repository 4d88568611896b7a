//! site-sitemap main entry point
//!
//! This is the command-line interface for the sitemap crawler.

use anyhow::{Context, Result};
use clap::Parser;
use site_sitemap::config::{compute_config_hash, parse_config_file, validate, Config};
use site_sitemap::crawler::{build_http_client, crawl};
use site_sitemap::output::{print_statistics, AwsCredentials, ObjectStoreUploader};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// site-sitemap: build a sitemap for one website
///
/// Crawls a single domain breadth-first from a start URL, honoring
/// robots.txt and an optional modification-time filter, and writes the
/// accepted pages as sitemaps.org XML.
#[derive(Parser, Debug)]
#[command(name = "site-sitemap")]
#[command(version = "1.0.0")]
#[command(about = "Crawl a website and generate its sitemap.xml", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Domain to map (overrides [site] domain)
    #[arg(long, env = "DOMAIN")]
    domain: Option<String>,

    /// URL to start from (overrides [site] start-url)
    #[arg(long, env = "START_URL")]
    start_url: Option<String>,

    /// Maximum link depth (overrides [crawler] max-depth)
    #[arg(long, env = "MAX_DEPTH")]
    max_depth: Option<u32>,

    /// Worker pool size (overrides [crawler] max-workers)
    #[arg(long, env = "MAX_WORKERS")]
    max_workers: Option<u32>,

    /// Sitemap output file (overrides [output] path)
    #[arg(long, value_name = "FILE", env = "OUTPUT_FILENAME")]
    output: Option<String>,

    /// Apply the Last-Modified filter: "true" or anything else for false
    /// (overrides [filter] use-time-filter)
    #[arg(long, value_name = "BOOL", env = "USE_TIME_FILTER", value_parser = parse_flag)]
    use_time_filter: Option<bool>,

    /// Fetch and honor robots.txt (overrides [crawler] respect-robots-txt)
    #[arg(long, value_name = "BOOL", env = "RESPECT_ROBOTS_TXT", value_parser = parse_flag)]
    respect_robots_txt: Option<bool>,

    /// Per-request timeout in seconds (overrides [crawler] request-timeout)
    #[arg(long, value_name = "SECONDS", env = "REQUEST_TIMEOUT")]
    request_timeout: Option<u64>,

    /// Client identifier sent as User-Agent (overrides [user-agent] client-identifier)
    #[arg(long, env = "USER_AGENT")]
    user_agent: Option<String>,

    /// Skip the upload step (overrides [output] run-locally)
    #[arg(long, value_name = "BOOL", env = "RUN_LOCALLY", value_parser = parse_flag)]
    run_locally: Option<bool>,

    /// Upload bucket (overrides [remote] bucket)
    #[arg(long, env = "S3_BUCKET")]
    s3_bucket: Option<String>,

    /// Upload object key (overrides [remote] key)
    #[arg(long, env = "S3_KEY")]
    s3_key: Option<String>,

    /// Region for upload signing (overrides [remote] region)
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,
}

/// Only a case-insensitive "true" enables a switch; any other value disables it
fn parse_flag(value: &str) -> Result<bool, String> {
    Ok(value.trim().eq_ignore_ascii_case("true"))
}

impl Cli {
    /// Applies command-line and environment overrides on top of `config`
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(domain) = &self.domain {
            config.site.domain = domain.clone();
        }
        if let Some(start_url) = &self.start_url {
            config.site.start_url = start_url.clone();
        }
        if let Some(max_depth) = self.max_depth {
            config.crawler.max_depth = max_depth;
        }
        if let Some(max_workers) = self.max_workers {
            config.crawler.max_workers = max_workers;
        }
        if let Some(request_timeout) = self.request_timeout {
            config.crawler.request_timeout = request_timeout;
        }
        if let Some(respect) = self.respect_robots_txt {
            config.crawler.respect_robots_txt = respect;
        }
        if let Some(enabled) = self.use_time_filter {
            config.filter.use_time_filter = enabled;
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent.client_identifier = user_agent.clone();
        }
        if let Some(output) = &self.output {
            config.output.path = output.clone();
        }
        if let Some(run_locally) = self.run_locally {
            config.output.run_locally = run_locally;
        }
        if let Some(bucket) = &self.s3_bucket {
            config.remote.bucket = bucket.clone();
        }
        if let Some(key) = &self.s3_key {
            config.remote.key = key.clone();
        }
        if let Some(region) = &self.region {
            config.remote.region = region.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => load_with_hash(path)?,
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("Invalid configuration")?;

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(ExitCode::SUCCESS);
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_sitemap=info,warn"),
            1 => EnvFilter::new("site_sitemap=debug,info"),
            2 => EnvFilter::new("site_sitemap=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Reads the config file and logs its hash; validation happens after overrides
fn load_with_hash(path: &Path) -> Result<Config> {
    tracing::info!("Loading configuration from: {}", path.display());

    let config = parse_config_file(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    let hash = compute_config_hash(path)
        .with_context(|| format!("Failed to hash {}", path.display()))?;

    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== site-sitemap Dry Run ===\n");

    println!("Site:");
    println!("  Domain: {}", config.site.domain);
    println!("  Start URL: {}", config.site.start_url);

    println!("\nCrawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Max workers: {}", config.crawler.max_workers);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);
    match config.crawler.max_crawl_duration {
        Some(seconds) => println!("  Time budget: {}s", seconds),
        None => println!("  Time budget: unlimited"),
    }

    println!("\nTime Filter:");
    if config.filter.use_time_filter {
        println!("  Modified after: {}", config.filter.threshold.to_rfc3339());
        println!("  Undated pages: {:?}", config.filter.undated_pages);
    } else {
        println!("  Disabled");
    }

    println!("\nUser Agent: {}", config.user_agent.client_identifier);

    println!("\nOutput:");
    println!("  Sitemap: {}", config.output.path);
    if config.output.run_locally {
        println!("  Upload: disabled (running locally)");
    } else {
        println!(
            "  Upload: {}/{}/{} ({})",
            config.remote.endpoint.trim_end_matches('/'),
            config.remote.bucket,
            config.remote.key.trim_start_matches('/'),
            config.remote.region
        );
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
///
/// The sitemap is written even when nothing was accepted. A failed upload
/// leaves the local file in place and yields a failing exit code.
async fn handle_crawl(config: Config) -> Result<ExitCode> {
    let output_path = PathBuf::from(&config.output.path);
    let run_locally = config.output.run_locally;
    let remote = config.remote.clone();
    let client_identifier = config.user_agent.client_identifier.clone();
    let request_timeout = config.crawler.request_timeout();

    let outcome = crawl(config).await.context("Crawl setup failed")?;

    outcome
        .sitemap
        .write_to(&output_path)
        .with_context(|| format!("Failed to write sitemap to {}", output_path.display()))?;

    println!();
    print_statistics(&outcome.statistics);

    if run_locally {
        println!("\n✓ Sitemap written to: {}", output_path.display());
        return Ok(ExitCode::SUCCESS);
    }

    let client = build_http_client(&client_identifier, request_timeout)
        .context("Failed to build upload client")?;
    let uploader = match AwsCredentials::from_env() {
        Some(credentials) => {
            ObjectStoreUploader::new(client, &remote).with_credentials(credentials)
        }
        None => {
            tracing::warn!("AWS credentials not set; sending the upload unsigned");
            ObjectStoreUploader::new(client, &remote)
        }
    };

    if uploader.upload(&output_path).await {
        println!("\n✓ Sitemap uploaded to: {}/{}", remote.bucket, remote.key);
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("Upload failed; sitemap kept at {}", output_path.display());
        Ok(ExitCode::FAILURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["site-sitemap"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_flag_only_true_enables() {
        assert_eq!(parse_flag("true"), Ok(true));
        assert_eq!(parse_flag("TRUE"), Ok(true));
        assert_eq!(parse_flag(" True "), Ok(true));
        assert_eq!(parse_flag("false"), Ok(false));
        assert_eq!(parse_flag("1"), Ok(false));
        assert_eq!(parse_flag("yes"), Ok(false));
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let cli = parse(&[
            "--domain",
            "x.test",
            "--start-url",
            "https://x.test/",
            "--max-depth",
            "2",
            "--max-workers",
            "7",
            "--request-timeout",
            "9",
            "--respect-robots-txt",
            "false",
            "--use-time-filter",
            "False",
            "--user-agent",
            "MapBot/2.0",
            "--output",
            "out.xml",
            "--run-locally",
            "false",
            "--s3-bucket",
            "maps",
            "--s3-key",
            "x/sitemap.xml",
            "--region",
            "eu-central-1",
        ]);
        let mut config = Config::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.site.domain, "x.test");
        assert_eq!(config.site.start_url, "https://x.test/");
        assert_eq!(config.crawler.max_depth, 2);
        assert_eq!(config.crawler.max_workers, 7);
        assert_eq!(config.crawler.request_timeout, 9);
        assert!(!config.crawler.respect_robots_txt);
        assert!(!config.filter.use_time_filter);
        assert_eq!(config.user_agent.client_identifier, "MapBot/2.0");
        assert_eq!(config.output.path, "out.xml");
        assert!(!config.output.run_locally);
        assert_eq!(config.remote.bucket, "maps");
        assert_eq!(config.remote.key, "x/sitemap.xml");
        assert_eq!(config.remote.region, "eu-central-1");
    }

    #[test]
    fn test_flag_override_can_enable() {
        let cli = parse(&["--run-locally", "TRUE", "--use-time-filter", "true"]);
        let mut config = Config::default();
        config.output.run_locally = false;
        config.filter.use_time_filter = false;
        cli.apply_overrides(&mut config);

        assert!(config.output.run_locally);
        assert!(config.filter.use_time_filter);
    }

    #[test]
    fn test_invalid_number_rejected() {
        let result = Cli::try_parse_from(["site-sitemap", "--request-timeout", "soon"]);
        assert!(result.is_err());
    }
}
