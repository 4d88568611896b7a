use crate::config::types::{Config, CrawlerConfig, OutputConfig, RemoteConfig, SiteConfig};
use crate::url::is_same_domain;
use crate::ConfigError;
use url::Url;

/// Upper bound on the worker pool size
const MAX_WORKERS_LIMIT: u32 = 256;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_crawler_config(&config.crawler)?;
    validate_client_identifier(&config.user_agent.client_identifier)?;
    validate_output_config(&config.output)?;
    if !config.output.run_locally {
        validate_remote_config(&config.remote)?;
    }
    Ok(())
}

/// Validates the domain and start URL
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    validate_domain_string(&config.domain)?;

    let start = Url::parse(&config.start_url).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", config.start_url, e))
    })?;

    if start.scheme() != "http" && start.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Start URL '{}' must use HTTP or HTTPS",
            config.start_url
        )));
    }

    if !is_same_domain(&start, &config.domain) {
        return Err(ConfigError::Validation(format!(
            "Start URL '{}' is not on domain '{}'",
            config.start_url, config.domain
        )));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_workers < 1 || config.max_workers > MAX_WORKERS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_workers must be between 1 and {}, got {}",
            MAX_WORKERS_LIMIT, config.max_workers
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    if config.max_crawl_duration == Some(0) {
        return Err(ConfigError::Validation(
            "max_crawl_duration must be >= 1s when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates the client identifier sent as User-Agent
fn validate_client_identifier(identifier: &str) -> Result<(), ConfigError> {
    if identifier.trim().is_empty() {
        return Err(ConfigError::Validation(
            "client_identifier cannot be empty".to_string(),
        ));
    }

    if identifier.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(format!(
            "client_identifier contains control characters: {:?}",
            identifier
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the remote destination, only required when uploading
fn validate_remote_config(config: &RemoteConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid remote endpoint '{}': {}", config.endpoint, e))
    })?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Remote endpoint '{}' must use HTTP or HTTPS",
            config.endpoint
        )));
    }

    if config.bucket.trim().is_empty() {
        return Err(ConfigError::Validation(
            "remote bucket cannot be empty when run_locally is false".to_string(),
        ));
    }

    if config.key.trim_start_matches('/').trim().is_empty() {
        return Err(ConfigError::Validation(
            "remote key cannot be empty when run_locally is false".to_string(),
        ));
    }

    if config.region.trim().is_empty() {
        return Err(ConfigError::Validation(
            "remote region cannot be empty when run_locally is false".to_string(),
        ));
    }

    Ok(())
}

/// Validates a bare host name such as `www.example.com` or `127.0.0.1`
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidDomain(
            "Domain cannot be empty".to_string(),
        ));
    }

    // Check for invalid characters (rules out schemes, ports and paths)
    if !domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    if domain.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ConfigError::InvalidDomain(format!(
            "Domain '{}' must be lowercase",
            domain
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.site.domain = "x.test".to_string();
        config.site.start_url = "https://x.test/a".to_string();
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_domain_string() {
        assert!(validate_domain_string("example.com").is_ok());
        assert!(validate_domain_string("sub.example.com").is_ok());
        assert!(validate_domain_string("127.0.0.1").is_ok());
        assert!(validate_domain_string("localhost").is_ok());

        assert!(validate_domain_string("").is_err());
        assert!(validate_domain_string("https://example.com").is_err());
        assert!(validate_domain_string("example.com:8080").is_err());
        assert!(validate_domain_string("example.com/path").is_err());
        assert!(validate_domain_string(".example.com").is_err());
        assert!(validate_domain_string("example..com").is_err());
        assert!(validate_domain_string("Example.com").is_err());
    }

    #[test]
    fn test_start_url_must_match_domain() {
        let mut config = valid_config();
        config.site.start_url = "https://other.test/".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::Validation(_)
        ));
    }

    #[test]
    fn test_start_url_must_be_http() {
        let mut config = valid_config();
        config.site.start_url = "ftp://x.test/".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_start_url_must_parse() {
        let mut config = valid_config();
        config.site.start_url = "not a url".to_string();
        assert!(matches!(
            validate(&config).unwrap_err(),
            ConfigError::InvalidUrl(_)
        ));
    }

    #[test]
    fn test_worker_bounds() {
        let mut config = valid_config();
        config.crawler.max_workers = 0;
        assert!(validate(&config).is_err());
        config.crawler.max_workers = MAX_WORKERS_LIMIT + 1;
        assert!(validate(&config).is_err());
        config.crawler.max_workers = MAX_WORKERS_LIMIT;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = valid_config();
        config.crawler.request_timeout = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_crawl_duration_rejected() {
        let mut config = valid_config();
        config.crawler.max_crawl_duration = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_client_identifier_rules() {
        assert!(validate_client_identifier("SitemapGenerator/1.0").is_ok());
        assert!(validate_client_identifier("").is_err());
        assert!(validate_client_identifier("Bot\n1.0").is_err());
    }

    #[test]
    fn test_remote_checked_only_when_uploading() {
        let mut config = valid_config();
        config.remote.bucket = String::new();
        assert!(validate(&config).is_ok());

        config.output.run_locally = false;
        assert!(validate(&config).is_err());

        config.remote.bucket = "bucket".to_string();
        config.remote.key = "/".to_string();
        assert!(validate(&config).is_err());

        config.remote.key = "/sitemaps/x.xml".to_string();
        assert!(validate(&config).is_ok());

        config.remote.region = " ".to_string();
        assert!(validate(&config).is_err());
    }
}
