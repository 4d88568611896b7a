//! Robots.txt handling module
//!
//! The site's robots.txt is fetched once before crawling starts and is
//! read-only afterwards. "Policy unavailable" and "policy denies" are kept
//! apart: only the former is fail-open.

mod parser;

pub use parser::{product_token, ParsedRobots};

use crate::url::robots_url;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

/// Reasons a robots.txt could not be turned into a policy
#[derive(Debug, Error)]
pub enum RobotsError {
    #[error("Cannot derive a robots.txt location from {0}")]
    NoOrigin(String),

    #[error("robots.txt request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },

    #[error("robots.txt at {url} returned HTTP {status}")]
    Status { url: String, status: StatusCode },

    #[error("robots.txt at {url} is not valid UTF-8")]
    Encoding { url: String },
}

/// The admission policy for the crawl
#[derive(Debug, Clone)]
pub enum RobotsPolicy {
    /// robots.txt checking is turned off in the configuration
    Disabled,
    /// robots.txt could not be fetched or decoded; everything is admitted
    Unavailable,
    /// A parsed ruleset answers admission queries
    Loaded(ParsedRobots),
}

impl RobotsPolicy {
    /// Fetches and parses the site's robots.txt
    ///
    /// Any failure is logged as a warning and yields `Unavailable`, so an
    /// absent or unreachable robots.txt never blocks crawling.
    pub async fn initialize(client: &Client, start_url: &Url) -> Self {
        match fetch_robots(client, start_url).await {
            Ok(robots) => {
                tracing::info!("Loaded robots.txt for {}", start_url.origin().ascii_serialization());
                Self::Loaded(robots)
            }
            Err(RobotsError::Status { url, status }) if status == StatusCode::NOT_FOUND => {
                tracing::info!("No robots.txt at {}, crawling unrestricted", url);
                Self::Unavailable
            }
            Err(e) => {
                tracing::warn!("{}; crawling unrestricted", e);
                Self::Unavailable
            }
        }
    }

    /// Checks whether `url` may be fetched by `user_agent`
    pub fn can_fetch(&self, url: &Url, user_agent: &str) -> bool {
        match self {
            Self::Disabled | Self::Unavailable => true,
            Self::Loaded(robots) => robots.is_allowed(url.as_str(), user_agent),
        }
    }
}

/// Fetches robots.txt from the origin of `start_url`
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - robots.txt was served with a success status
/// * `Err(RobotsError)` - no usable robots.txt
pub async fn fetch_robots(client: &Client, start_url: &Url) -> Result<ParsedRobots, RobotsError> {
    let location =
        robots_url(start_url).ok_or_else(|| RobotsError::NoOrigin(start_url.to_string()))?;
    let url = location.to_string();

    tracing::debug!("Fetching robots.txt from {}", url);

    let response = client
        .get(location)
        .send()
        .await
        .map_err(|source| RobotsError::Request {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(RobotsError::Status { url, status });
    }

    let body = response
        .bytes()
        .await
        .map_err(|source| RobotsError::Request {
            url: url.clone(),
            source,
        })?;

    let content = String::from_utf8(body.to_vec()).map_err(|_| RobotsError::Encoding { url })?;

    Ok(ParsedRobots::from_content(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(path: &str) -> Url {
        Url::parse("https://example.com").unwrap().join(path).unwrap()
    }

    #[test]
    fn test_disabled_allows_everything() {
        let policy = RobotsPolicy::Disabled;
        assert!(policy.can_fetch(&page("/admin"), "TestBot"));
    }

    #[test]
    fn test_unavailable_fails_open() {
        let policy = RobotsPolicy::Unavailable;
        assert!(policy.can_fetch(&page("/admin"), "TestBot"));
    }

    #[test]
    fn test_loaded_policy_denies() {
        let policy =
            RobotsPolicy::Loaded(ParsedRobots::from_content("User-agent: *\nDisallow: /admin"));
        assert!(policy.can_fetch(&page("/public"), "TestBot/1.0"));
        assert!(!policy.can_fetch(&page("/admin/panel"), "TestBot/1.0"));
    }
}
