//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building the shared HTTP client with timeout and client identifier
//! - GET requests that only treat HTTP 200 as success
//! - Decoding the body with the charset the server declares
//! - Reading the Last-Modified header
//! - Keeping redirects on the crawled domain
//! - Error classification

use chrono::{DateTime, Utc};
use reqwest::header::LAST_MODIFIED;
use crate::url::is_same_domain;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::fmt;
use std::time::Duration;

/// Maximum redirect hops followed for a single page
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Page was served with HTTP 200
    Success {
        /// Page body, decoded using the declared charset (UTF-8 if none)
        body: String,
        /// Parsed Last-Modified header, `None` if absent or malformed
        last_modified: Option<DateTime<Utc>>,
    },

    /// Server answered with a status other than 200
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Request did not complete within the configured timeout
    Timeout,

    /// Connection, TLS, redirect or body read failure
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl fmt::Display for FetchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { body, .. } => write!(f, "HTTP 200 ({} bytes)", body.len()),
            Self::HttpError { status_code } => write!(f, "HTTP {}", status_code),
            Self::Timeout => write!(f, "request timeout"),
            Self::NetworkError { error } => write!(f, "network error: {}", error),
        }
    }
}

/// Builds an HTTP client with the crawl's timeout and client identifier
///
/// # Arguments
///
/// * `client_identifier` - Sent as the User-Agent header on every request
/// * `timeout` - Upper bound for a whole request, body included
///
/// # Example
///
/// ```no_run
/// use site_sitemap::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client("SitemapGenerator/1.0", Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(client_identifier: &str, timeout: Duration) -> Result<Client, reqwest::Error> {
    build_client(client_identifier, timeout, Policy::limited(MAX_REDIRECTS))
}

/// Builds the client used for crawling `domain`
///
/// Same as [`build_http_client`], except that a redirect to any other host is
/// not followed: the redirect response itself is returned, which the fetcher
/// reports as an HTTP error.
pub fn build_crawl_client(
    client_identifier: &str,
    timeout: Duration,
    domain: &str,
) -> Result<Client, reqwest::Error> {
    build_client(client_identifier, timeout, same_domain_redirects(domain))
}

fn build_client(
    client_identifier: &str,
    timeout: Duration,
    redirect: Policy,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(client_identifier)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(redirect)
        .gzip(true)
        .brotli(true)
        .build()
}

fn same_domain_redirects(domain: &str) -> Policy {
    let domain = domain.to_string();
    Policy::custom(move |attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if is_same_domain(attempt.url(), &domain) {
            attempt.follow()
        } else {
            tracing::debug!("Not following redirect off {} to {}", domain, attempt.url());
            attempt.stop()
        }
    })
}

/// Fetches a URL and classifies the outcome
///
/// # Outcome Mapping
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 200 | Success |
/// | Any other status | HttpError |
/// | Timeout | Timeout |
/// | Connection/TLS/redirect/body error | NetworkError |
///
/// A missing Last-Modified header yields `last_modified: None`. A malformed
/// one is logged and also yields `None`; it never fails the fetch.
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(e),
    };

    let status = response.status();
    if status != StatusCode::OK {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let last_modified = response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|value| match value.to_str() {
            Ok(raw) => parse_http_date(url, raw),
            Err(_) => {
                tracing::warn!("Non-ASCII Last-Modified header for {}", url);
                None
            }
        });

    match response.text().await {
        Ok(body) => FetchResult::Success {
            body,
            last_modified,
        },
        Err(e) => classify_error(e),
    }
}

/// Parses an HTTP-date (RFC 7231 IMF-fixdate, i.e. RFC 2822 syntax)
fn parse_http_date(url: &str, raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc2822(raw.trim()) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(e) => {
            tracing::warn!("Malformed Last-Modified header {:?} for {}: {}", raw, url, e);
            None
        }
    }
}

fn classify_error(e: reqwest::Error) -> FetchResult {
    if e.is_timeout() {
        FetchResult::Timeout
    } else if e.is_connect() {
        FetchResult::NetworkError {
            error: format!("connection failed: {}", e),
        }
    } else {
        FetchResult::NetworkError {
            error: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client("TestBot/1.0", Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[test]
    fn test_build_crawl_client() {
        let client = build_crawl_client("TestBot/1.0", Duration::from_secs(5), "example.com");
        assert!(client.is_ok());
    }

    #[test]
    fn test_parse_http_date() {
        let parsed = parse_http_date("https://x.test/", "Wed, 21 Oct 2015 07:28:00 GMT").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap());
    }

    #[test]
    fn test_parse_http_date_with_offset() {
        let parsed = parse_http_date("https://x.test/", "Wed, 21 Oct 2015 09:28:00 +0200").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap());
    }

    #[test]
    fn test_parse_http_date_malformed() {
        assert!(parse_http_date("https://x.test/", "yesterday-ish").is_none());
        assert!(parse_http_date("https://x.test/", "").is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            FetchResult::HttpError { status_code: 404 }.to_string(),
            "HTTP 404"
        );
        assert_eq!(FetchResult::Timeout.to_string(), "request timeout");
        let ok = FetchResult::Success {
            body: "abc".to_string(),
            last_modified: None,
        };
        assert!(ok.is_success());
        assert_eq!(ok.to_string(), "HTTP 200 (3 bytes)");
    }
}
