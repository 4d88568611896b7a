//! HTML link extraction
//!
//! This module turns page content into the set of same-domain links to follow.
//!
//! **Include:**
//! - `<a href="...">` anywhere in the document
//!
//! **Exclude:**
//! - Fragment-only references (`#section`)
//! - `javascript:`, `mailto:`, `tel:`, `data:` and any other non-HTTP scheme
//! - Links whose host is not exactly the crawl domain
//!
//! Every returned URL is normalized (query and fragment stripped).

use crate::url::{is_same_domain, resolve_and_normalize};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Pluggable link-extraction capability used by the crawl engine
pub trait LinkExtractor: Send + Sync {
    /// Returns the normalized same-domain links referenced by `content`
    ///
    /// Implementations must not fail: unparseable content yields an empty set.
    fn extract(&self, content: &str, base_url: &Url, domain: &str) -> HashSet<String>;
}

/// Default extractor backed by `scraper`
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkExtractor;

impl LinkExtractor for HtmlLinkExtractor {
    fn extract(&self, content: &str, base_url: &Url, domain: &str) -> HashSet<String> {
        extract_links(content, base_url, domain)
    }
}

/// Extracts normalized same-domain links from decoded page content
///
/// The HTML parser recovers from malformed markup, so broken pages still
/// yield whatever anchors can be found.
///
/// # Example
///
/// ```
/// use site_sitemap::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/b#frag">B</a><a href="https://other.test/c">C</a>"#;
/// let base = Url::parse("https://x.test/a").unwrap();
/// let links = extract_links(html, &base, "x.test");
/// assert!(links.contains("https://x.test/b"));
/// assert_eq!(links.len(), 1);
/// ```
pub fn extract_links(html: &str, base_url: &Url, domain: &str) -> HashSet<String> {
    parse_html(html, base_url)
        .into_iter()
        .filter(|url| is_same_domain(url, domain))
        .map(|url| url.to_string())
        .collect()
}

/// Parses HTML content and resolves every anchor to a normalized URL
///
/// Domain filtering is left to the caller; duplicates are preserved.
pub fn parse_html(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let links: Vec<Url> = document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_and_normalize(href, base_url))
        .collect();

    tracing::trace!("Extracted {} links from {}", links.len(), base_url);
    links
}
