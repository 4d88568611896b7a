use crate::UrlError;
use url::Url;

/// Normalizes a URL for deduplication
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Reject URLs without a host
/// 4. Remove the query string
/// 5. Remove the fragment
///
/// Scheme and host case are canonicalized by the parser. The path is kept as
/// the server published it, so `/docs` and `/docs/` remain distinct pages.
///
/// Normalization is idempotent: normalizing an already normalized URL returns
/// the same URL.
///
/// # Examples
///
/// ```
/// use site_sitemap::url::normalize_url;
///
/// let url = normalize_url("https://Example.com/page?x=1#top").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/page");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Resolves a reference against a base URL and normalizes the result
///
/// Returns `None` for fragment-only references, empty references and anything
/// that does not resolve to an HTTP(S) URL with a host.
pub fn resolve_and_normalize(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let joined = base_url.join(href).ok()?;
    normalize_parsed(joined).ok()
}

fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}
