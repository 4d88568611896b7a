use url::Url;

/// Returns true if the URL's host equals `domain` exactly
///
/// Subdomains do not match: `blog.example.com` is not `example.com`, and
/// `www.example.com` is not `example.com`.
pub fn is_same_domain(url: &Url, domain: &str) -> bool {
    url.host_str()
        .is_some_and(|host| host.eq_ignore_ascii_case(domain))
}

/// Builds the robots.txt URL for the origin of `url`
///
/// The scheme, host and port are kept; path, query and fragment are replaced.
pub fn robots_url(url: &Url) -> Option<Url> {
    url.host_str()?;
    url.join("/robots.txt").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_domain_exact() {
        let url = Url::parse("https://x.test/b").unwrap();
        assert!(is_same_domain(&url, "x.test"));
        assert!(is_same_domain(&url, "X.TEST"));
    }

    #[test]
    fn test_same_domain_rejects_subdomain_and_other() {
        let sub = Url::parse("https://www.x.test/").unwrap();
        let other = Url::parse("https://other.test/c").unwrap();
        assert!(!is_same_domain(&sub, "x.test"));
        assert!(!is_same_domain(&other, "x.test"));
    }

    #[test]
    fn test_same_domain_ignores_port() {
        let url = Url::parse("http://127.0.0.1:4040/page").unwrap();
        assert!(is_same_domain(&url, "127.0.0.1"));
    }

    #[test]
    fn test_robots_url_keeps_origin() {
        let url = Url::parse("http://127.0.0.1:4040/deep/page?x=1#y").unwrap();
        assert_eq!(
            robots_url(&url).unwrap().as_str(),
            "http://127.0.0.1:4040/robots.txt"
        );
    }

    #[test]
    fn test_robots_url_https() {
        let url = Url::parse("https://www.example.com/home").unwrap();
        assert_eq!(
            robots_url(&url).unwrap().as_str(),
            "https://www.example.com/robots.txt"
        );
    }
}
