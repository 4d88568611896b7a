//! AWS Signature Version 4 for object store uploads
//!
//! Only what a single-object `PUT` needs is implemented: no query string, and
//! the signed headers are `host`, `x-amz-content-sha256`, `x-amz-date` and,
//! for temporary credentials, `x-amz-security-token`.

use chrono::{DateTime, Utc};
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

const SERVICE: &str = "s3";

/// Access key pair used to sign requests
#[derive(Clone, PartialEq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl AwsCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the optional
    /// `AWS_SESSION_TOKEN`
    ///
    /// Returns `None` unless both keys are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        let credentials = Self::new(var("AWS_ACCESS_KEY_ID")?, var("AWS_SECRET_ACCESS_KEY")?);
        Some(match var("AWS_SESSION_TOKEN") {
            Some(token) => credentials.with_session_token(token),
            None => credentials,
        })
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Header values to attach to a signed request
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub authorization: String,
    pub amz_date: String,
    pub content_sha256: String,
    pub security_token: Option<String>,
}

/// Hex SHA-256 of the request body
pub fn payload_hash(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// Signs a `PUT` of `payload` to `url`
pub fn sign_put(
    credentials: &AwsCredentials,
    region: &str,
    url: &Url,
    payload: &[u8],
    now: DateTime<Utc>,
) -> Result<SignedRequest, InvalidLength> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let content_sha256 = payload_hash(payload);

    let mut headers = vec![
        ("host", canonical_host(url)),
        ("x-amz-content-sha256", content_sha256.clone()),
        ("x-amz-date", amz_date.clone()),
    ];
    if let Some(token) = &credentials.session_token {
        headers.push(("x-amz-security-token", token.clone()));
    }

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "PUT\n{}\n\n{}\n{}\n{}",
        canonical_uri(url.path()),
        canonical_headers,
        signed_headers,
        content_sha256
    );

    let scope = format!("{}/{}/{}/aws4_request", date, region, SERVICE);
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        payload_hash(canonical_request.as_bytes())
    );

    let key = derive_signing_key(&credentials.secret_access_key, &date, region, SERVICE)?;
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

    Ok(SignedRequest {
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
        ),
        amz_date,
        content_sha256,
        security_token: credentials.session_token.clone(),
    })
}

/// `kSigning` for the given date (`YYYYMMDD`), region and service
pub fn derive_signing_key(
    secret_access_key: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, InvalidLength> {
    let k_date = hmac_sha256(format!("AWS4{}", secret_access_key).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(key)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Host header value as reqwest sends it: the port only when non-default
fn canonical_host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Re-encodes a URL path the way SigV4 expects
///
/// Unreserved characters, `/` and existing `%XX` escapes are kept; every other
/// byte is percent-encoded.
fn canonical_uri(path: &str) -> String {
    let bytes = path.as_bytes();
    let mut out = String::with_capacity(path.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let escaped = b == b'%'
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit();
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~' | b'/') {
            out.push(b as char);
        } else if escaped {
            out.push('%');
            out.push(bytes[i + 1].to_ascii_uppercase() as char);
            out.push(bytes[i + 2].to_ascii_uppercase() as char);
            i += 2;
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
        i += 1;
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn credentials() -> AwsCredentials {
        AwsCredentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_signing_key_matches_published_vector() {
        let key = derive_signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        )
        .unwrap();
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_empty_payload_hash() {
        assert_eq!(
            payload_hash(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_authorization_layout() {
        let url = Url::parse("https://s3.amazonaws.com/bucket/sitemap.xml").unwrap();
        let signed = sign_put(&credentials(), "eu-west-1", &url, b"<urlset/>", now()).unwrap();

        assert_eq!(signed.amz_date, "20240309T140507Z");
        assert_eq!(signed.content_sha256, payload_hash(b"<urlset/>"));
        assert!(signed.authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240309/eu-west-1/s3/aws4_request, \
             SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature="
        ));
        let signature = signed.authorization.rsplit('=').next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(signed.security_token.is_none());
    }

    #[test]
    fn test_signature_covers_payload_and_session_token() {
        let url = Url::parse("http://127.0.0.1:9000/b/k.xml").unwrap();
        let a = sign_put(&credentials(), "us-east-1", &url, b"one", now()).unwrap();
        let b = sign_put(&credentials(), "us-east-1", &url, b"two", now()).unwrap();
        assert_ne!(a.authorization, b.authorization);

        let temporary = credentials().with_session_token("token");
        let c = sign_put(&temporary, "us-east-1", &url, b"one", now()).unwrap();
        assert!(c
            .authorization
            .contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date;x-amz-security-token,"));
        assert_eq!(c.security_token.as_deref(), Some("token"));
    }

    #[test]
    fn test_canonical_host_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:9000/b/k").unwrap();
        assert_eq!(canonical_host(&url), "127.0.0.1:9000");
        let url = Url::parse("https://s3.amazonaws.com/b/k").unwrap();
        assert_eq!(canonical_host(&url), "s3.amazonaws.com");
    }

    #[test]
    fn test_canonical_uri_encoding() {
        assert_eq!(canonical_uri("/b/site/sitemap.xml"), "/b/site/sitemap.xml");
        assert_eq!(canonical_uri("/b/a%20b"), "/b/a%20b");
        assert_eq!(canonical_uri("/b/a%2fb"), "/b/a%2Fb");
        assert_eq!(canonical_uri("/b/x$y"), "/b/x%24y");
        assert_eq!(canonical_uri(""), "/");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let shown = format!("{:?}", credentials().with_session_token("SESSIONSECRET"));
        assert!(shown.contains("AKIDEXAMPLE"));
        assert!(!shown.contains("EXAMPLEKEY"));
        assert!(!shown.contains("SESSIONSECRET"));
    }
}
