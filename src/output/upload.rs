//! Object store upload
//!
//! When the crawl is not run locally, the finished sitemap file is sent to an
//! S3-compatible endpoint with a single path-style PUT:
//! `{endpoint}/{bucket}/{key}`. With credentials the request carries an AWS
//! Signature Version 4 `Authorization` header; without them it is sent
//! unsigned, which only endpoints with public write access accept.
//!
//! Upload failures never abort the program: they are logged and reported to
//! the caller as `false`.

use crate::config::RemoteConfig;
use crate::output::signing::{sign_put, AwsCredentials};
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::path::Path;
use url::Url;

const SITEMAP_CONTENT_TYPE: &str = "application/xml";

/// Uploads files to a bucket/key on an object store
#[derive(Debug, Clone)]
pub struct ObjectStoreUploader {
    client: Client,
    endpoint: String,
    bucket: String,
    key: String,
    region: String,
    credentials: Option<AwsCredentials>,
}

impl ObjectStoreUploader {
    /// Creates an uploader for the `[remote]` destination using `client`
    pub fn new(client: Client, remote: &RemoteConfig) -> Self {
        Self {
            client,
            endpoint: remote.endpoint.clone(),
            bucket: remote.bucket.clone(),
            key: remote.key.clone(),
            region: remote.region.clone(),
            credentials: None,
        }
    }

    /// Signs every upload with `credentials`
    pub fn with_credentials(mut self, credentials: AwsCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn is_signed(&self) -> bool {
        self.credentials.is_some()
    }

    /// Path-style object URL; a leading `/` on the key is ignored
    pub fn destination_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{}/{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.bucket.trim_matches('/'),
            self.key.trim_start_matches('/')
        ))
    }

    /// Uploads `file` to the configured bucket/key
    ///
    /// # Returns
    ///
    /// * `true` - The object store answered with a 2xx status
    /// * `false` - The file could not be read, or the request failed
    pub async fn upload(&self, file: &Path) -> bool {
        let destination = match self.destination_url() {
            Ok(url) => url,
            Err(e) => {
                tracing::error!("Invalid upload destination: {}", e);
                return false;
            }
        };

        let body = match tokio::fs::read(file).await {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("Cannot read {} for upload: {}", file.display(), e);
                return false;
            }
        };

        tracing::info!("Uploading {} ({} bytes) to {}", file.display(), body.len(), destination);

        let mut request = self
            .client
            .put(destination.clone())
            .header(CONTENT_TYPE, SITEMAP_CONTENT_TYPE);

        if let Some(credentials) = &self.credentials {
            let now = Utc::now();
            let signed = match sign_put(credentials, &self.region, &destination, &body, now) {
                Ok(signed) => signed,
                Err(e) => {
                    tracing::error!("Cannot sign upload to {}: {}", destination, e);
                    return false;
                }
            };
            request = request
                .header(AUTHORIZATION, signed.authorization)
                .header("x-amz-date", signed.amz_date)
                .header("x-amz-content-sha256", signed.content_sha256);
            if let Some(token) = signed.security_token {
                request = request.header("x-amz-security-token", token);
            }
        }

        let response = request.body(body).send().await;

        match response {
            Ok(response) if response.status().is_success() => {
                tracing::info!("Uploaded sitemap to {}/{}", self.bucket, self.key);
                true
            }
            Ok(response) => {
                tracing::error!("Upload to {} rejected with HTTP {}", destination, response.status());
                false
            }
            Err(e) => {
                tracing::error!("Upload to {} failed: {}", destination, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uploader(endpoint: &str, bucket: &str, key: &str) -> ObjectStoreUploader {
        let remote = RemoteConfig {
            endpoint: endpoint.to_string(),
            bucket: bucket.to_string(),
            key: key.to_string(),
            region: "us-east-1".to_string(),
        };
        ObjectStoreUploader::new(Client::new(), &remote)
    }

    #[test]
    fn test_destination_url_strips_slashes() {
        let up = uploader("https://s3.amazonaws.com/", "my-bucket", "/path/to/sitemap.xml");
        assert_eq!(
            up.destination_url().unwrap().as_str(),
            "https://s3.amazonaws.com/my-bucket/path/to/sitemap.xml"
        );
    }

    #[test]
    fn test_destination_url_plain_key() {
        let up = uploader("http://127.0.0.1:9000", "b", "sitemap.xml");
        assert_eq!(
            up.destination_url().unwrap().as_str(),
            "http://127.0.0.1:9000/b/sitemap.xml"
        );
    }

    #[test]
    fn test_unsigned_until_credentials_given() {
        let up = uploader("http://127.0.0.1:9000", "b", "k");
        assert!(!up.is_signed());
        assert!(up.with_credentials(AwsCredentials::new("id", "secret")).is_signed());
    }

    #[tokio::test]
    async fn test_missing_file_reports_failure() {
        let up = uploader("http://127.0.0.1:9", "b", "k");
        assert!(!up.upload(Path::new("/nonexistent/sitemap.xml")).await);
    }
}
