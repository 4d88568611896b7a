//! Output module for the finished crawl
//!
//! This module handles:
//! - Accumulating accepted pages and serializing them as sitemap XML
//! - Writing the sitemap file and optionally uploading it (SigV4-signed)
//! - Recording crawl statistics

pub mod signing;
mod sitemap;
pub mod stats;
pub mod upload;

pub use sitemap::{
    PageRecord, SitemapAccumulator, SitemapDocument, CHANGE_FREQUENCY, PRIORITY,
    SITEMAP_NAMESPACE,
};
pub use signing::AwsCredentials;
pub use stats::{print_statistics, CrawlStatistics};
pub use upload::ObjectStoreUploader;

use thiserror::Error;

/// Errors raised while producing the sitemap file
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to serialize sitemap XML: {0}")]
    Xml(String),

    #[error("Failed to write sitemap: {0}")]
    Io(#[from] std::io::Error),
}
