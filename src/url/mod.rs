//! URL handling module
//!
//! This module provides URL normalization and the single-domain admission rule
//! used by the link extractor and the crawl engine.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{is_same_domain, robots_url};
pub use normalize::{normalize_url, resolve_and_normalize};
