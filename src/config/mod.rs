//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use site_sitemap::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitemap.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FilterConfig, OutputConfig, RemoteConfig, SiteConfig, UndatedPolicy,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, parse_config_file,
    parse_config_str,
};
pub use validation::validate;
