//! Feed-Tide: a tech blog post ingestion pipeline
//!
//! This crate collects posts published on external technical blogs, either by
//! subscribing to their feeds or by crawling their sitemaps, and merges them
//! into one store deduplicated by canonical URL.

pub mod config;
pub mod ingest;
pub mod merge;
pub mod storage;
pub mod sync;
pub mod timestamp;
pub mod url;

use thiserror::Error;

/// Main error type for Feed-Tide operations
#[derive(Debug, Error)]
pub enum TideError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to parse feed {url}: {source}")]
    FeedParse {
        url: String,
        source: feed_rs::parser::ParseFeedError,
    },

    #[error("XML parse error for {url}: {message}")]
    XmlParse { url: String, message: String },

    #[error("No parser registered for parser type {0}")]
    NoParser(ingest::ParserType),

    #[error("More than one parser registered for parser type {0}")]
    DuplicateParser(ingest::ParserType),

    #[error("Source {0} has neither a sitemap location nor a base URL")]
    MissingLocation(String),

    #[error("Source not found: {0}")]
    SourceNotFound(i64),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl TideError {
    /// Returns true for setup defects that retrying cannot fix
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::NoParser(_) | Self::DuplicateParser(_) | Self::MissingLocation(_)
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for Feed-Tide operations
pub type Result<T> = std::result::Result<T, TideError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use ingest::{ParsedPost, ParserType, SourceProfile};
pub use sync::{BatchReport, SyncOrchestrator, SyncResult};
pub use url::resolve_absolute_url;
