use crate::ingest::ParserType;
use serde::Deserialize;

/// Main configuration structure for Feed-Tide
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    pub storage: StorageConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

/// Batch sync cadence
#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Delay between the end of one batch and the start of the next (milliseconds)
    #[serde(rename = "fixed-delay-ms", default = "default_fixed_delay_ms")]
    pub fixed_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fixed_delay_ms: default_fixed_delay_ms(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Value of the Accept-Language header sent with every request
    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,
}

/// Network limits and sitemap traversal caps
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Connect timeout per request (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Read timeout per request (seconds)
    #[serde(rename = "read-timeout-secs", default = "default_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Maximum number of sitemap documents visited in one crawl
    #[serde(rename = "max-sitemap-files", default = "default_max_sitemap_files")]
    pub max_sitemap_files: usize,

    /// Maximum number of post URLs collected in one crawl
    #[serde(rename = "max-post-urls", default = "default_max_post_urls")]
    pub max_post_urls: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_timeout_secs(),
            read_timeout_secs: default_timeout_secs(),
            max_sitemap_files: default_max_sitemap_files(),
            max_post_urls: default_max_post_urls(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A blog declared in the configuration file
///
/// Entries are matched to stored sources by name.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Unique display name
    pub name: String,

    /// Home page of the blog
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Feed URL, or sitemap URL for sitemap sources
    #[serde(rename = "feed-url", default)]
    pub feed_url: Option<String>,

    /// How posts are acquired
    #[serde(rename = "parser-type")]
    pub parser_type: ParserType,

    /// Minimum minutes between two syncs; absent or <= 0 means every batch
    #[serde(rename = "interval-min", default)]
    pub interval_min: Option<i64>,

    /// Inactive sources are never picked up by batch sync
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_fixed_delay_ms() -> u64 {
    600_000
}

fn default_accept_language() -> String {
    "ko".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_max_sitemap_files() -> usize {
    300
}

fn default_max_post_urls() -> usize {
    20_000
}

fn default_active() -> bool {
    true
}
