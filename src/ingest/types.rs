use crate::storage::SourceRecord;
use chrono::NaiveDateTime;
use indexmap::IndexSet;
use serde::Deserialize;
use std::fmt;

/// How a source's posts are acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserType {
    /// Structured feed subscription
    #[serde(alias = "rss", alias = "FEED", alias = "RSS")]
    Feed,

    /// Sitemap crawl plus page scraping
    #[serde(alias = "SITEMAP")]
    Sitemap,
}

impl ParserType {
    /// Converts the parser type to the string stored in `sources.parser_type`
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Feed => "feed",
            Self::Sitemap => "sitemap",
        }
    }

    /// Parses a stored parser type
    ///
    /// The legacy `rss` value reads as [`ParserType::Feed`]. Returns None if
    /// the string doesn't match any known type.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "feed" | "rss" => Some(Self::Feed),
            "sitemap" => Some(Self::Sitemap),
            _ => None,
        }
    }
}

impl fmt::Display for ParserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// Per-call view of a source handed to a parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceProfile {
    pub source_id: i64,
    pub source_name: String,
    pub base_url: String,
    pub feed_url: Option<String>,

    /// Explicit sitemap location, set for backfill runs
    pub sitemap_url: Option<String>,
    pub parser_type: ParserType,
}

impl SourceProfile {
    /// Builds the profile used by a regular sync of the source
    pub fn from_source(source: &SourceRecord) -> Self {
        Self {
            source_id: source.id,
            source_name: source.name.clone(),
            base_url: source.base_url.clone(),
            feed_url: source.feed_url.clone(),
            sitemap_url: None,
            parser_type: source.parser_type,
        }
    }

    /// Builds a sitemap-crawl profile pinned to one sitemap location
    pub fn for_backfill(source: &SourceRecord, sitemap_url: String) -> Self {
        Self {
            sitemap_url: Some(sitemap_url),
            parser_type: ParserType::Sitemap,
            ..Self::from_source(source)
        }
    }
}

/// A post extracted by a parser, not yet merged into the store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedPost {
    pub title: String,
    pub canonical_url: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub thumbnail_url: Option<String>,
    pub published_at: Option<NaiveDateTime>,

    /// Tag names in first-seen order
    pub tags: IndexSet<String>,
}
