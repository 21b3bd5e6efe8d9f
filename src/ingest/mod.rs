//! Post acquisition
//!
//! This module turns a source profile into a batch of normalized posts:
//! - Feed subscription (RSS, Atom, JSON Feed)
//! - Sitemap traversal with per-page metadata scraping
//! - Robots-based sitemap discovery
//! - Parser selection by declared parser type

mod dispatcher;
mod feed;
mod fetcher;
mod scrape;
mod sitemap;
mod types;

pub use dispatcher::{ParserRegistry, PostParser};
pub use feed::{parse_feed_document, FeedParser};
pub use fetcher::{build_http_client, Fetcher};
pub use scrape::scrape_post;
pub use sitemap::{parse_sitemap_document, SitemapCrawler, SitemapDiscovery, SitemapDocument};
pub use types::{ParsedPost, ParserType, SourceProfile};
