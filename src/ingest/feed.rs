//! Feed subscription parser
//!
//! Accepts every format `feed-rs` understands (RSS 0.9x/1.0/2.0, Atom, JSON
//! Feed) and maps entries into normalized posts.

use crate::ingest::{Fetcher, ParsedPost, ParserType, PostParser, SourceProfile};
use crate::timestamp::{now_local, to_local};
use crate::url::{non_blank, resolve_absolute_url};
use crate::{Result, TideError};
use async_trait::async_trait;
use feed_rs::model::Entry;
use scraper::{Html, Selector};

/// Image attributes tried in order; lazy-load attributes beat `src`
const IMAGE_ATTRIBUTES: &[&str] = &["data-src", "data-original", "data-lazy-src", "src"];

/// Feed-driven parser
#[derive(Debug, Clone)]
pub struct FeedParser {
    fetcher: Fetcher,
}

impl FeedParser {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl PostParser for FeedParser {
    fn parser_type(&self) -> ParserType {
        ParserType::Feed
    }

    /// Fetches the source's feed and converts its entries
    ///
    /// A source without a feed URL yields no posts. Fetch and parse failures
    /// are returned to the caller.
    async fn fetch(&self, profile: &SourceProfile) -> Result<Vec<ParsedPost>> {
        let Some(feed_url) = non_blank(profile.feed_url.as_deref()) else {
            tracing::warn!("Feed source {} has no feed URL", profile.source_name);
            return Ok(Vec::new());
        };

        let body = self.fetcher.fetch_text(feed_url).await?;
        parse_feed_document(&body, feed_url, &profile.base_url)
    }
}

/// Parses a feed document into posts
///
/// Entries without a usable link are dropped.
///
/// # Arguments
///
/// * `body` - The raw feed document
/// * `feed_url` - Where the document came from, for error reporting
/// * `base_url` - The source's home page, a base for relative thumbnails
///
/// # Returns
///
/// * `Ok(Vec<ParsedPost>)` - One post per linked entry, in feed order
/// * `Err(TideError::FeedParse)` - The document is not a recognizable feed
pub fn parse_feed_document(body: &str, feed_url: &str, base_url: &str) -> Result<Vec<ParsedPost>> {
    let feed = feed_rs::parser::parse(body.as_bytes()).map_err(|source| TideError::FeedParse {
        url: feed_url.to_string(),
        source,
    })?;

    Ok(feed
        .entries
        .iter()
        .filter_map(|entry| to_parsed_post(entry, base_url))
        .collect())
}

fn to_parsed_post(entry: &Entry, base_url: &str) -> Option<ParsedPost> {
    let canonical_url = entry_link(entry)?.to_string();

    let summary = entry.summary.as_ref().map(|text| text.content.clone());
    let published_at = entry
        .published
        .or(entry.updated)
        .map(to_local)
        .unwrap_or_else(now_local);

    Some(ParsedPost {
        title: entry
            .title
            .as_ref()
            .map(|text| text.content.clone())
            .unwrap_or_default(),
        thumbnail_url: thumbnail(entry, summary.as_deref(), &canonical_url, base_url),
        canonical_url,
        summary,
        author: entry.authors.first().map(|person| person.name.clone()),
        published_at: Some(published_at),
        tags: entry
            .categories
            .iter()
            .filter_map(|category| non_blank(Some(category.term.as_str())))
            .map(str::to_string)
            .collect(),
    })
}

/// The entry's post link
///
/// Atom entries often list `self`, `edit`, `replies` or enclosure links ahead
/// of the post itself, so the first `alternate` (or rel-less) link wins and
/// any other non-blank link is only a fallback.
fn entry_link(entry: &Entry) -> Option<&str> {
    let links = || {
        entry
            .links
            .iter()
            .filter_map(|link| non_blank(Some(link.href.as_str())).map(|href| (link, href)))
    };

    links()
        .find(|(link, _)| {
            non_blank(link.rel.as_deref()).map_or(true, |rel| rel.eq_ignore_ascii_case("alternate"))
        })
        .or_else(|| links().next())
        .map(|(_, href)| href)
}

/// First thumbnail candidate that resolves to an absolute URL
///
/// Candidates: image enclosures, then the first image in the summary HTML,
/// then the first image in the content body, then media thumbnails.
fn thumbnail(
    entry: &Entry,
    summary: Option<&str>,
    canonical_url: &str,
    base_url: &str,
) -> Option<String> {
    let resolve = |raw: &str| resolve_absolute_url(Some(raw), &[Some(canonical_url), Some(base_url)]);

    enclosure_images(entry)
        .find_map(|url| resolve(&url))
        .or_else(|| summary.and_then(|html| image_from_html(html, &resolve)))
        .or_else(|| {
            entry
                .content
                .as_ref()
                .and_then(|content| content.body.as_deref())
                .and_then(|html| image_from_html(html, &resolve))
        })
        .or_else(|| {
            entry
                .media
                .iter()
                .flat_map(|media| &media.thumbnails)
                .find_map(|thumbnail| resolve(&thumbnail.image.uri))
        })
}

/// Enclosure URLs whose media type is absent or `image/*`, in feed order
fn enclosure_images(entry: &Entry) -> impl Iterator<Item = String> + '_ {
    let media_contents = entry
        .media
        .iter()
        .flat_map(|media| &media.content)
        .filter(|content| {
            is_image_type(content.content_type.as_ref().map(|mime| mime.to_string()).as_deref())
        })
        .filter_map(|content| content.url.as_ref().map(|url| url.to_string()));

    let enclosure_links = entry
        .links
        .iter()
        .filter(|link| {
            link.rel
                .as_deref()
                .map_or(false, |rel| rel.eq_ignore_ascii_case("enclosure"))
        })
        .filter(|link| is_image_type(link.media_type.as_deref()))
        .map(|link| link.href.clone());

    media_contents
        .chain(enclosure_links)
        .filter_map(|url| non_blank(Some(url.as_str())).map(str::to_string))
}

fn is_image_type(media_type: Option<&str>) -> bool {
    match non_blank(media_type) {
        None => true,
        Some(media_type) => media_type.to_ascii_lowercase().starts_with("image/"),
    }
}

/// First `<img>` in an HTML fragment with a usable source
fn image_from_html(html: &str, resolve: &dyn Fn(&str) -> Option<String>) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }

    let fragment = Html::parse_fragment(html);
    let selector = Selector::parse("img").ok()?;
    fragment
        .select(&selector)
        .filter_map(|image| {
            IMAGE_ATTRIBUTES
                .iter()
                .filter_map(|name| image.value().attr(name))
                .find_map(image_candidate)
        })
        .find_map(|candidate| resolve(candidate))
}

/// Rejects blank, `data:` and `javascript:` sources
fn image_candidate(value: &str) -> Option<&str> {
    let value = value.trim();
    let lower = value.to_ascii_lowercase();
    if value.is_empty() || lower.starts_with("data:") || lower.starts_with("javascript:") {
        return None;
    }
    Some(value)
}
