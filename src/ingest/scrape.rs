//! Post page metadata extraction
//!
//! Each field is taken from the first non-blank candidate in a fixed priority
//! list of meta tags and document elements.

use crate::ingest::ParsedPost;
use crate::timestamp::{now_local, parse_date_time};
use crate::url::resolve_absolute_url;
use chrono::NaiveDateTime;
use indexmap::IndexSet;
use scraper::{ElementRef, Html, Selector};

const NBSP: char = '\u{a0}';

/// Extracts a post from a fetched HTML page
///
/// # Field Sources
///
/// | Field | Candidates, in priority order |
/// |-------|-------------------------------|
/// | title | `og:title`, `twitter:title`, `<title>`, `article h1`, `main h1`, `h1` |
/// | canonical URL | `link[rel=canonical]`, `og:url`, the fetched URL |
/// | summary | `description`, `og:description`, `article p`, `main p` |
/// | author | `author`, `article:author`, `twitter:creator` |
/// | thumbnail | `og:image`, `twitter:image`, `article img`, `main img` |
/// | published | `article:published_time`, `publish_date`, `pubdate`, `time[datetime]` |
/// | tags | `article:tag`, `keywords`, split on `,` and `\|` |
///
/// # Arguments
///
/// * `html` - The page body
/// * `fetched_url` - The URL the page was fetched from
/// * `base_url` - The source's home page, the last-resort base for relative URLs
///
/// # Returns
///
/// * `Some(ParsedPost)` - The extracted post
/// * `None` - The page has no usable title
pub fn scrape_post(html: &str, fetched_url: &str, base_url: &str) -> Option<ParsedPost> {
    let document = Html::parse_document(html);

    let title = first_non_blank([
        meta_content(&document, r#"meta[property="og:title"]"#),
        meta_content(&document, r#"meta[name="twitter:title"]"#),
        text(&document, "title"),
        text(&document, "article h1"),
        text(&document, "main h1"),
        text(&document, "h1"),
    ])?;

    let declared_canonical = first_non_blank([
        attr(&document, r#"link[rel="canonical"]"#, "href"),
        meta_content(&document, r#"meta[property="og:url"]"#),
        Some(fetched_url.to_string()),
    ]);
    let canonical_url = resolve_absolute_url(
        declared_canonical.as_deref(),
        &[Some(fetched_url), Some(base_url)],
    )
    .unwrap_or_else(|| fetched_url.trim().to_string());

    let summary = first_non_blank([
        meta_content(&document, r#"meta[name="description"]"#),
        meta_content(&document, r#"meta[property="og:description"]"#),
        text(&document, "article p"),
        text(&document, "main p"),
    ]);

    let author = first_non_blank([
        meta_content(&document, r#"meta[name="author"]"#),
        meta_content(&document, r#"meta[property="article:author"]"#),
        meta_content(&document, r#"meta[name="twitter:creator"]"#),
    ]);

    let thumbnail = first_non_blank([
        meta_content(&document, r#"meta[property="og:image"]"#),
        meta_content(&document, r#"meta[name="twitter:image"]"#),
        attr(&document, "article img[src]", "src"),
        attr(&document, "main img[src]", "src"),
    ]);
    let thumbnail_url = resolve_absolute_url(
        thumbnail.as_deref(),
        &[Some(&canonical_url), Some(fetched_url), Some(base_url)],
    );

    Some(ParsedPost {
        title,
        canonical_url,
        summary,
        author,
        thumbnail_url,
        published_at: Some(published_at(&document).unwrap_or_else(now_local)),
        tags: tags(&document),
    })
}

/// First parseable publication date among the date candidates
fn published_at(document: &Html) -> Option<NaiveDateTime> {
    [
        meta_content(document, r#"meta[property="article:published_time"]"#),
        meta_content(document, r#"meta[name="article:published_time"]"#),
        meta_content(document, r#"meta[name="publish_date"]"#),
        meta_content(document, r#"meta[name="pubdate"]"#),
        attr(document, "time[datetime]", "datetime"),
    ]
    .into_iter()
    .flatten()
    .find_map(|raw| parse_date_time(&raw))
}

fn tags(document: &Html) -> IndexSet<String> {
    let Ok(selector) = Selector::parse(
        r#"meta[property="article:tag"], meta[name="article:tag"], meta[name="keywords"]"#,
    ) else {
        return IndexSet::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("content"))
        .flat_map(|content| content.split([',', '|']))
        .filter_map(normalize_text)
        .collect()
}

/// Collapses non-breaking spaces and trims; blank values become `None`
pub(crate) fn normalize_text(value: &str) -> Option<String> {
    let normalized = value.replace(NBSP, " ");
    let trimmed = normalized.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn first_non_blank<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find_map(|value| normalize_text(&value))
}

fn meta_content(document: &Html, selector: &str) -> Option<String> {
    attr(document, selector, "content")
}

/// First non-blank value of an attribute across matching elements
fn attr(document: &Html, selector: &str, name: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(name))
        .find_map(normalize_text)
}

/// First non-blank whitespace-collapsed text across matching elements
fn text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .map(element_text)
        .find_map(|value| normalize_text(&value))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
