//! URL handling module for Feed-Tide
//!
//! This module absolutizes the relative, protocol-relative and absolute URLs
//! found in feeds, sitemaps and scraped pages, and derives the well-known
//! locations (`/sitemap.xml`, `/robots.txt`) of a blog.

mod resolve;

pub use resolve::{resolve_absolute_url, resolve_against};

use crate::{UrlError, UrlResult};
use url::Url;

/// Parses a URL and requires it to be absolute `http` or `https`
///
/// # Arguments
///
/// * `raw` - The URL string to parse
///
/// # Returns
///
/// * `Ok(Url)` - The parsed URL
/// * `Err(UrlError)` - The URL is malformed or uses another scheme
pub fn parse_http_url(raw: &str) -> UrlResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            other
        ))),
    }
}

/// Returns true if the value is an absolute `http`/`https` URL
pub fn is_http_absolute(raw: &str) -> bool {
    parse_http_url(raw).is_ok()
}

/// Default sitemap location of a blog: `{base}/sitemap.xml`
///
/// Trailing slashes of the base URL are stripped first.
///
/// # Examples
///
/// ```
/// use feed_tide::url::sitemap_default;
///
/// assert_eq!(sitemap_default("https://blog.example.com//"), "https://blog.example.com/sitemap.xml");
/// ```
pub fn sitemap_default(base_url: &str) -> String {
    format!("{}/sitemap.xml", strip_trailing_slashes(base_url))
}

/// Location of a blog's robots file: `{base}/robots.txt`
pub fn robots_location(base_url: &str) -> String {
    format!("{}/robots.txt", strip_trailing_slashes(base_url))
}

fn strip_trailing_slashes(base_url: &str) -> &str {
    base_url.trim().trim_end_matches('/')
}

/// Trims a value and maps blank strings to `None`
///
/// Blank values never count as "present" anywhere in the pipeline.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
