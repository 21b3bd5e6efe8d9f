//! Sitemap crawling
//!
//! Post URLs are discovered by walking sitemap documents breadth-first from
//! one entry URL. Sitemap indexes fan out into child sitemaps; urlsets
//! contribute post URLs. Every collected page is then fetched and scraped.
//!
//! The walk is bounded twice: by the number of sitemap documents visited and
//! by the number of post URLs collected. A document or page that cannot be
//! fetched or parsed is logged and skipped.

use crate::config::FetchConfig;
use crate::ingest::scrape::{normalize_text, scrape_post};
use crate::ingest::{Fetcher, ParsedPost, ParserType, PostParser, SourceProfile};
use crate::url::{non_blank, resolve_against, robots_location, sitemap_default};
use crate::{Result, TideError};
use async_trait::async_trait;
use indexmap::IndexSet;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::collections::{HashSet, VecDeque};

/// Locates a site's sitemap from its robots file
#[async_trait]
pub trait SitemapDiscovery: Send + Sync {
    /// Returns the first sitemap declared by the site, if any
    async fn discover_sitemap(&self, base_url: &str) -> Option<String>;
}

/// `<loc>` values of one sitemap document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Locations under `<sitemap>` containers (sitemap index entries)
    pub sitemaps: IndexSet<String>,

    /// Locations under `<url>` containers (post pages)
    pub urls: IndexSet<String>,
}

/// Extracts the `<loc>` children of `<sitemap>` and `<url>` containers
///
/// Tag names are matched by local name, case-insensitively, so prefixed
/// elements (`<s:url>`) count too. A `<loc>` only counts when it is a direct
/// child of a container.
///
/// # Returns
///
/// * `Ok(SitemapDocument)` - The deduplicated locations in document order
/// * `Err(String)` - The document is not well-formed XML
pub fn parse_sitemap_document(xml: &str) -> std::result::Result<SitemapDocument, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut document = SitemapDocument::default();
    let mut open_elements: Vec<String> = Vec::new();
    let mut loc_text: Option<String> = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(element) => {
                let name =
                    String::from_utf8_lossy(element.local_name().as_ref()).to_ascii_lowercase();
                let in_container = matches!(
                    open_elements.last().map(String::as_str),
                    Some("sitemap" | "url")
                );
                if name == "loc" && in_container {
                    loc_text = Some(String::new());
                }
                open_elements.push(name);
            }
            Event::End(_) => {
                let Some(name) = open_elements.pop() else {
                    continue;
                };
                if name != "loc" {
                    continue;
                }
                let Some(text) = loc_text.take() else {
                    continue;
                };
                let Some(value) = normalize_text(&text) else {
                    continue;
                };
                match open_elements.last().map(String::as_str) {
                    Some("sitemap") => {
                        document.sitemaps.insert(value);
                    }
                    Some("url") => {
                        document.urls.insert(value);
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                if let Some(buffer) = loc_text.as_mut() {
                    // A bare `&` in a URL is common; keep the raw text for that node
                    let value = text
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&text).into_owned());
                    buffer.push_str(&value);
                }
            }
            Event::CData(data) => {
                if let Some(buffer) = loc_text.as_mut() {
                    buffer.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(document)
}

/// Sitemap-driven parser
#[derive(Debug, Clone)]
pub struct SitemapCrawler {
    fetcher: Fetcher,
    max_sitemap_files: usize,
    max_post_urls: usize,
}

impl SitemapCrawler {
    /// Creates a crawler with the traversal caps of `limits`
    pub fn new(fetcher: Fetcher, limits: &FetchConfig) -> Self {
        Self {
            fetcher,
            max_sitemap_files: limits.max_sitemap_files,
            max_post_urls: limits.max_post_urls,
        }
    }

    /// Picks the sitemap the crawl starts from
    ///
    /// The explicit sitemap location wins, then the feed URL, then
    /// `{base_url}/sitemap.xml`.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The entry sitemap URL
    /// * `Err(TideError::MissingLocation)` - No location and no base URL
    pub fn resolve_entry_url(profile: &SourceProfile) -> Result<String> {
        if let Some(url) = non_blank(profile.sitemap_url.as_deref())
            .or_else(|| non_blank(profile.feed_url.as_deref()))
        {
            return Ok(url.to_string());
        }

        match non_blank(Some(profile.base_url.as_str())) {
            Some(base_url) => Ok(sitemap_default(base_url)),
            None => Err(TideError::MissingLocation(profile.source_name.clone())),
        }
    }

    /// Walks the sitemap tree breadth-first and collects post URLs
    ///
    /// # Traversal Rules
    ///
    /// - A sitemap URL is fetched at most once
    /// - The walk stops once more than `max_sitemap_files` documents were visited
    /// - A document with `<sitemap>` entries only fans out; its `<url>` entries are ignored
    /// - Collection stops as soon as `max_post_urls` URLs are held
    ///
    /// # Returns
    ///
    /// The post URLs in discovery order
    pub async fn collect_post_urls(&self, root_sitemap_url: &str) -> IndexSet<String> {
        let mut pending = VecDeque::from([root_sitemap_url.to_string()]);
        let mut visited: HashSet<String> = HashSet::new();
        let mut post_urls = IndexSet::new();

        while let Some(sitemap_url) = pending.pop_front() {
            if !visited.insert(sitemap_url.clone()) {
                continue;
            }

            if visited.len() > self.max_sitemap_files {
                tracing::warn!("Too many sitemap files under {}", root_sitemap_url);
                break;
            }

            let document = match self.fetch_sitemap(&sitemap_url).await {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!("Failed to read sitemap {}: {}", sitemap_url, e);
                    continue;
                }
            };

            if !document.sitemaps.is_empty() {
                pending.extend(
                    document
                        .sitemaps
                        .iter()
                        .map(|loc| resolve_against(&sitemap_url, loc)),
                );
                continue;
            }

            for loc in &document.urls {
                if post_urls.len() >= self.max_post_urls {
                    tracing::warn!("Too many post URLs under {}", root_sitemap_url);
                    return post_urls;
                }
                post_urls.insert(resolve_against(&sitemap_url, loc));
            }
        }

        post_urls
    }

    async fn fetch_sitemap(&self, sitemap_url: &str) -> Result<SitemapDocument> {
        let body = self.fetcher.fetch_text(sitemap_url).await?;
        parse_sitemap_document(&body).map_err(|message| TideError::XmlParse {
            url: sitemap_url.to_string(),
            message,
        })
    }

    /// Fetches and scrapes one post page; failures are logged and yield `None`
    async fn fetch_post(&self, post_url: &str, base_url: &str) -> Option<ParsedPost> {
        let html = match self.fetcher.fetch_text(post_url).await {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!("Failed to fetch post page {}: {}", post_url, e);
                return None;
            }
        };

        let post = scrape_post(&html, post_url, base_url);
        if post.is_none() {
            tracing::debug!("Skipping post with empty title: {}", post_url);
        }
        post
    }

    /// Reads `{base_url}/robots.txt` and returns its first `Sitemap:` directive
    ///
    /// The directive is matched case-insensitively and resolved against the
    /// base URL. A missing robots file is not an error.
    pub async fn discover_sitemap_from_robots(&self, base_url: &str) -> Option<String> {
        let robots_url = robots_location(base_url);
        let content = match self.fetcher.fetch_text(&robots_url).await {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Failed to discover sitemap from {}: {}", robots_url, e);
                return None;
            }
        };

        let discovered = content
            .lines()
            .filter_map(sitemap_directive)
            .next()
            .map(|raw| resolve_against(base_url.trim(), raw));
        if discovered.is_none() {
            tracing::debug!("No sitemap directive in {}", robots_url);
        }
        discovered
    }
}

/// Value of a `Sitemap:` robots line, if the line is one
fn sitemap_directive(line: &str) -> Option<&str> {
    const DIRECTIVE: &str = "sitemap:";

    let line = line.trim();
    let prefix = line.get(..DIRECTIVE.len())?;
    if !prefix.eq_ignore_ascii_case(DIRECTIVE) {
        return None;
    }
    let value = line[DIRECTIVE.len()..].trim();
    (!value.is_empty()).then_some(value)
}

#[async_trait]
impl PostParser for SitemapCrawler {
    fn parser_type(&self) -> ParserType {
        ParserType::Sitemap
    }

    async fn fetch(&self, profile: &SourceProfile) -> Result<Vec<ParsedPost>> {
        let entry_url = Self::resolve_entry_url(profile)?;
        let post_urls = self.collect_post_urls(&entry_url).await;
        tracing::debug!(
            "Collected {} post URLs for {} from {}",
            post_urls.len(),
            profile.source_name,
            entry_url
        );

        let mut posts = Vec::new();
        for post_url in &post_urls {
            if let Some(post) = self.fetch_post(post_url, &profile.base_url).await {
                posts.push(post);
            }
        }
        Ok(posts)
    }
}

#[async_trait]
impl SitemapDiscovery for SitemapCrawler {
    async fn discover_sitemap(&self, base_url: &str) -> Option<String> {
        self.discover_sitemap_from_robots(base_url).await
    }
}
