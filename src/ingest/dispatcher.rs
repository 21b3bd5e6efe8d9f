//! Parser selection
//!
//! Each parser type maps to exactly one parser. The registry is built once
//! and handed to the sync orchestrator.

use crate::config::FetchConfig;
use crate::ingest::{FeedParser, Fetcher, ParsedPost, ParserType, SitemapCrawler, SourceProfile};
use crate::{Result, TideError};
use async_trait::async_trait;
use std::collections::HashMap;

/// A strategy that turns a source profile into posts
#[async_trait]
pub trait PostParser: Send + Sync {
    /// The parser type this parser serves
    fn parser_type(&self) -> ParserType;

    /// Acquires the current posts of a source
    async fn fetch(&self, profile: &SourceProfile) -> Result<Vec<ParsedPost>>;
}

/// Lookup table from parser type to its parser
#[derive(Default)]
pub struct ParserRegistry {
    parsers: HashMap<ParserType, Box<dyn PostParser>>,
}

impl ParserRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the feed parser and the sitemap crawler
    pub fn with_defaults(fetcher: Fetcher, limits: &FetchConfig) -> Result<Self> {
        let mut registry = Self::new();
        registry.register(Box::new(FeedParser::new(fetcher.clone())))?;
        registry.register(Box::new(SitemapCrawler::new(fetcher, limits)))?;
        Ok(registry)
    }

    /// Adds a parser under its declared type
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The parser was registered
    /// * `Err(TideError::DuplicateParser)` - The type already has a parser
    pub fn register(&mut self, parser: Box<dyn PostParser>) -> Result<()> {
        let parser_type = parser.parser_type();
        if self.parsers.contains_key(&parser_type) {
            return Err(TideError::DuplicateParser(parser_type));
        }
        self.parsers.insert(parser_type, parser);
        Ok(())
    }

    /// Selects the parser for a parser type
    ///
    /// # Returns
    ///
    /// * `Ok(&dyn PostParser)` - The registered parser
    /// * `Err(TideError::NoParser)` - Nothing serves this type
    pub fn resolve(&self, parser_type: ParserType) -> Result<&dyn PostParser> {
        self.parsers
            .get(&parser_type)
            .map(|parser| parser.as_ref())
            .ok_or(TideError::NoParser(parser_type))
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}
