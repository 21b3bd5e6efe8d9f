//! Sync orchestration
//!
//! Runs one source at a time through its parser and the merger, recording a
//! job for every attempt.

use crate::ingest::{ParserRegistry, ParserType, SitemapDiscovery, SourceProfile};
use crate::merge;
use crate::storage::{SourceRecord, Storage};
use crate::timestamp::now_local;
use crate::url::{non_blank, sitemap_default};
use crate::{Result, TideError};
use chrono::{Duration, NaiveDateTime};
use std::fmt;

/// Outcome of one successful sync or backfill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncResult {
    pub source_name: String,
    pub parsed_count: usize,
    pub saved_count: usize,
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: parsed {}, saved {}",
            self.source_name, self.parsed_count, self.saved_count
        )
    }
}

/// What happened to one source during a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    /// Interval not yet elapsed
    Skipped,
    Synced(SyncResult),
    Failed(String),
}

/// Per-source entry of a batch report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source_id: i64,
    pub source_name: String,
    pub outcome: SourceOutcome,
}

/// Result of one batch over the active sources
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub sources: Vec<SourceReport>,
}

impl BatchReport {
    pub fn synced_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, SourceOutcome::Synced(_)))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, SourceOutcome::Skipped))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, SourceOutcome::Failed(_)))
    }

    /// Posts saved across all synced sources
    pub fn saved_total(&self) -> usize {
        self.sources
            .iter()
            .filter_map(|report| match &report.outcome {
                SourceOutcome::Synced(result) => Some(result.saved_count),
                _ => None,
            })
            .sum()
    }

    /// Outcome recorded for a source, by name
    pub fn outcome_of(&self, source_name: &str) -> Option<&SourceOutcome> {
        self.sources
            .iter()
            .find(|report| report.source_name == source_name)
            .map(|report| &report.outcome)
    }

    fn count(&self, predicate: impl Fn(&SourceOutcome) -> bool) -> usize {
        self.sources
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

/// Drives source syncs against a store
pub struct SyncOrchestrator<S> {
    store: S,
    parsers: ParserRegistry,
    discovery: Box<dyn SitemapDiscovery>,
}

impl<S: Storage> SyncOrchestrator<S> {
    /// Creates an orchestrator
    ///
    /// # Arguments
    ///
    /// * `store` - Source registry, job trail, post and tag store
    /// * `parsers` - The parser for each parser type
    /// * `discovery` - Robots-based sitemap discovery used by backfills
    pub fn new(store: S, parsers: ParserRegistry, discovery: Box<dyn SitemapDiscovery>) -> Self {
        Self {
            store,
            parsers,
            discovery,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Syncs every active source whose interval has elapsed
    ///
    /// A failure of one source is recorded in the report and does not stop
    /// the remaining sources.
    ///
    /// # Returns
    ///
    /// * `Ok(BatchReport)` - One entry per active source
    /// * `Err(TideError)` - The active sources could not be loaded
    pub async fn sync_active_sources(&mut self) -> Result<BatchReport> {
        let sources = self.store.find_active_sources()?;
        let now = now_local();
        let mut report = BatchReport::default();

        for source in sources {
            let outcome = match self.is_sync_due(&source, now) {
                Ok(false) => {
                    tracing::debug!(
                        "Sync skipped by interval: {} (interval {:?} min)",
                        source.name,
                        source.interval_min
                    );
                    SourceOutcome::Skipped
                }
                Ok(true) => match self.sync_source(&source).await {
                    Ok(result) => SourceOutcome::Synced(result),
                    Err(e) => {
                        tracing::error!(
                            "Sync failed for {} ({}): {}",
                            source.name,
                            source.parser_type,
                            e
                        );
                        SourceOutcome::Failed(e.to_string())
                    }
                },
                Err(e) => {
                    tracing::error!("Failed to check sync interval of {}: {}", source.name, e);
                    SourceOutcome::Failed(e.to_string())
                }
            };

            report.sources.push(SourceReport {
                source_id: source.id,
                source_name: source.name,
                outcome,
            });
        }

        Ok(report)
    }

    /// Whether a source's interval has elapsed at `now`
    ///
    /// Sources without a positive interval, and sources never synced, are
    /// always due. Otherwise the latest job start plus the interval must not
    /// be after `now`.
    pub fn is_sync_due(&self, source: &SourceRecord, now: NaiveDateTime) -> Result<bool> {
        let Some(interval_min) = source.interval_min.filter(|minutes| *minutes > 0) else {
            return Ok(true);
        };

        let Some(last_started_at) = self.store.find_latest_started_at(source.id)? else {
            return Ok(true);
        };

        Ok(Duration::try_minutes(interval_min)
            .and_then(|interval| last_started_at.checked_add_signed(interval))
            .map_or(false, |due_at| due_at <= now))
    }

    /// Manually syncs a source, ignoring its interval
    ///
    /// # Returns
    ///
    /// * `Ok(SyncResult)` - The sync succeeded
    /// * `Err(TideError::SourceNotFound)` - No source has this ID
    /// * `Err(TideError)` - The sync failed; the job is recorded as failed
    pub async fn sync_source_by_id(&mut self, source_id: i64) -> Result<SyncResult> {
        let source = self.find_source(source_id)?;
        self.sync_source(&source).await
    }

    /// Manually backfills a source from its sitemap
    ///
    /// # Arguments
    ///
    /// * `source_id` - The source to backfill
    /// * `sitemap_override` - Sitemap to crawl instead of the resolved one
    pub async fn backfill_source_by_id(
        &mut self,
        source_id: i64,
        sitemap_override: Option<&str>,
    ) -> Result<SyncResult> {
        let source = self.find_source(source_id)?;
        self.backfill_source(&source, sitemap_override).await
    }

    /// Syncs one source with its configured parser
    pub async fn sync_source(&mut self, source: &SourceRecord) -> Result<SyncResult> {
        let result = self
            .run_job(source, SourceProfile::from_source(source))
            .await?;

        tracing::info!(
            "Source sync completed: {} ({}), parsed {}, saved {}",
            source.name,
            source.parser_type,
            result.parsed_count,
            result.saved_count
        );
        Ok(result)
    }

    /// Crawls one source's sitemap regardless of its configured parser
    pub async fn backfill_source(
        &mut self,
        source: &SourceRecord,
        sitemap_override: Option<&str>,
    ) -> Result<SyncResult> {
        let sitemap_url = self
            .resolve_backfill_sitemap_url(source, sitemap_override)
            .await;
        let result = self
            .run_job(source, SourceProfile::for_backfill(source, sitemap_url.clone()))
            .await?;

        tracing::info!(
            "Source backfill completed: {} from {}, parsed {}, saved {}",
            source.name,
            sitemap_url,
            result.parsed_count,
            result.saved_count
        );
        Ok(result)
    }

    /// Picks the sitemap a backfill crawls
    ///
    /// # Resolution Order
    ///
    /// 1. The explicit override
    /// 2. The feed URL of a sitemap-based source
    /// 3. A feed URL containing "sitemap" (case-insensitive)
    /// 4. The first `Sitemap:` directive of the site's robots file
    /// 5. `{base_url}/sitemap.xml`
    pub async fn resolve_backfill_sitemap_url(
        &self,
        source: &SourceRecord,
        sitemap_override: Option<&str>,
    ) -> String {
        if let Some(url) = non_blank(sitemap_override) {
            return url.to_string();
        }

        if let Some(feed_url) = non_blank(source.feed_url.as_deref()) {
            let sitemap_based = source.parser_type == ParserType::Sitemap;
            if sitemap_based || feed_url.to_lowercase().contains("sitemap") {
                return feed_url.to_string();
            }
        }

        if let Some(discovered) = self.discovery.discover_sitemap(&source.base_url).await {
            return discovered;
        }

        sitemap_default(&source.base_url)
    }

    fn find_source(&self, source_id: i64) -> Result<SourceRecord> {
        self.store
            .find_source_by_id(source_id)?
            .ok_or(TideError::SourceNotFound(source_id))
    }

    /// Runs parser and merger under a job record
    async fn run_job(&mut self, source: &SourceRecord, profile: SourceProfile) -> Result<SyncResult> {
        let job = self.store.start_job(source.id)?;

        match self.fetch_and_merge(source, &profile).await {
            Ok((parsed_count, saved_count)) => {
                self.store.complete_job(&job, saved_count as u32)?;
                Ok(SyncResult {
                    source_name: source.name.clone(),
                    parsed_count,
                    saved_count,
                })
            }
            Err(e) => {
                if let Err(store_error) = self.store.fail_job(&job, &e.to_string()) {
                    tracing::warn!(
                        "Failed to record failed job for {}: {}",
                        source.name,
                        store_error
                    );
                }
                Err(e)
            }
        }
    }

    async fn fetch_and_merge(
        &mut self,
        source: &SourceRecord,
        profile: &SourceProfile,
    ) -> Result<(usize, usize)> {
        let parser = self.parsers.resolve(profile.parser_type)?;
        let posts = parser.fetch(profile).await?;
        let saved_count = merge::upsert(&mut self.store, source, &posts)?;
        Ok((posts.len(), saved_count))
    }
}
