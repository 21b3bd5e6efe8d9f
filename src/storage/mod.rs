//! Storage module for persisting ingested data
//!
//! This module handles all database operations of the pipeline, including:
//! - SQLite database initialization and schema management
//! - Source registry seeded from configuration
//! - Posts keyed by canonical URL, with tag associations
//! - The sync job audit trail

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{
    PostStore, SourceStore, Storage, StorageError, StorageResult, SyncJobStore, TagStore,
};

use crate::config::SourceEntry;
use crate::ingest::ParserType;
use chrono::NaiveDateTime;
use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Upserts every configured source by name
///
/// Sources present in the store but absent from the configuration are left
/// untouched.
///
/// # Returns
///
/// * `Ok(Vec<i64>)` - The source IDs, in configuration order
/// * `Err(StorageError)` - A source could not be written
pub fn register_sources<S: SourceStore + ?Sized>(
    store: &mut S,
    entries: &[SourceEntry],
) -> StorageResult<Vec<i64>> {
    let mut ids = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = store.upsert_source(&NewSource::from(entry))?;
        tracing::debug!("Registered source {} as {}", entry.name.trim(), id);
        ids.push(id);
    }
    Ok(ids)
}

/// Represents a source in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub id: i64,
    pub name: String,
    pub base_url: String,
    pub feed_url: Option<String>,
    pub parser_type: ParserType,
    pub interval_min: Option<i64>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Source fields written on insert or update, matched by name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSource {
    pub name: String,
    pub base_url: String,
    pub feed_url: Option<String>,
    pub parser_type: ParserType,
    pub interval_min: Option<i64>,
    pub active: bool,
}

impl From<&SourceEntry> for NewSource {
    fn from(entry: &SourceEntry) -> Self {
        Self {
            name: entry.name.trim().to_string(),
            base_url: entry.base_url.trim().to_string(),
            feed_url: crate::url::non_blank(entry.feed_url.as_deref()).map(str::to_string),
            parser_type: entry.parser_type,
            interval_min: entry.interval_min,
            active: entry.active,
        }
    }
}

/// Represents a post in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    pub id: i64,
    pub source_id: i64,
    pub canonical_url: String,
    pub title: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub thumbnail_url: Option<String>,
    pub published_at: NaiveDateTime,
    pub fetched_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Post fields written on first sighting of a canonical URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub source_id: i64,
    pub canonical_url: String,
    pub title: String,
    pub summary: Option<String>,
    pub author: Option<String>,
    pub thumbnail_url: Option<String>,
    pub published_at: NaiveDateTime,
}

/// Represents a tag in the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRecord {
    pub id: i64,
    pub name: String,
}

/// Aggregate counts for `--stats`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    pub sources: u64,
    pub active_sources: u64,
    pub posts: u64,
    pub tags: u64,
    pub running_jobs: u64,
    pub completed_jobs: u64,
    pub failed_jobs: u64,
}
