//! Storage traits and error types
//!
//! This module defines the collaborator interfaces the merger and the sync
//! orchestrator depend on, and their error type.

use crate::storage::{NewPost, NewSource, PostRecord, SourceRecord, StoreStatistics, TagRecord};
use crate::sync::{JobStatus, SyncJob};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Post not found: {0}")]
    PostNotFound(i64),

    #[error("Sync job has not been saved")]
    UnsavedJob,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// The source registry
pub trait SourceStore {
    /// Inserts a source, or updates the one with the same name
    ///
    /// # Returns
    ///
    /// The source ID (either newly created or existing)
    fn upsert_source(&mut self, source: &NewSource) -> StorageResult<i64>;

    /// Gets a source by ID
    fn find_source_by_id(&self, id: i64) -> StorageResult<Option<SourceRecord>>;

    /// Gets a source by its unique name
    fn find_source_by_name(&self, name: &str) -> StorageResult<Option<SourceRecord>>;

    /// Gets all active sources, ordered by ID
    fn find_active_sources(&self) -> StorageResult<Vec<SourceRecord>>;

    /// Gets every source, ordered by ID
    fn list_sources(&self) -> StorageResult<Vec<SourceRecord>>;
}

/// The sync job audit trail
///
/// Jobs are immutable snapshots: a transition builds a new snapshot which is
/// then written over the stored row.
pub trait SyncJobStore {
    /// Inserts a job snapshot and returns its ID
    fn insert_job(&mut self, job: &SyncJob) -> StorageResult<i64>;

    /// Overwrites a saved job with a newer snapshot
    fn update_job(&mut self, job: &SyncJob) -> StorageResult<()>;

    /// Gets all jobs of a source, oldest first
    fn find_jobs_by_source(&self, source_id: i64) -> StorageResult<Vec<SyncJob>>;

    /// Start time of the most recent job of a source
    fn find_latest_started_at(&self, source_id: i64) -> StorageResult<Option<NaiveDateTime>>;

    /// Counts jobs in a status
    fn count_jobs_by_status(&self, status: JobStatus) -> StorageResult<u64>;

    /// Records a new running job for a source
    fn start_job(&mut self, source_id: i64) -> StorageResult<SyncJob> {
        let job = SyncJob::start(source_id);
        let id = self.insert_job(&job)?;
        Ok(job.with_id(id))
    }

    /// Marks a job completed with its saved count
    fn complete_job(&mut self, job: &SyncJob, success_count: u32) -> StorageResult<SyncJob> {
        let completed = job.complete(success_count);
        self.update_job(&completed)?;
        Ok(completed)
    }

    /// Marks a job failed with an error message
    fn fail_job(&mut self, job: &SyncJob, message: &str) -> StorageResult<SyncJob> {
        let failed = job.fail(message);
        self.update_job(&failed)?;
        Ok(failed)
    }
}

/// Posts keyed by canonical URL
pub trait PostStore {
    /// Gets a post by its canonical URL
    fn find_post_by_canonical_url(&self, canonical_url: &str) -> StorageResult<Option<PostRecord>>;

    /// Inserts a new post and returns its ID
    fn insert_post(&mut self, post: &NewPost) -> StorageResult<i64>;

    /// Writes the mutable fields of an existing post
    fn update_post(&mut self, post: &PostRecord) -> StorageResult<()>;

    /// Replaces the tag set of a post
    fn replace_post_tags(&mut self, post_id: i64, tag_ids: &[i64]) -> StorageResult<()>;

    /// Gets the tags of a post, in association order
    fn find_tags_for_post(&self, post_id: i64) -> StorageResult<Vec<TagRecord>>;

    /// Gets total post count
    fn count_posts(&self) -> StorageResult<u64>;
}

/// Tags unique by name
pub trait TagStore {
    /// Gets the tags whose names are in `names`
    fn find_tags_by_names(&self, names: &[String]) -> StorageResult<Vec<TagRecord>>;

    /// Inserts a tag and returns it
    fn insert_tag(&mut self, name: &str) -> StorageResult<TagRecord>;

    /// Gets total tag count
    fn count_tags(&self) -> StorageResult<u64>;
}

/// Every collaborator interface of the pipeline in one bound
pub trait Storage: SourceStore + SyncJobStore + PostStore + TagStore {
    /// Aggregate counts across the store
    fn statistics(&self) -> StorageResult<StoreStatistics> {
        let sources = self.list_sources()?;
        Ok(StoreStatistics {
            sources: sources.len() as u64,
            active_sources: sources.iter().filter(|source| source.active).count() as u64,
            posts: self.count_posts()?,
            tags: self.count_tags()?,
            running_jobs: self.count_jobs_by_status(JobStatus::Running)?,
            completed_jobs: self.count_jobs_by_status(JobStatus::Completed)?,
            failed_jobs: self.count_jobs_by_status(JobStatus::Failed)?,
        })
    }
}

impl<T: SourceStore + SyncJobStore + PostStore + TagStore> Storage for T {}
