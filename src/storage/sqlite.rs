//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the storage traits.

use crate::ingest::ParserType;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{
    PostStore, SourceStore, StorageError, StorageResult, SyncJobStore, TagStore,
};
use crate::storage::{NewPost, NewSource, PostRecord, SourceRecord, TagRecord};
use crate::sync::{JobStatus, SyncJob};
use crate::timestamp::now_local;
use chrono::NaiveDateTime;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

const SOURCE_COLUMNS: &str =
    "id, name, base_url, feed_url, parser_type, interval_min, active, created_at, updated_at";

const POST_COLUMNS: &str = "id, source_id, canonical_url, title, summary, author, thumbnail_url,
     published_at, fetched_at, created_at, updated_at";

const JOB_COLUMNS: &str =
    "id, source_id, status, started_at, ended_at, success_count, failure_count, error_message";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Converts a text column through a `from_db_string` style parser
fn parse_column<T>(
    row: &Row<'_>,
    index: usize,
    parse: fn(&str) -> Option<T>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(index)?;
    parse(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            format!("unknown value '{}'", raw).into(),
        )
    })
}

fn source_from_row(row: &Row<'_>) -> rusqlite::Result<SourceRecord> {
    Ok(SourceRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        base_url: row.get(2)?,
        feed_url: row.get(3)?,
        parser_type: parse_column(row, 4, ParserType::from_db_string)?,
        interval_min: row.get(5)?,
        active: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        source_id: row.get(1)?,
        canonical_url: row.get(2)?,
        title: row.get(3)?,
        summary: row.get(4)?,
        author: row.get(5)?,
        thumbnail_url: row.get(6)?,
        published_at: row.get(7)?,
        fetched_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn job_from_row(row: &Row<'_>) -> rusqlite::Result<SyncJob> {
    Ok(SyncJob {
        id: row.get(0)?,
        source_id: row.get(1)?,
        status: parse_column(row, 2, JobStatus::from_db_string)?,
        started_at: row.get(3)?,
        ended_at: row.get(4)?,
        success_count: row.get(5)?,
        failure_count: row.get(6)?,
        error_message: row.get(7)?,
    })
}

impl SourceStore for SqliteStorage {
    fn upsert_source(&mut self, source: &NewSource) -> StorageResult<i64> {
        let now = now_local();
        self.conn.execute(
            "INSERT INTO sources
             (name, base_url, feed_url, parser_type, interval_min, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             ON CONFLICT(name) DO UPDATE SET
                base_url = excluded.base_url,
                feed_url = excluded.feed_url,
                parser_type = excluded.parser_type,
                interval_min = excluded.interval_min,
                active = excluded.active,
                updated_at = excluded.updated_at",
            params![
                source.name,
                source.base_url,
                source.feed_url,
                source.parser_type.to_db_string(),
                source.interval_min,
                source.active,
                now,
            ],
        )?;

        let id = self.conn.query_row(
            "SELECT id FROM sources WHERE name = ?1",
            params![source.name],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    fn find_source_by_id(&self, id: i64) -> StorageResult<Option<SourceRecord>> {
        let source = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sources WHERE id = ?1", SOURCE_COLUMNS),
                params![id],
                source_from_row,
            )
            .optional()?;
        Ok(source)
    }

    fn find_source_by_name(&self, name: &str) -> StorageResult<Option<SourceRecord>> {
        let source = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sources WHERE name = ?1", SOURCE_COLUMNS),
                params![name],
                source_from_row,
            )
            .optional()?;
        Ok(source)
    }

    fn find_active_sources(&self) -> StorageResult<Vec<SourceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sources WHERE active = 1 ORDER BY id",
            SOURCE_COLUMNS
        ))?;

        let sources = stmt
            .query_map([], source_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sources)
    }

    fn list_sources(&self) -> StorageResult<Vec<SourceRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM sources ORDER BY id", SOURCE_COLUMNS))?;

        let sources = stmt
            .query_map([], source_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(sources)
    }
}

impl SyncJobStore for SqliteStorage {
    fn insert_job(&mut self, job: &SyncJob) -> StorageResult<i64> {
        self.conn.execute(
            "INSERT INTO sync_jobs
             (source_id, status, started_at, ended_at, success_count, failure_count, error_message)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                job.source_id,
                job.status.to_db_string(),
                job.started_at,
                job.ended_at,
                job.success_count,
                job.failure_count,
                job.error_message,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_job(&mut self, job: &SyncJob) -> StorageResult<()> {
        let id = job.id.ok_or(StorageError::UnsavedJob)?;
        self.conn.execute(
            "UPDATE sync_jobs SET status = ?1, ended_at = ?2, success_count = ?3,
             failure_count = ?4, error_message = ?5 WHERE id = ?6",
            params![
                job.status.to_db_string(),
                job.ended_at,
                job.success_count,
                job.failure_count,
                job.error_message,
                id,
            ],
        )?;
        Ok(())
    }

    fn find_jobs_by_source(&self, source_id: i64) -> StorageResult<Vec<SyncJob>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sync_jobs WHERE source_id = ?1 ORDER BY id",
            JOB_COLUMNS
        ))?;

        let jobs = stmt
            .query_map(params![source_id], job_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(jobs)
    }

    fn find_latest_started_at(&self, source_id: i64) -> StorageResult<Option<NaiveDateTime>> {
        let latest = self.conn.query_row(
            "SELECT MAX(started_at) FROM sync_jobs WHERE source_id = ?1",
            params![source_id],
            |row| row.get::<_, Option<NaiveDateTime>>(0),
        )?;
        Ok(latest)
    }

    fn count_jobs_by_status(&self, status: JobStatus) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sync_jobs WHERE status = ?1",
            params![status.to_db_string()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl PostStore for SqliteStorage {
    fn find_post_by_canonical_url(&self, canonical_url: &str) -> StorageResult<Option<PostRecord>> {
        let post = self
            .conn
            .query_row(
                &format!("SELECT {} FROM posts WHERE canonical_url = ?1", POST_COLUMNS),
                params![canonical_url],
                post_from_row,
            )
            .optional()?;
        Ok(post)
    }

    fn insert_post(&mut self, post: &NewPost) -> StorageResult<i64> {
        let now = now_local();
        self.conn.execute(
            "INSERT INTO posts
             (source_id, canonical_url, title, summary, author, thumbnail_url,
              published_at, fetched_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8, ?8)",
            params![
                post.source_id,
                post.canonical_url,
                post.title,
                post.summary,
                post.author,
                post.thumbnail_url,
                post.published_at,
                now,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn update_post(&mut self, post: &PostRecord) -> StorageResult<()> {
        let changed = self.conn.execute(
            "UPDATE posts SET title = ?1, summary = ?2, author = ?3, thumbnail_url = ?4,
             published_at = ?5, fetched_at = ?6, updated_at = ?7 WHERE id = ?8",
            params![
                post.title,
                post.summary,
                post.author,
                post.thumbnail_url,
                post.published_at,
                post.fetched_at,
                post.updated_at,
                post.id,
            ],
        )?;

        if changed == 0 {
            return Err(StorageError::PostNotFound(post.id));
        }
        Ok(())
    }

    fn replace_post_tags(&mut self, post_id: i64, tag_ids: &[i64]) -> StorageResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM post_tags WHERE post_id = ?1", params![post_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO post_tags (post_id, tag_id, position) VALUES (?1, ?2, ?3)",
            )?;
            for (position, tag_id) in tag_ids.iter().enumerate() {
                stmt.execute(params![post_id, tag_id, position as i64])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn find_tags_for_post(&self, post_id: i64) -> StorageResult<Vec<TagRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name FROM post_tags pt
             JOIN tags t ON t.id = pt.tag_id
             WHERE pt.post_id = ?1
             ORDER BY pt.position",
        )?;

        let tags = stmt
            .query_map(params![post_id], |row| {
                Ok(TagRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    fn count_posts(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl TagStore for SqliteStorage {
    fn find_tags_by_names(&self, names: &[String]) -> StorageResult<Vec<TagRecord>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; names.len()].join(", ");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name FROM tags WHERE name IN ({})",
            placeholders
        ))?;

        let tags = stmt
            .query_map(params_from_iter(names.iter()), |row| {
                Ok(TagRecord {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(tags)
    }

    fn insert_tag(&mut self, name: &str) -> StorageResult<TagRecord> {
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?1)", params![name])?;
        Ok(TagRecord {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    fn count_tags(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
