//! Sync job snapshots
//!
//! A job is created RUNNING at the start of every sync attempt and ends
//! COMPLETED or FAILED. Transitions never mutate a snapshot; they return the
//! next one.

use crate::timestamp::now_local;
use chrono::NaiveDateTime;

/// Longest error message kept on a failed job, in characters
pub const MAX_ERROR_MESSAGE_CHARS: usize = 1000;

/// Status of a sync job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Converts the job status to the string stored in `sync_jobs.status`
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Parses a stored job status
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// One sync attempt of one source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJob {
    /// Row ID, `None` until the job is saved
    pub id: Option<i64>,
    pub source_id: i64,
    pub status: JobStatus,
    pub started_at: NaiveDateTime,
    pub ended_at: Option<NaiveDateTime>,
    pub success_count: u32,
    pub failure_count: u32,
    pub error_message: Option<String>,
}

impl SyncJob {
    /// A running job starting now
    pub fn start(source_id: i64) -> Self {
        Self::started_at(source_id, now_local())
    }

    /// A running job with an explicit start time
    pub fn started_at(source_id: i64, started_at: NaiveDateTime) -> Self {
        Self {
            id: None,
            source_id,
            status: JobStatus::Running,
            started_at,
            ended_at: None,
            success_count: 0,
            failure_count: 0,
            error_message: None,
        }
    }

    /// The same snapshot carrying its saved row ID
    pub fn with_id(&self, id: i64) -> Self {
        Self {
            id: Some(id),
            ..self.clone()
        }
    }

    /// The completed snapshot
    pub fn complete(&self, success_count: u32) -> Self {
        Self {
            status: JobStatus::Completed,
            ended_at: Some(now_local()),
            success_count,
            failure_count: 0,
            error_message: None,
            ..self.clone()
        }
    }

    /// The failed snapshot; the message is cut to [`MAX_ERROR_MESSAGE_CHARS`]
    pub fn fail(&self, message: &str) -> Self {
        Self {
            status: JobStatus::Failed,
            ended_at: Some(now_local()),
            failure_count: 1,
            error_message: Some(truncate_chars(message, MAX_ERROR_MESSAGE_CHARS)),
            ..self.clone()
        }
    }
}

fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((end, _)) => value[..end].to_string(),
        None => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status_roundtrip() {
        for status in [JobStatus::Running, JobStatus::Completed, JobStatus::Failed] {
            assert_eq!(JobStatus::from_db_string(status.to_db_string()), Some(status));
        }
        assert_eq!(JobStatus::from_db_string("interrupted"), None);
    }

    #[test]
    fn test_complete_leaves_original_untouched() {
        let started = SyncJob::start(7).with_id(3);
        let completed = started.complete(12);

        assert_eq!(started.status, JobStatus::Running);
        assert_eq!(started.ended_at, None);

        assert_eq!(completed.id, Some(3));
        assert_eq!(completed.status, JobStatus::Completed);
        assert_eq!(completed.success_count, 12);
        assert_eq!(completed.failure_count, 0);
        assert!(completed.ended_at.is_some());
        assert_eq!(completed.started_at, started.started_at);
    }

    #[test]
    fn test_fail_truncates_message() {
        let message = "가".repeat(MAX_ERROR_MESSAGE_CHARS + 5);
        let failed = SyncJob::start(1).fail(&message);

        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.failure_count, 1);
        assert_eq!(
            failed.error_message.unwrap().chars().count(),
            MAX_ERROR_MESSAGE_CHARS
        );
    }

    #[test]
    fn test_short_message_is_kept() {
        let failed = SyncJob::start(1).fail("HTTP 503 for https://a.com/feed");
        assert_eq!(
            failed.error_message.as_deref(),
            Some("HTTP 503 for https://a.com/feed")
        );
    }
}
