//! Periodic batch trigger
//!
//! Batches run back to back with a fixed delay measured from the end of one
//! batch to the start of the next, so two batches never overlap.

use super::orchestrator::SyncOrchestrator;
use crate::storage::Storage;
use std::future::Future;
use std::time::Duration;

/// Runs batches until Ctrl-C is received
///
/// A batch that cannot load the active sources is logged and retried after
/// the next delay.
///
/// # Returns
///
/// Number of batches that ran
pub async fn run_periodic<S: Storage>(
    orchestrator: &mut SyncOrchestrator<S>,
    fixed_delay: Duration,
) -> usize {
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };
    run_periodic_until(orchestrator, fixed_delay, shutdown).await
}

/// Runs batches until `shutdown` resolves
///
/// A batch in progress is finished before shutdown is honored.
pub async fn run_periodic_until<S, F>(
    orchestrator: &mut SyncOrchestrator<S>,
    fixed_delay: Duration,
    shutdown: F,
) -> usize
where
    S: Storage,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    let mut batches = 0;

    loop {
        batches += 1;
        match orchestrator.sync_active_sources().await {
            Ok(report) => tracing::info!(
                "Batch {} finished: {} synced, {} skipped, {} failed, {} posts saved",
                batches,
                report.synced_count(),
                report.skipped_count(),
                report.failed_count(),
                report.saved_total()
            ),
            Err(e) => tracing::error!("Batch {} could not load active sources: {}", batches, e),
        }

        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested, stopping after {} batches", batches);
                return batches;
            }
            _ = tokio::time::sleep(fixed_delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ParserRegistry, SitemapDiscovery};
    use crate::storage::SqliteStorage;
    use async_trait::async_trait;

    struct NoDiscovery;

    #[async_trait]
    impl SitemapDiscovery for NoDiscovery {
        async fn discover_sitemap(&self, _base_url: &str) -> Option<String> {
            None
        }
    }

    fn orchestrator() -> SyncOrchestrator<SqliteStorage> {
        SyncOrchestrator::new(
            SqliteStorage::new_in_memory().unwrap(),
            ParserRegistry::new(),
            Box::new(NoDiscovery),
        )
    }

    #[tokio::test]
    async fn test_runs_first_batch_immediately() {
        let mut orchestrator = orchestrator();
        let batches =
            run_periodic_until(&mut orchestrator, Duration::from_secs(3600), async {}).await;
        assert_eq!(batches, 1);
    }

    #[tokio::test]
    async fn test_repeats_after_fixed_delay() {
        let mut orchestrator = orchestrator();
        let shutdown = tokio::time::sleep(Duration::from_millis(200));
        let batches =
            run_periodic_until(&mut orchestrator, Duration::from_millis(10), shutdown).await;
        assert!(batches > 1);
    }

    #[tokio::test]
    async fn test_failed_batch_does_not_stop_the_loop() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let storage = SqliteStorage::new(file.path()).unwrap();
        rusqlite::Connection::open(file.path())
            .unwrap()
            .execute_batch("DROP TABLE post_tags; DROP TABLE posts; DROP TABLE sync_jobs; DROP TABLE sources;")
            .unwrap();

        let mut orchestrator =
            SyncOrchestrator::new(storage, ParserRegistry::new(), Box::new(NoDiscovery));
        assert!(orchestrator.sync_active_sources().await.is_err());

        let shutdown = tokio::time::sleep(Duration::from_millis(200));
        let batches =
            run_periodic_until(&mut orchestrator, Duration::from_millis(10), shutdown).await;
        assert!(batches > 1);
    }
}
