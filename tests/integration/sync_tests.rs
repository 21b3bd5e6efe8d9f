//! End-to-end syncs through the orchestrator

use crate::common::{fetcher, post_page, serve};
use feed_tide::config::{parse_config, FetchConfig};
use feed_tide::ingest::{ParserRegistry, SitemapCrawler};
use feed_tide::storage::{
    register_sources, PostStore, SourceStore, SqliteStorage, Storage, SyncJobStore,
};
use feed_tide::sync::{JobStatus, SourceOutcome};
use feed_tide::SyncOrchestrator;
use wiremock::MockServer;

fn orchestrator(storage: SqliteStorage) -> SyncOrchestrator<SqliteStorage> {
    let limits = FetchConfig::default();
    let parsers = ParserRegistry::with_defaults(fetcher(), &limits).unwrap();
    let discovery = SitemapCrawler::new(fetcher(), &limits);
    SyncOrchestrator::new(storage, parsers, Box::new(discovery))
}

fn config_toml(base: &str) -> String {
    format!(
        r#"
[sync]
fixed-delay-ms = 60000

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[storage]
database-path = ":memory:"

[[source]]
name = "Feed Blog"
base-url = "{base}"
feed-url = "{base}/feed.xml"
parser-type = "rss"
interval-min = 30

[[source]]
name = "Sitemap Blog"
base-url = "{base}"
parser-type = "sitemap"

[[source]]
name = "Retired Blog"
base-url = "{base}"
feed-url = "{base}/old.xml"
parser-type = "feed"
active = false
"#
    )
}

async fn mount_blog(server: &MockServer) {
    let base = server.uri();

    serve(
        server,
        "/feed.xml",
        "application/rss+xml",
        format!(
            r#"<rss version="2.0"><channel><title>Blog</title><link>{base}</link><description>d</description>
<item><title>From feed</title><link>{base}/posts/a</link><category>rust</category>
<pubDate>Wed, 01 Jan 2025 09:30:00 GMT</pubDate></item>
</channel></rss>"#
        ),
    )
    .await;
    serve(
        server,
        "/sitemap.xml",
        "application/xml",
        format!("<urlset><url><loc>{base}/posts/a</loc></url><url><loc>{base}/posts/b</loc></url></urlset>"),
    )
    .await;
    serve(
        server,
        "/robots.txt",
        "text/plain",
        "User-agent: *\nSitemap: /dynamic-sitemap.xml\n".to_string(),
    )
    .await;
    serve(
        server,
        "/dynamic-sitemap.xml",
        "application/xml",
        format!("<urlset><url><loc>{base}/posts/b</loc></url></urlset>"),
    )
    .await;
    for (slug, title) in [("a", "Post A"), ("b", "Post B")] {
        serve(
            server,
            &format!("/posts/{slug}"),
            "text/html",
            post_page(
                &format!("{base}/posts/{slug}"),
                title,
                "summary",
                &format!("/images/{slug}.png"),
                "2025-01-01T09:30:00Z",
            ),
        )
        .await;
    }
}

#[tokio::test]
async fn test_batch_sync_merges_feed_and_sitemap_sources() {
    let server = MockServer::start().await;
    mount_blog(&server).await;

    let config = parse_config(&config_toml(&server.uri())).unwrap();
    let mut storage = SqliteStorage::new_in_memory().unwrap();
    register_sources(&mut storage, &config.sources).unwrap();
    let mut orchestrator = orchestrator(storage);

    let report = orchestrator.sync_active_sources().await.unwrap();

    assert_eq!(report.sources.len(), 2);
    assert_eq!(report.synced_count(), 2);
    assert!(report.outcome_of("Retired Blog").is_none());

    // Both sources publish /posts/a; it is stored once.
    let store = orchestrator.store();
    assert_eq!(store.count_posts().unwrap(), 2);
    let post_a = store
        .find_post_by_canonical_url(&format!("{}/posts/a", server.uri()))
        .unwrap()
        .unwrap();
    assert_eq!(post_a.title, "Post A");
    assert_eq!(
        post_a.thumbnail_url,
        Some(format!("{}/images/a.png", server.uri()))
    );

    let stats = store.statistics().unwrap();
    assert_eq!(stats.completed_jobs, 2);
    assert_eq!(stats.failed_jobs, 0);
}

#[tokio::test]
async fn test_second_batch_respects_interval() {
    let server = MockServer::start().await;
    mount_blog(&server).await;

    let config = parse_config(&config_toml(&server.uri())).unwrap();
    let mut storage = SqliteStorage::new_in_memory().unwrap();
    register_sources(&mut storage, &config.sources).unwrap();
    let mut orchestrator = orchestrator(storage);

    orchestrator.sync_active_sources().await.unwrap();
    let report = orchestrator.sync_active_sources().await.unwrap();

    assert_eq!(report.outcome_of("Feed Blog"), Some(&SourceOutcome::Skipped));
    assert!(matches!(
        report.outcome_of("Sitemap Blog"),
        Some(SourceOutcome::Synced(_))
    ));
}

#[tokio::test]
async fn test_unreachable_feed_records_failed_job() {
    let server = MockServer::start().await;

    let config = parse_config(&config_toml(&server.uri())).unwrap();
    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let ids = register_sources(&mut storage, &config.sources).unwrap();
    let mut orchestrator = orchestrator(storage);

    let result = orchestrator.sync_source_by_id(ids[0]).await;
    assert!(result.is_err());

    let jobs = orchestrator.store().find_jobs_by_source(ids[0]).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Failed);
    assert!(jobs[0].error_message.as_deref().unwrap().contains("404"));
}

#[tokio::test]
async fn test_backfill_discovers_sitemap_from_robots() {
    let server = MockServer::start().await;
    mount_blog(&server).await;

    let config = parse_config(&config_toml(&server.uri())).unwrap();
    let mut storage = SqliteStorage::new_in_memory().unwrap();
    let ids = register_sources(&mut storage, &config.sources).unwrap();
    let mut orchestrator = orchestrator(storage);

    let result = orchestrator.backfill_source_by_id(ids[0], None).await.unwrap();

    assert_eq!(result.source_name, "Feed Blog");
    assert_eq!(result.parsed_count, 1);
    assert_eq!(result.saved_count, 1);

    let store = orchestrator.store();
    let post_b = store
        .find_post_by_canonical_url(&format!("{}/posts/b", server.uri()))
        .unwrap()
        .unwrap();
    assert_eq!(post_b.source_id, ids[0]);
    assert_eq!(
        store.find_source_by_id(ids[0]).unwrap().unwrap().name,
        "Feed Blog"
    );
}
