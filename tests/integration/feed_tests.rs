//! Feed ingestion against a mock blog

use crate::common::{fetcher, serve};
use feed_tide::ingest::{FeedParser, PostParser};
use feed_tide::{ParserType, SourceProfile, TideError};
use wiremock::MockServer;

fn profile(feed_url: Option<String>) -> SourceProfile {
    SourceProfile {
        source_id: 7,
        source_name: "Feed Blog".to_string(),
        base_url: "https://blog.example.com".to_string(),
        feed_url,
        sitemap_url: None,
        parser_type: ParserType::Feed,
    }
}

const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Example Tech Blog</title>
    <link>https://blog.example.com</link>
    <description>Posts</description>
    <item>
      <title>Protocol relative</title>
      <link>https://blog.example.com/posts/1</link>
      <description><![CDATA[<p><img src="//img.example.com/a.png"> intro</p>]]></description>
      <author>writer@example.com (Writer)</author>
      <category>Rust</category>
      <category>Infra</category>
      <pubDate>Wed, 01 Jan 2025 09:30:00 GMT</pubDate>
    </item>
    <item>
      <title>Relative image</title>
      <link>https://blog.example.com/posts/2</link>
      <description><![CDATA[<img data-src="/images/2.png" src="data:image/gif;base64,R0lGOD">]]></description>
    </item>
  </channel>
</rss>"#;

#[tokio::test]
async fn test_feed_entries_become_posts() {
    let server = MockServer::start().await;
    serve(&server, "/feed.xml", "application/rss+xml", RSS.to_string()).await;

    let parser = FeedParser::new(fetcher());
    let posts = parser
        .fetch(&profile(Some(format!("{}/feed.xml", server.uri()))))
        .await
        .unwrap();

    assert_eq!(posts.len(), 2);

    assert_eq!(posts[0].title, "Protocol relative");
    assert_eq!(posts[0].canonical_url, "https://blog.example.com/posts/1");
    assert_eq!(
        posts[0].thumbnail_url.as_deref(),
        Some("https://img.example.com/a.png")
    );
    assert!(posts[0].tags.contains("Rust"));
    assert!(posts[0].tags.contains("Infra"));
    assert!(posts[0].published_at.is_some());

    assert_eq!(
        posts[1].thumbnail_url.as_deref(),
        Some("https://blog.example.com/images/2.png")
    );
}

#[tokio::test]
async fn test_source_without_feed_url_yields_nothing() {
    let parser = FeedParser::new(fetcher());
    let posts = parser.fetch(&profile(Some("  ".to_string()))).await.unwrap();
    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_invalid_feed_is_an_error() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/feed.xml",
        "text/html",
        "<html><body>not a feed</body></html>".to_string(),
    )
    .await;

    let parser = FeedParser::new(fetcher());
    let result = parser
        .fetch(&profile(Some(format!("{}/feed.xml", server.uri()))))
        .await;

    assert!(matches!(result, Err(TideError::FeedParse { .. })));
}
