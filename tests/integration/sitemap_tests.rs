//! Sitemap crawling against a mock blog

use crate::common::{fetcher, post_page, serve};
use feed_tide::config::FetchConfig;
use feed_tide::ingest::{PostParser, SitemapCrawler, SitemapDiscovery};
use feed_tide::timestamp::parse_date_time;
use feed_tide::{ParserType, SourceProfile};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn profile(base_url: &str, sitemap_url: Option<String>) -> SourceProfile {
    SourceProfile {
        source_id: 1,
        source_name: "Mock Blog".to_string(),
        base_url: base_url.to_string(),
        feed_url: None,
        sitemap_url,
        parser_type: ParserType::Sitemap,
    }
}

#[tokio::test]
async fn test_sitemap_index_yields_posts_in_order() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/sitemap.xml",
        "application/xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{base}/posts.xml</loc></sitemap>
</sitemapindex>"#
        ),
    )
    .await;
    serve(
        &server,
        "/posts.xml",
        "application/xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/posts/a</loc></url>
  <url><loc>{base}/posts/b</loc></url>
</urlset>"#
        ),
    )
    .await;
    serve(
        &server,
        "/posts/a",
        "text/html",
        post_page(
            &format!("{base}/posts/a"),
            "Post A",
            "Summary of A",
            "/images/a.png",
            "2025-01-01T09:30:00Z",
        ),
    )
    .await;
    serve(
        &server,
        "/posts/b",
        "text/html",
        post_page(
            &format!("{base}/posts/b"),
            "Post B",
            "Summary of B",
            "/images/b.png",
            "2025-02-10T08:45:00+09:00",
        ),
    )
    .await;

    let crawler = SitemapCrawler::new(fetcher(), &FetchConfig::default());
    let posts = crawler.fetch(&profile(&base, None)).await.unwrap();

    assert_eq!(posts.len(), 2);

    assert_eq!(posts[0].title, "Post A");
    assert_eq!(posts[0].canonical_url, format!("{base}/posts/a"));
    assert_eq!(posts[0].summary.as_deref(), Some("Summary of A"));
    assert_eq!(posts[0].author.as_deref(), Some("Tide Writer"));
    assert_eq!(posts[0].thumbnail_url, Some(format!("{base}/images/a.png")));
    assert_eq!(posts[0].published_at, parse_date_time("2025-01-01T09:30:00Z"));
    assert!(posts[0].tags.contains("rust"));

    assert_eq!(posts[1].title, "Post B");
    assert_eq!(posts[1].canonical_url, format!("{base}/posts/b"));
    assert_eq!(posts[1].summary.as_deref(), Some("Summary of B"));
    assert_eq!(posts[1].thumbnail_url, Some(format!("{base}/images/b.png")));
    assert_eq!(posts[1].published_at, parse_date_time("2025-02-10T08:45:00+09:00"));
}

#[tokio::test]
async fn test_self_referencing_sitemap_terminates() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/loop.xml",
        "application/xml",
        format!(
            r#"<sitemapindex>
  <sitemap><loc>{base}/loop.xml</loc></sitemap>
  <sitemap><loc>/loop.xml</loc></sitemap>
</sitemapindex>"#
        ),
    )
    .await;

    let crawler = SitemapCrawler::new(fetcher(), &FetchConfig::default());
    let urls = crawler
        .collect_post_urls(&format!("{base}/loop.xml"))
        .await;

    assert!(urls.is_empty());
}

#[tokio::test]
async fn test_failed_child_sitemap_is_skipped() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/sitemap.xml",
        "application/xml",
        format!(
            r#"<sitemapindex>
  <sitemap><loc>{base}/missing.xml</loc></sitemap>
  <sitemap><loc>{base}/broken.xml</loc></sitemap>
  <sitemap><loc>{base}/posts.xml</loc></sitemap>
</sitemapindex>"#
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/missing.xml"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    serve(
        &server,
        "/broken.xml",
        "application/xml",
        format!("<urlset><url><loc>{base}/posts/lost</url></urlset>"),
    )
    .await;
    serve(
        &server,
        "/posts.xml",
        "application/xml",
        "<urlset><url><loc>/posts/relative</loc></url></urlset>".to_string(),
    )
    .await;

    let crawler = SitemapCrawler::new(fetcher(), &FetchConfig::default());
    let urls = crawler
        .collect_post_urls(&format!("{base}/sitemap.xml"))
        .await;

    assert_eq!(
        urls.into_iter().collect::<Vec<_>>(),
        vec![format!("{base}/posts/relative")]
    );
}

#[tokio::test]
async fn test_post_url_cap_is_honored() {
    let server = MockServer::start().await;
    let base = server.uri();

    let entries: String = (0..10)
        .map(|i| format!("<url><loc>{base}/posts/{i}</loc></url>"))
        .collect();
    serve(
        &server,
        "/sitemap.xml",
        "application/xml",
        format!("<urlset>{entries}</urlset>"),
    )
    .await;

    let limits = FetchConfig {
        max_post_urls: 3,
        ..FetchConfig::default()
    };
    let crawler = SitemapCrawler::new(fetcher(), &limits);
    let urls = crawler
        .collect_post_urls(&format!("{base}/sitemap.xml"))
        .await;

    assert_eq!(urls.len(), 3);
    assert_eq!(urls.get_index(0), Some(&format!("{base}/posts/0")));
}

#[tokio::test]
async fn test_sitemap_file_cap_stops_the_walk() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/sitemap.xml",
        "application/xml",
        format!("<sitemapindex><sitemap><loc>{base}/level-2.xml</loc></sitemap></sitemapindex>"),
    )
    .await;
    serve(
        &server,
        "/level-2.xml",
        "application/xml",
        format!("<sitemapindex><sitemap><loc>{base}/level-3.xml</loc></sitemap></sitemapindex>"),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/level-3.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!("<urlset><url><loc>{base}/posts/deep</loc></url></urlset>")),
        )
        .expect(0)
        .mount(&server)
        .await;

    let limits = FetchConfig {
        max_sitemap_files: 2,
        ..FetchConfig::default()
    };
    let crawler = SitemapCrawler::new(fetcher(), &limits);
    let urls = crawler
        .collect_post_urls(&format!("{base}/sitemap.xml"))
        .await;

    assert!(urls.is_empty());
}

#[tokio::test]
async fn test_pages_without_title_are_dropped() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/sitemap.xml",
        "application/xml",
        format!("<urlset><url><loc>{base}/untitled</loc></url><url><loc>{base}/gone</loc></url></urlset>"),
    )
    .await;
    serve(
        &server,
        "/untitled",
        "text/html",
        "<html><head></head><body><p>no title here</p></body></html>".to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let crawler = SitemapCrawler::new(fetcher(), &FetchConfig::default());
    let posts = crawler.fetch(&profile(&base, None)).await.unwrap();

    assert!(posts.is_empty());
}

#[tokio::test]
async fn test_robots_sitemap_directive_is_discovered() {
    let server = MockServer::start().await;
    let base = server.uri();

    serve(
        &server,
        "/robots.txt",
        "text/plain",
        "User-agent: *\nDisallow: /admin\nSitemap: /dynamic-sitemap.xml\n".to_string(),
    )
    .await;

    let crawler = SitemapCrawler::new(fetcher(), &FetchConfig::default());
    let discovered = crawler.discover_sitemap(&base).await;

    assert_eq!(discovered, Some(format!("{base}/dynamic-sitemap.xml")));
}

#[tokio::test]
async fn test_missing_robots_discovers_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let crawler = SitemapCrawler::new(fetcher(), &FetchConfig::default());
    assert_eq!(crawler.discover_sitemap(&server.uri()).await, None);
}
