//! Shared fixtures

use feed_tide::config::{FetchConfig, UserAgentConfig};
use feed_tide::ingest::Fetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn user_agent() -> UserAgentConfig {
    UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
        accept_language: "ko".to_string(),
    }
}

pub fn fetcher() -> Fetcher {
    Fetcher::new(&user_agent(), &FetchConfig::default()).expect("Failed to build fetcher")
}

/// Serves `body` at `route` with the given content type
pub async fn serve(server: &MockServer, route: &str, content_type: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", content_type),
        )
        .mount(server)
        .await;
}

/// A post page carrying Open Graph metadata
pub fn post_page(canonical: &str, title: &str, description: &str, image: &str, published: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html><head>
<title>fallback title</title>
<link rel="canonical" href="{canonical}">
<meta property="og:title" content="{title}">
<meta property="og:description" content="{description}">
<meta property="og:image" content="{image}">
<meta property="article:published_time" content="{published}">
<meta name="author" content="Tide Writer">
<meta property="article:tag" content="rust">
<meta property="article:tag" content="backend">
</head><body><article><h1>{title}</h1><p>body</p></article></body></html>"#
    )
}
