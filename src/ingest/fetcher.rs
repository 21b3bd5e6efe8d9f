//! HTTP fetching shared by every parser
//!
//! One client is built per process and cloned into the parsers. Every request
//! carries the identifying user agent and the configured language preference.

use crate::config::{FetchConfig, UserAgentConfig};
use crate::{Result, TideError};
use reqwest::header::ACCEPT_LANGUAGE;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Maximum redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// The connect timeout bounds connection setup. reqwest has no separate read
/// timeout, so the read timeout is applied on top of it as the total request
/// budget.
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `fetch` - Timeouts for every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use feed_tide::config::{FetchConfig, UserAgentConfig};
/// use feed_tide::ingest::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "FeedTide".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
///     contact_email: "admin@example.com".to_string(),
///     accept_language: "ko".to_string(),
/// };
///
/// let client = build_http_client(&config, &FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    fetch: &FetchConfig,
) -> std::result::Result<Client, reqwest::Error> {
    // Format: CrawlerName/Version (+ContactURL; ContactEmail)
    let user_agent = format!(
        "{}/{} (+{}; {})",
        user_agent.crawler_name,
        user_agent.crawler_version,
        user_agent.contact_url,
        user_agent.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(fetch.connect_timeout_secs))
        .timeout(Duration::from_secs(
            fetch.connect_timeout_secs + fetch.read_timeout_secs,
        ))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Text fetcher wrapping the shared client
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    accept_language: String,
}

impl Fetcher {
    /// Creates a fetcher from configuration
    pub fn new(user_agent: &UserAgentConfig, fetch: &FetchConfig) -> Result<Self> {
        let client = build_http_client(user_agent, fetch)?;
        Ok(Self::with_client(client, &user_agent.accept_language))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, accept_language: &str) -> Self {
        Self {
            client,
            accept_language: accept_language.to_string(),
        }
    }

    /// Fetches a URL and returns its body as text
    ///
    /// Redirects are followed. Any non-2xx final status is an error.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The decoded response body
    /// * `Err(TideError::Http)` - The request could not be completed
    /// * `Err(TideError::HttpStatus)` - The server answered with a non-success status
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT_LANGUAGE, self.accept_language.as_str())
            .send()
            .await
            .map_err(|source| TideError::Http {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(TideError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| TideError::Http {
            url: url.to_string(),
            source,
        })
    }
}
