use crate::url::{is_http_absolute, non_blank};
use url::Url;

/// Resolves a possibly relative URL into an absolute `http`/`https` URL
///
/// # Resolution Steps
///
/// 1. Blank input resolves to nothing
/// 2. An absolute `http`/`https` URL is returned unchanged (trimmed)
/// 3. A protocol-relative URL (`//host/path`) takes the scheme of the first
///    `http`/`https` base, or `https` when no base qualifies
/// 4. Otherwise the first base that is itself absolute `http`/`https` and
///    joins the value successfully wins
///
/// # Arguments
///
/// * `raw` - The URL found in the document
/// * `bases` - Candidate base URLs, in priority order; blank entries are ignored
///
/// # Returns
///
/// * `Some(String)` - The absolute URL
/// * `None` - No candidate base could anchor the value
///
/// # Examples
///
/// ```
/// use feed_tide::url::resolve_absolute_url;
///
/// let url = resolve_absolute_url(Some("/img/a.png"), &[Some("https://blog.example.com/post/1")]);
/// assert_eq!(url.as_deref(), Some("https://blog.example.com/img/a.png"));
///
/// let url = resolve_absolute_url(Some("//cdn.example.com/a.png"), &[Some("http://blog.example.com")]);
/// assert_eq!(url.as_deref(), Some("http://cdn.example.com/a.png"));
/// ```
pub fn resolve_absolute_url(raw: Option<&str>, bases: &[Option<&str>]) -> Option<String> {
    let url = non_blank(raw)?;

    if is_http_absolute(url) {
        return Some(url.to_string());
    }

    if url.starts_with("//") {
        return Some(format!("{}:{}", base_scheme(bases), url));
    }

    bases
        .iter()
        .filter_map(|base| non_blank(*base))
        .filter_map(|base| Url::parse(base).ok())
        .filter(|base| matches!(base.scheme(), "http" | "https"))
        .find_map(|base| base.join(url).ok())
        .map(|joined| joined.to_string())
}

/// Scheme of the first `http`/`https` base, defaulting to `https`
fn base_scheme(bases: &[Option<&str>]) -> &'static str {
    for base in bases.iter().filter_map(|base| non_blank(*base)) {
        let Ok(parsed) = Url::parse(base) else {
            continue;
        };
        match parsed.scheme() {
            "http" => return "http",
            "https" => return "https",
            _ => continue,
        }
    }
    "https"
}

/// Joins a value against a single document URL
///
/// Used for sitemap `<loc>` entries and robots directives. Falls back to the
/// raw value when the document URL cannot anchor it.
pub fn resolve_against(base: &str, raw: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(raw))
        .map(|joined| joined.to_string())
        .unwrap_or_else(|_| raw.to_string())
}
