//! Google result page scraping.

use gleaner_core::Error;
use scraper::Html;
use url::Url;

use super::{SearchHit, element_text, selector, with_query};

/// Anchor text longer than this is not treated as a result title.
const MAX_FALLBACK_TITLE: usize = 200;

pub fn search_url(base: &str, query: &str, count: usize) -> Result<Url, Error> {
    with_query(base, "/search", &[("q", query.to_string()), ("num", count.to_string())])
}

/// Parse organic results, falling back to bare anchors when no `div.g` block matches.
pub fn parse_results(html: &str, count: usize) -> Result<Vec<SearchHit>, Error> {
    let document = Html::parse_document(html);
    let blocks = selector("div.g")?;
    let anchors = selector("a")?;
    let headings = selector("h3")?;

    let mut hits = Vec::new();

    for block in document.select(&blocks) {
        if hits.len() >= count {
            break;
        }
        let Some(link) = block.select(&anchors).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or_default();
        if href.is_empty() || href.starts_with('/') || href.contains("google.com") {
            continue;
        }

        let title = match block.select(&headings).next().map(|h| element_text(&h)) {
            Some(t) if !t.is_empty() => t,
            _ => element_text(&link),
        };
        hits.push(SearchHit { url: href.to_string(), title });
    }

    if !hits.is_empty() {
        return Ok(hits);
    }

    tracing::debug!("no div.g results, falling back to anchors");

    for link in document.select(&anchors) {
        if hits.len() >= count {
            break;
        }
        let Some(href) = link.value().attr("href").and_then(unwrap_redirect) else {
            continue;
        };
        if !href.starts_with("http") || href.contains("google.com") || href.contains("youtube.com") {
            continue;
        }

        let title = element_text(&link);
        if title.is_empty() || title.chars().count() > MAX_FALLBACK_TITLE {
            continue;
        }
        hits.push(SearchHit { url: href, title });
    }

    Ok(hits)
}

/// Resolve `/url?q=<target>&sa=..` redirect links to their target.
fn unwrap_redirect(href: &str) -> Option<String> {
    if !href.starts_with("/url?") {
        return (!href.is_empty()).then(|| href.to_string());
    }
    let parsed = Url::parse("https://www.google.com").ok()?.join(href).ok()?;
    parsed.query_pairs().find(|(k, _)| k == "q").map(|(_, v)| v.into_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const FIXTURE: &str = r#"
        <html><body>
            <div class="g">
                <a href="https://rust-lang.github.io/async-book/"><h3>Asynchronous Programming in Rust</h3></a>
            </div>
            <div class="g">
                <a href="/search?q=related">Related searches</a>
            </div>
            <div class="g">
                <a href="https://maps.google.com/place">Map</a>
            </div>
            <div class="g">
                <a href="https://tokio.rs/tokio/tutorial">Tokio tutorial</a>
            </div>
        </body></html>
    "#;

    const FALLBACK: &str = r#"
        <html><body>
            <a href="/url?q=https://example.com/one&amp;sa=U">First result</a>
            <a href="/url?q=https://www.youtube.com/watch%3Fv%3D1&amp;sa=U">Video</a>
            <a href="https://accounts.google.com/">Sign in</a>
            <a href="/preferences">Settings</a>
            <a href="https://example.com/empty"></a>
            <a href="https://example.com/two">Second result</a>
        </body></html>
    "#;

    #[test]
    fn test_search_url() {
        let url = search_url("https://www.google.com", "golang concurrency", 5).unwrap();
        assert_eq!(url.as_str(), "https://www.google.com/search?q=golang+concurrency&num=5");
    }

    #[test]
    fn test_parse_organic_results() {
        let hits = parse_results(FIXTURE, 10).unwrap();

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://rust-lang.github.io/async-book/");
        assert_eq!(hits[0].title, "Asynchronous Programming in Rust");
        assert_eq!(hits[1].url, "https://tokio.rs/tokio/tutorial");
        assert_eq!(hits[1].title, "Tokio tutorial");
    }

    #[test]
    fn test_parse_respects_count() {
        let hits = parse_results(FIXTURE, 1).unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_parse_fallback_anchors() {
        let hits = parse_results(FALLBACK, 10).unwrap();

        let urls: Vec<&str> = hits.iter().map(|h| h.url.as_str()).collect();
        assert_eq!(urls, vec!["https://example.com/one", "https://example.com/two"]);
        assert_eq!(hits[0].title, "First result");
    }

    #[test]
    fn test_fallback_skips_long_titles() {
        let html = format!(r#"<a href="https://example.com/long">{}</a>"#, "t".repeat(201));
        assert!(parse_results(&html, 5).unwrap().is_empty());
    }

    #[test]
    fn test_unwrap_redirect() {
        assert_eq!(unwrap_redirect("/url?q=https://a.example/&sa=U").as_deref(), Some("https://a.example/"));
        assert_eq!(unwrap_redirect("/url?sa=U"), None);
        assert_eq!(unwrap_redirect("https://b.example/").as_deref(), Some("https://b.example/"));
        assert_eq!(unwrap_redirect(""), None);
    }
}
