//! DuckDuckGo HTML result page scraping.

use gleaner_core::Error;
use scraper::Html;
use url::Url;

use super::{SearchHit, element_text, selector, with_query};

pub fn search_url(base: &str, query: &str) -> Result<Url, Error> {
    with_query(base, "/html/", &[("q", query.to_string())])
}

pub fn parse_results(html: &str, count: usize) -> Result<Vec<SearchHit>, Error> {
    let document = Html::parse_document(html);
    let results = selector("a.result__a")?;

    let hits = document
        .select(&results)
        .filter_map(|link| {
            let href = link.value().attr("href").filter(|h| !h.is_empty())?;
            Some(SearchHit { url: unwrap_redirect(href), title: element_text(&link) })
        })
        .take(count)
        .collect();

    Ok(hits)
}

/// Resolve `duckduckgo.com/l/?uddg=<target>` redirect links to their target.
///
/// Links without a usable `uddg` parameter are returned unchanged.
fn unwrap_redirect(href: &str) -> String {
    if !href.contains("duckduckgo.com/l/?") {
        return href.to_string();
    }

    Url::parse("https://duckduckgo.com")
        .and_then(|base| base.join(href))
        .ok()
        .and_then(|u| u.query_pairs().find(|(k, _)| k == "uddg").map(|(_, v)| v.into_owned()))
        .filter(|target| !target.is_empty())
        .unwrap_or_else(|| href.to_string())
}
