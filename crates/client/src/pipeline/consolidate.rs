//! Merge per-page results into one document.

use crate::fetch::FetchResult;

/// Visible separator placed between page sections.
pub const SECTION_DIVIDER: &str = "\n\n---\n\n";

const SECTION_HEADER: &str = "## ";

/// Join the successful, non-blank results into `## <url>\n\n<text>` sections.
///
/// Returns the document and the number of sections. Zero sections yields an
/// empty document.
pub fn consolidate(results: &[FetchResult]) -> (String, usize) {
    let sections: Vec<String> = results
        .iter()
        .filter(|r| r.is_success())
        .filter_map(|r| {
            let text = r.text.trim();
            (!text.is_empty()).then(|| format!("{SECTION_HEADER}{}\n\n{}", r.source_url, text))
        })
        .collect();

    (sections.join(SECTION_DIVIDER), sections.len())
}

/// Recover the section count from a stored document.
///
/// Over-counts when page text itself contains the divider followed by a
/// header, so only used for rows stored without a count.
pub fn count_sections(document: &str) -> usize {
    if document.is_empty() {
        return 0;
    }
    document.split(SECTION_DIVIDER).filter(|part| part.starts_with(SECTION_HEADER)).count()
}
