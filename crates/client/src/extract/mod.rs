//! Readable text extraction for fetched pages using Lectito.
//!
//! ### Primary Algorithm
//! - Uses Lectito's extraction pipeline (Readability.js-inspired).
//! - Preprocessing, scoring, best-candidate selection, and cleanup.
//!
//! ### Stable Abstraction
//! - The page fetcher only sees the [`Extractor`] trait, so tests and other
//!   engines can stand in for Lectito.
//!
//! ### Output Normalization
//! - Trailing whitespace is stripped from every line.
//! - Runs of blank lines collapse to a single blank line.

use lectito_core::{Document, ExtractConfig as LectitoConfig};
use gleaner_core::Error;
use url::Url;

/// Configuration for content extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Minimum character count for content (default: 200)
    pub char_threshold: Option<usize>,

    /// Maximum number of top candidates to consider (default: 5)
    pub max_top_candidates: Option<usize>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self { char_threshold: Some(200), max_top_candidates: Some(5) }
    }
}

impl ExtractConfig {
    /// Convert to Lectito's config type.
    fn to_lectito_config(&self) -> LectitoConfig {
        let mut cfg = LectitoConfig::default();
        if let Some(threshold) = self.char_threshold {
            cfg.char_threshold = threshold;
        }
        if let Some(max) = self.max_top_candidates {
            cfg.max_top_candidates = max;
        }
        cfg
    }
}

/// Turns a raw fetched document into readable text.
pub trait Extractor: Send + Sync {
    /// Extract the readable text of `raw`, fetched from `source`.
    ///
    /// Blank output is allowed; the consolidator drops it.
    fn extract(&self, raw: &[u8], source: &Url) -> Result<String, Error>;
}

/// Lectito-based extractor producing Markdown text.
#[derive(Debug, Clone, Default)]
pub struct ReadableExtractor {
    config: ExtractConfig,
}

impl ReadableExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }
}

impl Extractor for ReadableExtractor {
    fn extract(&self, raw: &[u8], source: &Url) -> Result<String, Error> {
        let html = String::from_utf8_lossy(raw);

        let doc = Document::parse(&html).map_err(|e| Error::ExtractFailed(format!("failed to parse HTML: {}", e)))?;

        let extracted = lectito_core::extract_content(&doc, &self.config.to_lectito_config())
            .map_err(|e| Error::ExtractFailed(format!("extraction failed for {}: {}", source, e)))?;

        let metadata = doc.extract_metadata();

        let markdown = lectito_core::convert_to_markdown(&extracted.content, &metadata, &Default::default())
            .map_err(|e| Error::ExtractFailed(format!("markdown conversion failed: {}", e)))?;

        Ok(normalize_text(&markdown))
    }
}

/// Strip trailing whitespace and collapse blank-line runs.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLE_HTML: &str = r#"
        <!DOCTYPE html>
        <html>
        <head><title>Goroutines Explained</title></head>
        <body>
            <nav><a href="/">Home</a></nav>
            <article>
                <h1>Goroutines Explained</h1>
                <p>This is a substantial paragraph with plenty of content to ensure we meet
                the character threshold for extraction. Goroutines are lightweight threads
                managed by the runtime and scheduled onto operating system threads.</p>
                <p>Here is another paragraph with even more content to ensure that the
                extraction will succeed. Channels let goroutines communicate without sharing
                memory, and select waits on several channel operations at once.</p>
                <p>A third paragraph providing additional content that helps ensure the
                document is substantial enough for successful extraction. The readability
                algorithm requires a minimum amount of content to identify the main article.</p>
            </article>
        </body>
        </html>
    "#;

    fn source() -> Url {
        Url::parse("https://example.com/goroutines").unwrap()
    }

    #[test]
    fn test_extract_config_default() {
        let config = ExtractConfig::default();
        assert_eq!(config.char_threshold, Some(200));
        assert_eq!(config.max_top_candidates, Some(5));
    }

    #[test]
    fn test_extract_custom_config() {
        let config = ExtractConfig { char_threshold: Some(100), max_top_candidates: Some(3) };
        let lectito_cfg = config.to_lectito_config();
        assert_eq!(lectito_cfg.char_threshold, 100);
        assert_eq!(lectito_cfg.max_top_candidates, 3);
    }

    #[test]
    fn test_extract_article_text() {
        let text = ReadableExtractor::default().extract(ARTICLE_HTML.as_bytes(), &source()).unwrap();

        assert!(text.contains("Channels let goroutines communicate"));
        assert!(!text.contains("\n\n\n"));
        assert_eq!(text, text.trim());
    }

    #[test]
    fn test_extract_tolerates_invalid_utf8() {
        let mut raw = ARTICLE_HTML.as_bytes().to_vec();
        raw.insert(raw.len() / 2, 0xff);
        assert!(ReadableExtractor::default().extract(&raw, &source()).is_ok());
    }

    #[test]
    fn test_extract_empty_html() {
        let result = ReadableExtractor::default().extract(b"", &source());
        assert!(matches!(result, Err(Error::ExtractFailed(_))));
    }

    #[test]
    fn test_extract_invalid_html() {
        let result = ReadableExtractor::default().extract(b"not really html", &source());
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("  # Title  \n\n\n\nbody   \n\n"), "# Title\n\nbody");
        assert_eq!(normalize_text("   \n \n"), "");
    }
}
