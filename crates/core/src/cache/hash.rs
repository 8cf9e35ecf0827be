//! Query normalization into stable cache keys.

use sha2::{Digest, Sha256};

/// Compute the cache key for a search query.
///
/// The query is trimmed and lowercased before hashing, so queries that differ
/// only in case or surrounding whitespace map to the same key. The key is
/// always 64 lowercase hex characters regardless of query length.
pub fn canonicalize_query(query: &str) -> String {
    let normalized = query.trim().to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        assert_eq!(canonicalize_query("golang concurrency"), canonicalize_query("golang concurrency"));
    }

    #[test]
    fn test_key_ignores_case_and_surrounding_whitespace() {
        let base = canonicalize_query("golang concurrency");
        assert_eq!(base, canonicalize_query("  Golang Concurrency\n"));
        assert_eq!(base, canonicalize_query("GOLANG CONCURRENCY"));
        assert_eq!(base, canonicalize_query("\tgolang concurrency  "));
    }

    #[test]
    fn test_key_keeps_inner_whitespace() {
        assert_ne!(canonicalize_query("golang concurrency"), canonicalize_query("golang  concurrency"));
    }

    #[test]
    fn test_different_queries_differ() {
        assert_ne!(canonicalize_query("rust async"), canonicalize_query("rust sync"));
    }

    #[test]
    fn test_key_format() {
        let short = canonicalize_query("a");
        let long = canonicalize_query(&"long query ".repeat(500));
        for key in [short, long] {
            assert_eq!(key.len(), 64);
            assert!(key.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_known_digest() {
        // sha256("hello")
        assert_eq!(
            canonicalize_query(" Hello "),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
