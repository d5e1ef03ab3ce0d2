//! Short stable fingerprints for correlating query log lines.

use sha2::{Digest, Sha256};

const FINGERPRINT_LEN: usize = 12;

/// Full SHA-256 of the query text, hex-encoded.
pub fn query_digest(query: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hex::encode(hasher.finalize())
}

/// First 12 hex characters of [`query_digest`].
pub fn query_fingerprint(query: &str) -> String {
    let mut digest = query_digest(query);
    digest.truncate(FINGERPRINT_LEN);
    digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_consistency() {
        let query = "query { getMetrics { metric_DTN } }";
        assert_eq!(query_fingerprint(query), query_fingerprint(query));
        assert_eq!(query_fingerprint(query).len(), 12);
        assert!(query_digest(query).starts_with(&query_fingerprint(query)));
    }

    #[test]
    fn test_different_queries_differ() {
        assert_ne!(
            query_fingerprint("query { a }"),
            query_fingerprint("query { b }")
        );
    }
}
