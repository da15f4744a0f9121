use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One raw payload fetched from a source (spec section 3). Persisted
/// as-is for audit/replay; `scout-store`'s unique index on `sha256`
/// absorbs duplicate content without the adapter needing to know about
/// persistence at all (spec section 9, "replace exception-driven dedup
/// with an existence check on the content-hash unique index").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawIngestion {
    pub source: String,
    pub fetched_at: DateTime<Utc>,
    pub url: String,
    pub payload_blob: serde_json::Value,
    pub sha256: String,
}

impl RawIngestion {
    pub fn new(source: impl Into<String>, url: impl Into<String>, payload_blob: serde_json::Value) -> Self {
        let sha256 = hash_payload(&payload_blob);
        Self {
            source: source.into(),
            fetched_at: Utc::now(),
            url: url.into(),
            payload_blob,
            sha256,
        }
    }
}

/// Canonical content hash. `serde_json`'s default `Map` is `BTreeMap`-backed
/// (no crate in this workspace enables the `preserve_order` feature), so
/// `to_string` already yields lexicographically sorted object keys at
/// every nesting level — semantically identical payloads with
/// differently-ordered source keys hash identically for free.
pub fn hash_payload(payload: &serde_json::Value) -> String {
    let canonical_json = serde_json::to_string(payload).expect("serde_json::Value always serializes");
    let mut hasher = Sha256::new();
    hasher.update(canonical_json.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn key_order_does_not_affect_hash() {
        let a = json!({"name": "x", "lat": 1.0});
        let b = json!({"lat": 1.0, "name": "x"});
        assert_eq!(hash_payload(&a), hash_payload(&b));
    }

    #[test]
    fn different_content_hashes_differently() {
        let a = json!({"name": "x"});
        let b = json!({"name": "y"});
        assert_ne!(hash_payload(&a), hash_payload(&b));
    }
}
