use sha2::{Digest, Sha256};

use crate::contract::LensContract;

/// `lens_hash = SHA-256(canonical JSON)` (spec section 3). `serde_json`'s
/// default `Map` is backed by a `BTreeMap` (the `preserve_order` feature
/// is not enabled anywhere in this workspace), so `to_string` already
/// produces lexicographically sorted object keys at every nesting level
/// — exactly the canonical form the hash needs, with no extra work.
pub fn lens_hash(lens: &LensContract) -> String {
    let canonical_json = serde_json::to_string(lens).expect("LensContract is always serializable");
    let mut hasher = Sha256::new();
    hasher.update(canonical_json.as_bytes());
    hex::encode(hasher.finalize())
}
