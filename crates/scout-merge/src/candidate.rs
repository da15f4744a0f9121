use scout_common::TrustTier;
use scout_extract::ExtractedEntity;

/// One extracted record plus the connector metadata the merger's
/// tie-breaker cascade needs but which `ExtractedEntity` itself does not
/// carry (spec section 4.6: "trust_tier ... default_priority").
#[derive(Debug, Clone, Copy)]
pub struct MergeCandidate<'a> {
    pub record: &'a ExtractedEntity,
    pub trust_tier: TrustTier,
    pub default_priority: i32,
}

impl<'a> MergeCandidate<'a> {
    pub fn source(&self) -> &'a str {
        &self.record.source
    }

    /// The shared tail of every tie-break cascade: smaller `default_priority`
    /// wins, then lexicographically smallest `source_name` wins.
    pub fn tail_key(&self) -> (i64, std::cmp::Reverse<String>) {
        (-(self.default_priority as i64), std::cmp::Reverse(self.source().to_string()))
    }
}

/// Structural completeness of a JSON value: null loses to anything, then
/// longer strings/arrays beat shorter ones (spec section 4.6,
/// "completeness (non-null > longer > more elements)").
pub fn completeness_rank(value: &serde_json::Value) -> u32 {
    match value {
        serde_json::Value::Null => 0,
        serde_json::Value::String(s) => 1 + s.len() as u32,
        serde_json::Value::Array(items) => 1 + items.len() as u32,
        _ => 1,
    }
}
