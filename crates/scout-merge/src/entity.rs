use std::collections::HashMap;

use chrono::{DateTime, Utc};
use scout_common::{EntityClass, TrustTier};
use scout_extract::Primitives;
use serde::{Deserialize, Serialize};

/// The source that won a single field, and the trust tier it won with
/// (spec section 3: "`source_info` maps every populated final field to
/// the exact source that won").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub source: String,
    pub trust_tier: TrustTier,
}

/// The final, persisted shape: every `ExtractedEntity` field plus merge
/// provenance (spec section 3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub slug: String,
    pub entity_class: EntityClass,
    pub primitives: Primitives,
    pub canonical_activities: Vec<String>,
    pub canonical_roles: Vec<String>,
    pub canonical_place_types: Vec<String>,
    pub canonical_access: Vec<String>,
    pub modules: HashMap<String, serde_json::Value>,
    pub external_ids: HashMap<String, String>,
    pub confidence_by_field: HashMap<String, f32>,
    pub raw_observations: serde_json::Map<String, serde_json::Value>,
    pub source_info: HashMap<String, SourceInfo>,
    pub discovered_by: Vec<String>,
    pub updated_at: DateTime<Utc>,
}
