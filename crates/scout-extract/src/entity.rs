use std::collections::HashMap;

use scout_common::{Dimension, EntityClass};
use serde::{Deserialize, Serialize};

use crate::primitives::Primitives;

/// One extracted record after Phase A + Phase B (spec section 3). Emitted
/// once per raw payload; the deduplicator groups these across sources,
/// the merger collapses each group into a single [final `Entity`].
///
/// [final `Entity`]: https://docs.rs/scout-merge (crate boundary; see
/// `scout_merge::entity::Entity`)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedEntity {
    pub source: String,
    pub raw_ingestion_ref: String,
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
}

impl ExtractedEntity {
    pub fn new(
        source: impl Into<String>,
        raw_ingestion_ref: impl Into<String>,
        entity_class: EntityClass,
        primitives: Primitives,
        raw_observations: serde_json::Map<String, serde_json::Value>,
        external_ids: HashMap<String, String>,
    ) -> Self {
        Self {
            source: source.into(),
            raw_ingestion_ref: raw_ingestion_ref.into(),
            entity_class,
            primitives,
            canonical_activities: Vec::new(),
            canonical_roles: Vec::new(),
            canonical_place_types: Vec::new(),
            canonical_access: Vec::new(),
            modules: HashMap::new(),
            external_ids,
            confidence_by_field: HashMap::new(),
            raw_observations,
        }
    }

    /// Mutable access to one of the four fixed dimension arrays, keyed by
    /// the closed `Dimension` enum rather than a flattenable field name
    /// (spec section 3, invariant: "`modules.*` is always namespaced").
    pub fn dimension_mut(&mut self, dimension: Dimension) -> &mut Vec<String> {
        match dimension {
            Dimension::CanonicalActivities => &mut self.canonical_activities,
            Dimension::CanonicalRoles => &mut self.canonical_roles,
            Dimension::CanonicalPlaceTypes => &mut self.canonical_place_types,
            Dimension::CanonicalAccess => &mut self.canonical_access,
        }
    }

    pub fn dimension(&self, dimension: Dimension) -> &[String] {
        match dimension {
            Dimension::CanonicalActivities => &self.canonical_activities,
            Dimension::CanonicalRoles => &self.canonical_roles,
            Dimension::CanonicalPlaceTypes => &self.canonical_place_types,
            Dimension::CanonicalAccess => &self.canonical_access,
        }
    }

    /// Adds `value` to `dimension` if absent (spec section 4.5: "duplicates
    /// ignored"). Call [`Self::finalize_dimensions`] once after every
    /// mapping rule has run to sort and re-dedupe (testable property 3).
    pub fn add_to_dimension(&mut self, dimension: Dimension, value: &str) {
        let arr = self.dimension_mut(dimension);
        if !arr.iter().any(|v| v == value) {
            arr.push(value.to_string());
        }
    }

    /// Dedupe + lexicographic sort every dimension array (spec section
    /// 4.5: "Arrays are finalised via dedupe + lexicographic sort").
    pub fn finalize_dimensions(&mut self) {
        for dimension in Dimension::ALL {
            let arr = self.dimension_mut(dimension);
            arr.sort();
            arr.dedup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> ExtractedEntity {
        ExtractedEntity::new(
            "google_places",
            "deadbeef",
            EntityClass::Place,
            Primitives::default(),
            serde_json::Map::new(),
            HashMap::new(),
        )
    }

    #[test]
    fn add_to_dimension_ignores_duplicates() {
        let mut e = entity();
        e.add_to_dimension(Dimension::CanonicalActivities, "padel");
        e.add_to_dimension(Dimension::CanonicalActivities, "padel");
        assert_eq!(e.canonical_activities, vec!["padel".to_string()]);
    }

    #[test]
    fn finalize_dimensions_sorts_and_dedupes() {
        let mut e = entity();
        e.add_to_dimension(Dimension::CanonicalActivities, "tennis");
        e.add_to_dimension(Dimension::CanonicalActivities, "padel");
        e.add_to_dimension(Dimension::CanonicalActivities, "padel");
        e.finalize_dimensions();
        assert_eq!(e.canonical_activities, vec!["padel".to_string(), "tennis".to_string()]);
    }
}
