use std::collections::HashMap;

use scout_extract::SourceFieldMap;

/// Which raw JSON key on each connector carries each schema primitive
/// (spec section 4.5). An external collaborator registers these at
/// bootstrap alongside the connector registry; a connector with no
/// registered map falls back to [`SourceFieldMap::identity`] so Phase A
/// never refuses to run against an unmapped source, it just assumes the
/// source already speaks the schema.
#[derive(Default)]
pub struct ExtractorRegistry(HashMap<String, SourceFieldMap>);

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connector: impl Into<String>, field_map: SourceFieldMap) {
        self.0.insert(connector.into(), field_map);
    }

    pub fn get(&self, connector: &str) -> SourceFieldMap {
        self.0.get(connector).cloned().unwrap_or_else(|| {
            tracing::debug!(connector, "no field map registered; falling back to identity mapping");
            SourceFieldMap::identity()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_connector_falls_back_to_identity() {
        let registry = ExtractorRegistry::new();
        let map = registry.get("unknown_source");
        assert_eq!(map.primitive_fields, SourceFieldMap::identity().primitive_fields);
    }

    #[test]
    fn registered_connector_returns_its_own_map() {
        let mut registry = ExtractorRegistry::new();
        let mut custom = SourceFieldMap::default();
        custom.external_id_fields.push("google_place_id".to_string());
        registry.register("google_places", custom);

        let map = registry.get("google_places");
        assert_eq!(map.external_id_fields, vec!["google_place_id".to_string()]);
    }
}
