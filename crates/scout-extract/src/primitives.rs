use std::collections::HashMap;

use scout_common::PrimitiveField;
use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, LegacyFieldWarning};

/// Schema primitives a Phase-A extractor may emit, using the exact field
/// names from spec section 4.5.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Primitives {
    pub entity_name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website_url: Option<String>,
}

/// Tells Phase A which raw JSON key on a given source carries each schema
/// primitive, and which raw keys should be copied into `external_ids`.
/// This is the "source-specific" half of the extractor: different
/// connectors name the same primitive differently, but the extraction
/// logic itself never branches on a source name — it only reads this map.
#[derive(Debug, Clone, Default)]
pub struct SourceFieldMap {
    pub primitive_fields: HashMap<PrimitiveField, String>,
    pub external_id_fields: Vec<String>,
}

impl SourceFieldMap {
    /// A map where every primitive's raw key is identical to its schema
    /// name — the common case for sources that already speak the schema.
    pub fn identity() -> Self {
        let mut primitive_fields = HashMap::new();
        for (field, name) in [
            (PrimitiveField::EntityName, "entity_name"),
            (PrimitiveField::Latitude, "latitude"),
            (PrimitiveField::Longitude, "longitude"),
            (PrimitiveField::StreetAddress, "street_address"),
            (PrimitiveField::City, "city"),
            (PrimitiveField::Postcode, "postcode"),
            (PrimitiveField::Country, "country"),
            (PrimitiveField::Phone, "phone"),
            (PrimitiveField::Email, "email"),
            (PrimitiveField::WebsiteUrl, "website_url"),
        ] {
            primitive_fields.insert(field, name.to_string());
        }
        Self {
            primitive_fields,
            external_id_fields: Vec::new(),
        }
    }
}

const LEGACY_PREFIXES: &[&str] = &["location_", "contact_", "address_"];

/// Result of Phase A primitive extraction: the typed primitives, the
/// passthrough bag of everything else, any external IDs the field map
/// designated, and legacy-name warnings (spec section 4.5).
pub struct PrimitiveExtraction {
    pub primitives: Primitives,
    pub raw_observations: serde_json::Map<String, serde_json::Value>,
    pub external_ids: HashMap<String, String>,
    pub legacy_warnings: Vec<LegacyFieldWarning>,
}

/// Reads primitives out of a flat raw payload according to `field_map`.
/// Everything not claimed by a mapped primitive or an external-id field is
/// passed through verbatim as `raw_observations`, available to Phase B.
///
/// Legacy `location_*`/`contact_*`/`address_*` field names are warnings by
/// default. When `strict_field_validation` is set (spec sections 4.5, 6),
/// their presence is a hard Phase-A failure instead: the record is
/// rejected wholesale rather than silently extracted around the legacy
/// names.
pub fn extract_primitives(
    source: &str,
    payload: &serde_json::Value,
    field_map: &SourceFieldMap,
    strict_field_validation: bool,
) -> Result<PrimitiveExtraction, ExtractError> {
    let object = payload.as_object().cloned().unwrap_or_default();
    let mut remaining = object.clone();

    let legacy_warnings: Vec<LegacyFieldWarning> = object
        .keys()
        .filter(|key| LEGACY_PREFIXES.iter().any(|prefix| key.starts_with(prefix)))
        .map(|key| LegacyFieldWarning {
            source: source.to_string(),
            field: key.clone(),
        })
        .collect();

    if strict_field_validation && !legacy_warnings.is_empty() {
        let fields: Vec<&str> = legacy_warnings.iter().map(|w| w.field.as_str()).collect();
        return Err(ExtractError(format!(
            "source {source} uses legacy field name(s) {} with STRICT_FIELD_VALIDATION on",
            fields.join(", ")
        )));
    }

    let mut primitives = Primitives::default();
    for (field, raw_key) in &field_map.primitive_fields {
        if let Some(value) = remaining.remove(raw_key) {
            assign_primitive(&mut primitives, *field, value);
        }
    }

    let mut external_ids = HashMap::new();
    for raw_key in &field_map.external_id_fields {
        if let Some(value) = remaining.get(raw_key) {
            if let Some(s) = value.as_str() {
                external_ids.insert(raw_key.clone(), s.to_string());
            }
        }
    }

    Ok(PrimitiveExtraction {
        primitives,
        raw_observations: remaining,
        external_ids,
        legacy_warnings,
    })
}

fn assign_primitive(primitives: &mut Primitives, field: PrimitiveField, value: serde_json::Value) {
    match field {
        PrimitiveField::EntityName => primitives.entity_name = value.as_str().map(String::from),
        PrimitiveField::Latitude => primitives.latitude = value.as_f64(),
        PrimitiveField::Longitude => primitives.longitude = value.as_f64(),
        PrimitiveField::StreetAddress => primitives.street_address = value.as_str().map(String::from),
        PrimitiveField::City => primitives.city = value.as_str().map(String::from),
        PrimitiveField::Postcode => primitives.postcode = value.as_str().map(String::from),
        PrimitiveField::Country => primitives.country = value.as_str().map(String::from),
        PrimitiveField::Phone => primitives.phone = value.as_str().map(String::from),
        PrimitiveField::Email => primitives.email = value.as_str().map(String::from),
        PrimitiveField::WebsiteUrl => primitives.website_url = value.as_str().map(String::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identity_map_extracts_matching_keys() {
        let payload = json!({"entity_name": "Powerleague Portobello", "latitude": 55.955, "raw_description": "4 courts"});
        let extraction = extract_primitives("google_places", &payload, &SourceFieldMap::identity(), false).unwrap();
        assert_eq!(extraction.primitives.entity_name.as_deref(), Some("Powerleague Portobello"));
        assert_eq!(extraction.primitives.latitude, Some(55.955));
        assert!(extraction.raw_observations.contains_key("raw_description"));
        assert!(!extraction.raw_observations.contains_key("entity_name"));
    }

    #[test]
    fn legacy_field_names_are_flagged_as_warnings_by_default() {
        let payload = json!({"location_lat": 55.9, "contact_phone": "0131 000 0000"});
        let extraction = extract_primitives("legacy_source", &payload, &SourceFieldMap::identity(), false).unwrap();
        assert_eq!(extraction.legacy_warnings.len(), 2);
    }

    #[test]
    fn legacy_field_names_are_a_hard_error_under_strict_validation() {
        let payload = json!({"location_lat": 55.9, "contact_phone": "0131 000 0000"});
        let err = extract_primitives("legacy_source", &payload, &SourceFieldMap::identity(), true).unwrap_err();
        assert!(err.0.contains("location_lat"));
        assert!(err.0.contains("contact_phone"));
    }

    #[test]
    fn strict_validation_does_not_reject_current_field_names() {
        let payload = json!({"entity_name": "Powerleague Portobello"});
        let extraction = extract_primitives("google_places", &payload, &SourceFieldMap::identity(), true).unwrap();
        assert_eq!(extraction.primitives.entity_name.as_deref(), Some("Powerleague Portobello"));
    }

    #[test]
    fn external_id_fields_are_copied_out() {
        let mut field_map = SourceFieldMap::identity();
        field_map.external_id_fields.push("google_place_id".to_string());
        let payload = json!({"google_place_id": "ChIJ123"});
        let extraction = extract_primitives("google_places", &payload, &field_map, false).unwrap();
        assert_eq!(extraction.external_ids.get("google_place_id"), Some(&"ChIJ123".to_string()));
    }
}
