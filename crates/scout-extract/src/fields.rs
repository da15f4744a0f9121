use std::str::FromStr;

use scout_common::PrimitiveField;
use serde_json::Value;

use crate::primitives::Primitives;

/// Resolves a rule's `source_fields` entry against either a schema
/// primitive (by name) or a raw observation key, returning the raw JSON
/// value. Mapping and field rules both read through this so neither cares
/// whether a field came from Phase A's typed primitives or the passthrough
/// bag.
pub fn field_value(
    field: &str,
    primitives: &Primitives,
    raw_observations: &serde_json::Map<String, Value>,
) -> Option<Value> {
    if let Ok(primitive) = PrimitiveField::from_str(field) {
        return primitive_value(primitives, primitive);
    }
    raw_observations.get(field).cloned()
}

/// Same resolution as [`field_value`] but coerced to text, for regex and
/// template based extractors.
pub fn field_text(
    field: &str,
    primitives: &Primitives,
    raw_observations: &serde_json::Map<String, Value>,
) -> Option<String> {
    field_value(field, primitives, raw_observations).as_ref().and_then(value_to_text)
}

fn primitive_value(primitives: &Primitives, field: PrimitiveField) -> Option<Value> {
    match field {
        PrimitiveField::EntityName => primitives.entity_name.clone().map(Value::String),
        PrimitiveField::Latitude => primitives.latitude.map(|v| serde_json::json!(v)),
        PrimitiveField::Longitude => primitives.longitude.map(|v| serde_json::json!(v)),
        PrimitiveField::StreetAddress => primitives.street_address.clone().map(Value::String),
        PrimitiveField::City => primitives.city.clone().map(Value::String),
        PrimitiveField::Postcode => primitives.postcode.clone().map(Value::String),
        PrimitiveField::Country => primitives.country.clone().map(Value::String),
        PrimitiveField::Phone => primitives.phone.clone().map(Value::String),
        PrimitiveField::Email => primitives.email.clone().map(Value::String),
        PrimitiveField::WebsiteUrl => primitives.website_url.clone().map(Value::String),
    }
}

pub fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
