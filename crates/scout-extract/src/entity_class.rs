use scout_common::EntityClass;

use crate::primitives::Primitives;

/// Structural inference of `entity_class` from Phase-A primitives and raw
/// observations (spec section 4.5). Looks only at shape — never at lens
/// vocabulary — so this function is identical for every vertical.
///
/// Order matters: coordinates outrank a start-datetime flag (a dated event
/// at a fixed venue is still meaningfully a place for downstream merge
/// purposes isn't claimed by the spec either way, so we follow its listed
/// precedence literally), which outranks the individual flag.
pub fn infer_entity_class(primitives: &Primitives, raw_observations: &serde_json::Map<String, serde_json::Value>) -> EntityClass {
    if primitives.latitude.is_some() && primitives.longitude.is_some() {
        return EntityClass::Place;
    }

    if has_truthy_or_present(raw_observations, "start_datetime") {
        return EntityClass::Event;
    }

    if is_flag_set(raw_observations, "is_individual") || is_flag_set(raw_observations, "individual") {
        return EntityClass::Person;
    }

    if is_flag_set(raw_observations, "is_organization") || is_flag_set(raw_observations, "organization") {
        return EntityClass::Organization;
    }

    EntityClass::Thing
}

fn has_truthy_or_present(raw: &serde_json::Map<String, serde_json::Value>, key: &str) -> bool {
    match raw.get(key) {
        Some(serde_json::Value::Null) | None => false,
        Some(serde_json::Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn is_flag_set(raw: &serde_json::Map<String, serde_json::Value>, key: &str) -> bool {
    matches!(raw.get(key), Some(serde_json::Value::Bool(true)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn primitives_with_coords() -> Primitives {
        let mut p = Primitives::default();
        p.latitude = Some(55.95);
        p.longitude = Some(-3.19);
        p
    }

    #[test]
    fn coordinates_infer_place() {
        let class = infer_entity_class(&primitives_with_coords(), &serde_json::Map::new());
        assert_eq!(class, EntityClass::Place);
    }

    #[test]
    fn start_datetime_infers_event_absent_coordinates() {
        let raw = json!({"start_datetime": "2026-08-01T10:00:00Z"}).as_object().unwrap().clone();
        let class = infer_entity_class(&Primitives::default(), &raw);
        assert_eq!(class, EntityClass::Event);
    }

    #[test]
    fn individual_flag_infers_person() {
        let raw = json!({"is_individual": true}).as_object().unwrap().clone();
        let class = infer_entity_class(&Primitives::default(), &raw);
        assert_eq!(class, EntityClass::Person);
    }

    #[test]
    fn no_signal_falls_back_to_thing() {
        let class = infer_entity_class(&Primitives::default(), &serde_json::Map::new());
        assert_eq!(class, EntityClass::Thing);
    }

    #[test]
    fn organization_flag_wins_over_default() {
        let raw = json!({"is_organization": true}).as_object().unwrap().clone();
        let class = infer_entity_class(&Primitives::default(), &raw);
        assert_eq!(class, EntityClass::Organization);
    }
}
