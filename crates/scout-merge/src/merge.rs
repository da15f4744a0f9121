use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use scout_common::{quality, Dimension, EntityClass};
use scout_extract::{ExtractedEntity, Primitives};
use serde_json::Value;

use crate::candidate::{completeness_rank, MergeCandidate};
use crate::entity::{Entity, SourceInfo};
use crate::finalize::generate_slug;

/// Produces the final `Entity` for one dedup group (spec section 4.6).
/// `locality` picks the token appended to the slug; pass the winning
/// `city`, if any.
pub fn merge_group(candidates: &[MergeCandidate], updated_at: DateTime<Utc>) -> Entity {
    let mut primitives = Primitives::default();
    let mut source_info = HashMap::new();

    macro_rules! merge_identity {
        ($field:ident) => {
            if let Some((value, source)) = pick_identity(candidates, |r| r.primitives.$field.clone()) {
                source_info.insert(stringify!($field).to_string(), source_info_for(candidates, source));
                primitives.$field = Some(value);
            }
        };
    }

    merge_identity!(entity_name);
    merge_identity!(street_address);
    merge_identity!(city);
    merge_identity!(postcode);
    merge_identity!(country);

    if let Some(((lat, lng), source)) = pick_geo(candidates) {
        let info = source_info_for(candidates, source);
        source_info.insert("latitude".to_string(), info.clone());
        source_info.insert("longitude".to_string(), info);
        primitives.latitude = Some(lat);
        primitives.longitude = Some(lng);
    }

    if let Some((value, source)) = pick_phone(candidates) {
        source_info.insert("phone".to_string(), source_info_for(candidates, source));
        primitives.phone = Some(value);
    }
    if let Some((value, source)) = pick_email(candidates) {
        source_info.insert("email".to_string(), source_info_for(candidates, source));
        primitives.email = Some(value);
    }
    if let Some((value, source)) = pick_website_url(candidates) {
        source_info.insert("website_url".to_string(), source_info_for(candidates, source));
        primitives.website_url = Some(value);
    }

    let entity_class = pick_entity_class(candidates);

    let canonical_activities = merge_dimension(candidates, Dimension::CanonicalActivities);
    let canonical_roles = merge_dimension(candidates, Dimension::CanonicalRoles);
    let canonical_place_types = merge_dimension(candidates, Dimension::CanonicalPlaceTypes);
    let canonical_access = merge_dimension(candidates, Dimension::CanonicalAccess);

    let modules = merge_modules(candidates);
    let external_ids = merge_external_ids(candidates);
    let raw_observations = merge_raw_observations(candidates);
    let confidence_by_field = merge_confidence(candidates);

    let mut discovered_by: Vec<String> = candidates.iter().map(|c| c.source().to_string()).collect();
    discovered_by.sort();
    discovered_by.dedup();

    let locality = primitives.city.clone();
    let slug = generate_slug(primitives.entity_name.as_deref().unwrap_or("unknown"), locality.as_deref());

    Entity {
        slug,
        entity_class,
        primitives,
        canonical_activities,
        canonical_roles,
        canonical_place_types,
        canonical_access,
        modules,
        external_ids,
        confidence_by_field,
        raw_observations,
        source_info,
        discovered_by,
        updated_at,
    }
}

fn source_info_for(candidates: &[MergeCandidate], source: &str) -> SourceInfo {
    let trust_tier = candidates
        .iter()
        .find(|c| c.source() == source)
        .map(|c| c.trust_tier)
        .expect("winning source is always one of the candidates");
    SourceInfo { source: source.to_string(), trust_tier }
}

/// Identity/display field strategy: prefer non-null, then the shared tail
/// of the tie-break cascade (trust, completeness, priority, source name).
fn pick_identity<'a>(
    candidates: &'a [MergeCandidate<'a>],
    value_of: impl Fn(&ExtractedEntity) -> Option<String>,
) -> Option<(String, &'a str)> {
    candidates
        .iter()
        .filter_map(|c| value_of(c.record).map(|v| (c, v)))
        .max_by_key(|(c, v)| (c.trust_tier.rank(), completeness_rank(&Value::String(v.clone())), c.tail_key()))
        .map(|(c, v)| (v, c.source()))
}

/// Geo primitive strategy: highest trust, tie-broken by decimal precision.
/// Coordinates are never averaged across sources.
fn pick_geo<'a>(candidates: &'a [MergeCandidate<'a>]) -> Option<((f64, f64), &'a str)> {
    candidates
        .iter()
        .filter_map(|c| {
            let p = &c.record.primitives;
            Some((c, p.latitude?, p.longitude?))
        })
        .max_by_key(|(c, lat, lng)| {
            let precision = decimal_places(*lat).max(decimal_places(*lng));
            (c.trust_tier.rank(), precision, c.tail_key())
        })
        .map(|(c, lat, lng)| ((lat, lng), c.source()))
}

fn decimal_places(value: f64) -> u32 {
    value.to_string().split_once('.').map(|(_, frac)| frac.len() as u32).unwrap_or(0)
}

/// Contact field strategy: structural quality first, then the general
/// cascade tail (spec section 4.6 deliberately reorders this group ahead
/// of trust_tier, since a connector's trust ranking is a weaker signal of
/// a phone/email/URL's well-formedness than the value itself).
fn pick_phone<'a>(candidates: &'a [MergeCandidate<'a>]) -> Option<(String, &'a str)> {
    candidates
        .iter()
        .filter_map(|c| c.record.primitives.phone.clone().map(|v| (c, v)))
        .max_by_key(|(c, v)| (quality::phone_quality(v), c.trust_tier.rank(), c.tail_key()))
        .map(|(c, v)| (v, c.source()))
}

fn pick_email<'a>(candidates: &'a [MergeCandidate<'a>]) -> Option<(String, &'a str)> {
    candidates
        .iter()
        .filter_map(|c| c.record.primitives.email.clone().map(|v| (c, v)))
        .max_by_key(|(c, v)| (quality::email_quality(v), c.trust_tier.rank(), c.tail_key()))
        .map(|(c, v)| (v, c.source()))
}

fn pick_website_url<'a>(candidates: &'a [MergeCandidate<'a>]) -> Option<(String, &'a str)> {
    candidates
        .iter()
        .filter_map(|c| c.record.primitives.website_url.clone().map(|v| (c, v)))
        .max_by_key(|(c, v)| (quality::url_quality(v), c.trust_tier.rank(), c.tail_key()))
        .map(|(c, v)| (v, c.source()))
}

fn pick_entity_class(candidates: &[MergeCandidate]) -> EntityClass {
    candidates
        .iter()
        .max_by_key(|c| (c.trust_tier.rank(), c.tail_key()))
        .map(|c| c.record.entity_class)
        .unwrap_or(EntityClass::Thing)
}

/// Canonical dimension array strategy: union across sources, de-dupe,
/// lexicographic sort. Symmetric by construction, no tie-break needed.
fn merge_dimension(candidates: &[MergeCandidate], dimension: Dimension) -> Vec<String> {
    let mut merged: Vec<String> = candidates.iter().flat_map(|c| c.record.dimension(dimension).iter().cloned()).collect();
    merged.sort();
    merged.dedup();
    merged
}

/// Module strategy: deep merge keyed by each candidate's own JSON block.
/// Object/object recurses; array-of-scalars unions and sorts;
/// array-of-objects and type mismatches fall back to a single winner per
/// spec's "no partial merging without stable IDs" rule.
fn merge_modules(candidates: &[MergeCandidate]) -> HashMap<String, Value> {
    let mut module_names: BTreeSet<&str> = BTreeSet::new();
    for c in candidates {
        module_names.extend(c.record.modules.keys().map(String::as_str));
    }

    let mut merged = HashMap::new();
    for name in module_names {
        let contributions: Vec<(&MergeCandidate, &Value)> =
            candidates.iter().filter_map(|c| c.record.modules.get(name).map(|v| (c, v))).collect();
        merged.insert(name.to_string(), merge_module_value("", contributions));
    }
    merged
}

fn merge_module_value<'a>(path: &str, contributions: Vec<(&'a MergeCandidate<'a>, &'a Value)>) -> Value {
    let contributions: Vec<_> = contributions.into_iter().filter(|(_, v)| !v.is_null()).collect();
    if contributions.is_empty() {
        return Value::Null;
    }
    if contributions.len() == 1 {
        return contributions[0].1.clone();
    }

    if contributions.iter().all(|(_, v)| v.is_object()) {
        let mut keys: BTreeSet<&str> = BTreeSet::new();
        for (_, v) in &contributions {
            keys.extend(v.as_object().expect("checked is_object above").keys().map(String::as_str));
        }
        let mut out = serde_json::Map::new();
        for key in keys {
            let child_path = if path.is_empty() { key.to_string() } else { format!("{path}.{key}") };
            let child_contributions: Vec<_> = contributions
                .iter()
                .filter_map(|(c, v)| v.as_object().and_then(|o| o.get(key)).map(|cv| (*c, cv)))
                .collect();
            out.insert(key.to_string(), merge_module_value(&child_path, child_contributions));
        }
        return Value::Object(out);
    }

    let all_arrays_of_scalars = contributions
        .iter()
        .all(|(_, v)| v.as_array().map(|items| items.iter().all(is_scalar)).unwrap_or(false));
    if all_arrays_of_scalars {
        let mut merged: Vec<Value> = contributions.iter().flat_map(|(_, v)| v.as_array().unwrap().iter().cloned()).collect();
        merged.sort_by(|a, b| scalar_sort_key(a).cmp(&scalar_sort_key(b)));
        merged.dedup_by(|a, b| a == b);
        return Value::Array(merged);
    }

    pick_leaf(path, contributions).clone()
}

fn is_scalar(value: &Value) -> bool {
    !value.is_object() && !value.is_array()
}

fn scalar_sort_key(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Winner-take-all leaf pick for array-of-objects and type-mismatch cases:
/// per-rule `confidence` when present, else structural completeness, then
/// the shared cascade tail (spec section 4.6).
fn pick_leaf<'a>(path: &str, contributions: Vec<(&'a MergeCandidate<'a>, &'a Value)>) -> &'a Value {
    contributions
        .into_iter()
        .max_by_key(|(c, v)| {
            let secondary = match c.record.confidence_by_field.get(path) {
                Some(confidence) => (*confidence * 1_000.0) as i64,
                None => completeness_rank(v) as i64,
            };
            (c.trust_tier.rank(), secondary, c.tail_key())
        })
        .map(|(_, v)| v)
        .expect("contributions is non-empty; callers filter empties before recursing")
}

/// Provenance strategy: union, with a deterministic winner per key when
/// sources disagree on the same external-id key (not expected once tier-1
/// dedup has already matched on shared keys, but kept total).
fn merge_external_ids(candidates: &[MergeCandidate]) -> HashMap<String, String> {
    let mut keys: BTreeSet<&str> = BTreeSet::new();
    for c in candidates {
        keys.extend(c.record.external_ids.keys().map(String::as_str));
    }
    let mut merged = HashMap::new();
    for key in keys {
        let winner = candidates
            .iter()
            .filter_map(|c| c.record.external_ids.get(key).map(|v| (c, v)))
            .max_by_key(|(c, v)| (c.trust_tier.rank(), completeness_rank(&Value::String((*v).clone())), c.tail_key()));
        if let Some((_, value)) = winner {
            merged.insert(key.to_string(), value.clone());
        }
    }
    merged
}

fn merge_raw_observations(candidates: &[MergeCandidate]) -> serde_json::Map<String, Value> {
    let mut sorted: Vec<&MergeCandidate> = candidates.iter().collect();
    sorted.sort_by_key(|c| c.source().to_string());
    let mut merged = serde_json::Map::new();
    for c in sorted {
        for (key, value) in &c.record.raw_observations {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

fn merge_confidence(candidates: &[MergeCandidate]) -> HashMap<String, f32> {
    let mut merged: HashMap<String, f32> = HashMap::new();
    for c in candidates {
        for (key, confidence) in &c.record.confidence_by_field {
            let entry = merged.entry(key.clone()).or_insert(0.0);
            if *confidence > *entry {
                *entry = *confidence;
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_common::TrustTier;
    use std::collections::HashMap as Map;

    fn record(source: &str, name: &str, phone: Option<&str>) -> ExtractedEntity {
        let mut primitives = Primitives::default();
        primitives.entity_name = Some(name.to_string());
        primitives.phone = phone.map(String::from);
        ExtractedEntity::new(source, "sha", EntityClass::Place, primitives, serde_json::Map::new(), Map::new())
    }

    #[test]
    fn higher_trust_identity_field_wins() {
        let low = record("osm", "Powerleague", None);
        let high = record("google_places", "Powerleague Portobello", None);
        let candidates = vec![
            MergeCandidate { record: &low, trust_tier: TrustTier::Low, default_priority: 10 },
            MergeCandidate { record: &high, trust_tier: TrustTier::High, default_priority: 10 },
        ];
        let entity = merge_group(&candidates, chrono::Utc::now());
        assert_eq!(entity.primitives.entity_name.as_deref(), Some("Powerleague Portobello"));
        assert_eq!(entity.source_info["entity_name"].source, "google_places");
    }

    #[test]
    fn structural_phone_quality_outranks_trust_for_contact_fields() {
        let high_trust_bad_phone = record("google_places", "Powerleague", Some("0131 000 0000"));
        let low_trust_good_phone = record("osm", "Powerleague", Some("+44 131 000 0000"));
        let candidates = vec![
            MergeCandidate { record: &high_trust_bad_phone, trust_tier: TrustTier::High, default_priority: 10 },
            MergeCandidate { record: &low_trust_good_phone, trust_tier: TrustTier::Low, default_priority: 10 },
        ];
        let entity = merge_group(&candidates, chrono::Utc::now());
        assert_eq!(entity.primitives.phone.as_deref(), Some("+44 131 000 0000"));
    }

    #[test]
    fn coordinates_are_never_averaged() {
        let mut a = record("google_places", "Powerleague", None);
        a.primitives.latitude = Some(55.9550);
        a.primitives.longitude = Some(-3.1050);
        let mut b = record("osm", "Powerleague", None);
        b.primitives.latitude = Some(55.9560);
        b.primitives.longitude = Some(-3.1060);
        let candidates = vec![
            MergeCandidate { record: &a, trust_tier: TrustTier::High, default_priority: 10 },
            MergeCandidate { record: &b, trust_tier: TrustTier::Low, default_priority: 10 },
        ];
        let entity = merge_group(&candidates, chrono::Utc::now());
        assert_eq!(entity.primitives.latitude, Some(55.9550));
        assert_eq!(entity.primitives.longitude, Some(-3.1050));
    }

    #[test]
    fn discovered_by_is_sorted_union_of_sources() {
        let a = record("osm", "Powerleague", None);
        let b = record("google_places", "Powerleague", None);
        let candidates = vec![
            MergeCandidate { record: &a, trust_tier: TrustTier::Low, default_priority: 10 },
            MergeCandidate { record: &b, trust_tier: TrustTier::High, default_priority: 10 },
        ];
        let entity = merge_group(&candidates, chrono::Utc::now());
        assert_eq!(entity.discovered_by, vec!["google_places".to_string(), "osm".to_string()]);
    }

    #[test]
    fn merge_is_idempotent_given_same_inputs() {
        let a = record("google_places", "Powerleague Portobello", Some("+44 131 000 0000"));
        let b = record("osm", "Powerleague", None);
        let candidates = vec![
            MergeCandidate { record: &a, trust_tier: TrustTier::High, default_priority: 10 },
            MergeCandidate { record: &b, trust_tier: TrustTier::Low, default_priority: 20 },
        ];
        let now = chrono::Utc::now();
        let first = merge_group(&candidates, now);
        let second = merge_group(&candidates, now);
        assert_eq!(first.slug, second.slug);
        assert_eq!(first.primitives.entity_name, second.primitives.entity_name);
    }
}
