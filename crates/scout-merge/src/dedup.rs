use std::collections::HashMap;

use scout_common::geo::{haversine_distance_meters, GeoPoint};
use scout_extract::ExtractedEntity;

/// Tier-3 name-similarity floor (spec section 4.6).
pub const NAME_SIMILARITY_THRESHOLD: f64 = 0.85;
/// Tier-3 distance ceiling, in meters (spec section 4.6).
pub const GEO_DISTANCE_THRESHOLD_METERS: f64 = 50.0;

/// Groups extracted records that refer to the same real-world entity,
/// first-hit-wins across three tiers: shared `external_ids` entry, matching
/// normalised-name slug, or geo+fuzzy-name proximity (spec section 4.6).
/// Returns groups as index lists into `records`, in first-seen order.
///
/// An external-id index and a slug index keep tiers 1 and 2 at O(1) per
/// record; only records that fall through both do a pairwise tier-3 scan
/// against existing groups.
pub fn group_duplicates(records: &[ExtractedEntity]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut external_id_index: HashMap<(String, String), usize> = HashMap::new();
    let mut slug_index: HashMap<String, usize> = HashMap::new();

    for (i, record) in records.iter().enumerate() {
        let group_idx = find_group(record, records, &groups, &external_id_index, &slug_index).unwrap_or_else(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[group_idx].push(i);

        for (key, value) in &record.external_ids {
            external_id_index.entry((key.clone(), value.clone())).or_insert(group_idx);
        }
        if let Some(name) = &record.primitives.entity_name {
            slug_index.entry(scout_common::slugify(name)).or_insert(group_idx);
        }
    }

    groups
}

fn find_group(
    record: &ExtractedEntity,
    records: &[ExtractedEntity],
    groups: &[Vec<usize>],
    external_id_index: &HashMap<(String, String), usize>,
    slug_index: &HashMap<String, usize>,
) -> Option<usize> {
    for (key, value) in &record.external_ids {
        if let Some(&idx) = external_id_index.get(&(key.clone(), value.clone())) {
            return Some(idx);
        }
    }

    if let Some(name) = &record.primitives.entity_name {
        if let Some(&idx) = slug_index.get(&scout_common::slugify(name)) {
            return Some(idx);
        }
    }

    let (lat, lng) = (record.primitives.latitude?, record.primitives.longitude?);
    let name = record.primitives.entity_name.as_deref()?;
    if name.is_empty() {
        return None;
    }
    let point = GeoPoint::new(lat, lng);
    let lowered = name.to_lowercase();

    groups.iter().enumerate().find_map(|(group_idx, members)| {
        members.iter().find_map(|&member_idx| {
            let other = &records[member_idx];
            let other_lat = other.primitives.latitude?;
            let other_lng = other.primitives.longitude?;
            let other_name = other.primitives.entity_name.as_deref()?;
            if other_name.is_empty() {
                return None;
            }
            let similarity = strsim::normalized_levenshtein(&lowered, &other_name.to_lowercase());
            if similarity < NAME_SIMILARITY_THRESHOLD {
                return None;
            }
            let distance = haversine_distance_meters(point, GeoPoint::new(other_lat, other_lng));
            (distance <= GEO_DISTANCE_THRESHOLD_METERS).then_some(group_idx)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_common::EntityClass;
    use scout_extract::Primitives;
    use std::collections::HashMap as Map;

    fn record_with(external_id: Option<(&str, &str)>, name: Option<&str>, geo: Option<(f64, f64)>) -> ExtractedEntity {
        let mut primitives = Primitives::default();
        primitives.entity_name = name.map(String::from);
        if let Some((lat, lng)) = geo {
            primitives.latitude = Some(lat);
            primitives.longitude = Some(lng);
        }
        let mut external_ids = Map::new();
        if let Some((k, v)) = external_id {
            external_ids.insert(k.to_string(), v.to_string());
        }
        ExtractedEntity::new("source", "sha", EntityClass::Place, primitives, serde_json::Map::new(), external_ids)
    }

    #[test]
    fn shared_external_id_groups_together_regardless_of_name() {
        let records = vec![
            record_with(Some(("google_place_id", "abc")), Some("Powerleague Portobello"), None),
            record_with(Some(("google_place_id", "abc")), Some("Powerleague"), None),
        ];
        let groups = group_duplicates(&records);
        assert_eq!(groups, vec![vec![0, 1]]);
    }

    #[test]
    fn matching_slug_groups_together() {
        let records = vec![
            record_with(None, Some("Powerleague Portobello"), None),
            record_with(None, Some("powerleague portobello!!"), None),
        ];
        let groups = group_duplicates(&records);
        assert_eq!(groups, vec![vec![0, 1]]);
    }

    #[test]
    fn close_fuzzy_name_and_geo_group_together() {
        let records = vec![
            record_with(None, Some("Powerleague Portobello"), Some((55.9550, -3.1050))),
            record_with(None, Some("Powerleague Portobello FC"), Some((55.9551, -3.1051))),
        ];
        let groups = group_duplicates(&records);
        assert_eq!(groups, vec![vec![0, 1]]);
    }

    #[test]
    fn distant_points_never_enter_tier_three() {
        let records = vec![
            record_with(None, Some("Powerleague Portobello"), Some((55.9550, -3.1050))),
            record_with(None, Some("Powerleague Portobello"), Some((55.8642, -4.2518))),
        ];
        let groups = group_duplicates(&records);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn records_without_coordinates_cannot_enter_tier_three() {
        let records = vec![
            record_with(None, Some("Powerleague Portobello FC"), None),
            record_with(None, Some("Powerleague Portobello"), None),
        ];
        let groups = group_duplicates(&records);
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn low_similarity_never_merges_even_with_matching_geo() {
        let records = vec![
            record_with(None, Some("Powerleague Portobello"), Some((55.9550, -3.1050))),
            record_with(None, Some("Totally Different Name"), Some((55.9550, -3.1050))),
        ];
        let groups = group_duplicates(&records);
        assert_eq!(groups.len(), 2);
    }
}
