use regex::Regex;
use scout_lens::MappingRule;

use crate::entity::ExtractedEntity;
use crate::fields::field_text;

/// Runs every mapping rule once against one entity's primitives and raw
/// observations, adding `rule.value` to `rule.dimension` on the first
/// matching source field (spec section 4.5). Finalizes all four dimension
/// arrays afterwards.
pub fn apply_mapping_rules(entity: &mut ExtractedEntity, rules: &[MappingRule]) {
    for rule in rules {
        if !rule.applicability.matches(&entity.source, entity.entity_class) {
            continue;
        }
        let pattern = match Regex::new(&rule.pattern) {
            Ok(re) => re,
            Err(_) => continue,
        };
        let matched = rule.source_fields.iter().any(|field| {
            field_text(field, &entity.primitives, &entity.raw_observations)
                .map(|text| pattern.is_match(&text))
                .unwrap_or(false)
        });
        if matched {
            entity.add_to_dimension(rule.dimension, &rule.value);
            let key = format!("{}.{}", rule.dimension.as_str(), rule.value);
            let existing = entity.confidence_by_field.get(&key).copied().unwrap_or(0.0);
            entity.confidence_by_field.insert(key, existing.max(rule.confidence));
        }
    }
    entity.finalize_dimensions();
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_common::{Dimension, EntityClass};
    use scout_lens::Applicability;
    use std::collections::HashMap;

    fn entity() -> ExtractedEntity {
        let raw = serde_json::json!({"description": "Two padel courts available"}).as_object().unwrap().clone();
        ExtractedEntity::new("google_places", "deadbeef", EntityClass::Place, Default::default(), raw, HashMap::new())
    }

    fn rule(pattern: &str, value: &str) -> MappingRule {
        MappingRule {
            id: format!("rule-{value}"),
            pattern: pattern.to_string(),
            dimension: Dimension::CanonicalActivities,
            value: value.to_string(),
            source_fields: vec!["description".to_string()],
            confidence: 0.8,
            applicability: Applicability::default(),
        }
    }

    #[test]
    fn matching_rule_adds_canonical_value() {
        let mut e = entity();
        apply_mapping_rules(&mut e, &[rule("padel", "padel")]);
        assert_eq!(e.canonical_activities, vec!["padel".to_string()]);
    }

    #[test]
    fn non_matching_rule_contributes_nothing() {
        let mut e = entity();
        apply_mapping_rules(&mut e, &[rule("squash", "squash")]);
        assert!(e.canonical_activities.is_empty());
    }

    #[test]
    fn results_are_sorted_after_finalisation() {
        let mut e = entity();
        apply_mapping_rules(&mut e, &[rule("courts", "tennis"), rule("padel", "padel")]);
        assert_eq!(e.canonical_activities, vec!["padel".to_string(), "tennis".to_string()]);
    }
}
