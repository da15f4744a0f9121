//! Lens and registry fixtures shared by this crate's own tests and by
//! downstream crates (`scout-planner`, `scout-extract`) that need a
//! fully-formed, valid lens to exercise against without hand-rolling one.

use std::collections::HashMap;
use std::time::Duration;

use scout_common::{Dimension, EntityClass, Mode, Phase, TrustTier};
use scout_registry::{ConnectorRegistry, ConnectorSpec, RateLimit};

use crate::contract::{
    Applicability, CanonicalValues, ConnectorRule, FieldExtractor, FieldRule, LensContract, MappingRule, ModuleDef,
    ModuleTrigger, Normalizer, Trigger, Vocabulary, WhenClause,
};

/// A registry carrying the one connector `valid_lens` references.
pub fn test_registry() -> ConnectorRegistry {
    let mut registry = ConnectorRegistry::new();
    registry.register(ConnectorSpec {
        name: "serper".to_string(),
        phase: Phase::Discovery,
        cost_per_call_usd: 0.01,
        trust_tier: TrustTier::Medium,
        default_priority: 10,
        timeout: Duration::from_secs(5),
        rate_limit: RateLimit {
            per_minute: 60,
            per_hour: 1000,
        },
    });
    registry
}

/// A complete, internally-consistent lens that passes every validation
/// gate. The padel vertical used as the running example throughout the
/// spec — small enough to read at a glance, shaped enough to exercise
/// every part of the contract.
pub fn valid_lens() -> LensContract {
    let mut canonical_activities = HashMap::new();
    canonical_activities.insert("padel".to_string(), "Padel".to_string());

    let mut canonical_values = HashMap::new();
    canonical_values.insert(Dimension::CanonicalActivities, canonical_activities);

    let mut connector_rules = HashMap::new();
    connector_rules.insert(
        "serper".to_string(),
        ConnectorRule {
            trigger: Trigger {
                any_keywords: vec!["padel".to_string()],
                mode: Some(Mode::DiscoverMany),
            },
            params: serde_json::Value::Null,
            expected_calls: 1,
        },
    );

    let mut modules = HashMap::new();
    modules.insert(
        "padel_courts".to_string(),
        ModuleDef {
            name: "padel_courts".to_string(),
            field_rules: vec![FieldRule {
                rule_id: "padel_courts.court_count".to_string(),
                target_path: "padel_courts.court_count".to_string(),
                source_fields: vec!["raw_description".to_string()],
                extractor: FieldExtractor::RegexCapture {
                    pattern: r"(\d+)\s+courts?".to_string(),
                },
                normalizers: vec![Normalizer::Trim],
                confidence: 0.8,
                applicability: Applicability {
                    source: None,
                    entity_class: Some(EntityClass::Place),
                },
                conditions: vec![],
            }],
        },
    );

    LensContract {
        lens_id: "padel-v1".to_string(),
        vocabulary: Vocabulary {
            category_terms: vec!["padel".to_string(), "courts".to_string()],
            location_terms: vec!["edinburgh".to_string(), "glasgow".to_string()],
        },
        connector_rules,
        mapping_rules: vec![MappingRule {
            id: "activity.padel".to_string(),
            pattern: r"(?i)padel".to_string(),
            dimension: Dimension::CanonicalActivities,
            value: "padel".to_string(),
            source_fields: vec!["entity_name".to_string(), "raw_description".to_string()],
            confidence: 0.9,
            applicability: Applicability::default(),
        }],
        canonical_values: CanonicalValues { values: canonical_values },
        modules,
        module_triggers: vec![ModuleTrigger {
            module: "padel_courts".to_string(),
            when: WhenClause {
                dimension: Dimension::CanonicalActivities,
                values: vec!["padel".to_string()],
            },
            conditions: vec![],
        }],
        validation_entity: "Edinburgh Padel Club".to_string(),
    }
}

/// Violates gate 2: references a canonical value absent from
/// `canonical_values`.
pub fn lens_with_bad_canonical_reference() -> LensContract {
    let mut lens = valid_lens();
    lens.mapping_rules[0].value = "pickleball".to_string();
    lens
}

/// Violates gate 3: `connector_rules` names a connector the registry
/// doesn't carry.
pub fn lens_with_bad_connector_reference() -> LensContract {
    let mut lens = valid_lens();
    let rule = lens.connector_rules.remove("serper").unwrap();
    lens.connector_rules.insert("unregistered-connector".to_string(), rule);
    lens
}

/// Violates gate 4: a field rule reuses a mapping rule's `id`/`rule_id`.
pub fn lens_with_duplicate_rule_id() -> LensContract {
    let mut lens = valid_lens();
    let duplicate_id = lens.mapping_rules[0].id.clone();
    lens.modules.get_mut("padel_courts").unwrap().field_rules[0].rule_id = duplicate_id;
    lens
}

/// Violates gate 5: an unbalanced group in a mapping pattern fails to
/// compile as a regex.
pub fn lens_with_non_compiling_pattern() -> LensContract {
    let mut lens = valid_lens();
    lens.mapping_rules[0].pattern = "(unterminated".to_string();
    lens
}

/// Violates gate 6: no mapping rule matches `validation_entity`, so the
/// lens could never populate a canonical dimension in production either.
pub fn lens_with_no_smoke_coverage() -> LensContract {
    let mut lens = valid_lens();
    lens.validation_entity = "Nothing Matches This".to_string();
    lens.mapping_rules[0].pattern = r"(?i)unmatchable-term-xyz".to_string();
    lens
}
