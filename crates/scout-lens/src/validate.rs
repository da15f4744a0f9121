use std::collections::HashSet;

use regex::Regex;
use scout_registry::ConnectorRegistry;

use crate::contract::LensContract;
use crate::error::LensValidationError;

/// Runs every validation gate in declared order; the first failure
/// aborts (spec section 4.2). Gate 1 (structural schema) is enforced by
/// `serde`/`serde_yaml` during deserialization in `crate::loader`, before
/// this function is ever reached, so gates here start at 2.
pub fn validate(lens: &LensContract, registry: &ConnectorRegistry) -> Result<(), LensValidationError> {
    gate_canonical_reference_integrity(lens)?;
    gate_connector_reference_integrity(lens, registry)?;
    gate_unique_rule_ids(lens)?;
    gate_patterns_compile(lens)?;
    gate_smoke_coverage(lens)?;
    Ok(())
}

/// Gate 2: every `mapping_rule.value` exists in `canonical_values`; every
/// module named in `module_triggers.add_modules` exists in `modules`.
fn gate_canonical_reference_integrity(lens: &LensContract) -> Result<(), LensValidationError> {
    for rule in &lens.mapping_rules {
        if !lens.canonical_values.contains(rule.dimension, &rule.value) {
            return Err(LensValidationError::new(
                "canonical_reference_integrity",
                format!(
                    "mapping rule {} references value {:?} not present in canonical_values[{:?}]",
                    rule.id, rule.value, rule.dimension
                ),
            ));
        }
    }

    for trigger in &lens.module_triggers {
        if !lens.modules.contains_key(&trigger.module) {
            return Err(LensValidationError::new(
                "canonical_reference_integrity",
                format!("module_trigger references undefined module {:?}", trigger.module),
            ));
        }
        for value in &trigger.when.values {
            if !lens.canonical_values.contains(trigger.when.dimension, value) {
                return Err(LensValidationError::new(
                    "canonical_reference_integrity",
                    format!(
                        "module_trigger for {:?} references value {:?} not present in canonical_values[{:?}]",
                        trigger.module, value, trigger.when.dimension
                    ),
                ));
            }
        }
    }

    Ok(())
}

/// Gate 3: every key in `connector_rules` exists in the registry.
fn gate_connector_reference_integrity(
    lens: &LensContract,
    registry: &ConnectorRegistry,
) -> Result<(), LensValidationError> {
    for connector in lens.connector_rules.keys() {
        if !registry.contains(connector) {
            return Err(LensValidationError::new(
                "connector_reference_integrity",
                format!("connector_rules references unregistered connector {connector:?}"),
            ));
        }
    }
    Ok(())
}

/// Gate 4: unique `rule_id` across all mapping and field rules.
fn gate_unique_rule_ids(lens: &LensContract) -> Result<(), LensValidationError> {
    let mut seen = HashSet::new();

    for rule in &lens.mapping_rules {
        if !seen.insert(rule.id.clone()) {
            return Err(LensValidationError::new(
                "unique_rule_ids",
                format!("duplicate rule_id {:?}", rule.id),
            ));
        }
    }

    for module in lens.modules.values() {
        for rule in &module.field_rules {
            if !seen.insert(rule.rule_id.clone()) {
                return Err(LensValidationError::new(
                    "unique_rule_ids",
                    format!("duplicate rule_id {:?}", rule.rule_id),
                ));
            }
        }
    }

    Ok(())
}

/// Gate 5: all mapping-rule `pattern`s compile as regex.
fn gate_patterns_compile(lens: &LensContract) -> Result<(), LensValidationError> {
    for rule in &lens.mapping_rules {
        if let Err(e) = Regex::new(&rule.pattern) {
            return Err(LensValidationError::new(
                "patterns_compile",
                format!("mapping rule {} pattern {:?} failed to compile: {e}", rule.id, rule.pattern),
            ));
        }
    }

    for module in lens.modules.values() {
        for rule in &module.field_rules {
            if let crate::contract::FieldExtractor::RegexCapture { pattern } = &rule.extractor {
                if let Err(e) = Regex::new(pattern) {
                    return Err(LensValidationError::new(
                        "patterns_compile",
                        format!("field rule {} pattern {:?} failed to compile: {e}", rule.rule_id, pattern),
                    ));
                }
            }
        }
    }

    Ok(())
}

/// Gate 6: at least one fixture produces a non-empty canonical dimension
/// and a non-empty module for the declared validation entity. We run the
/// mapping-rule pattern match directly against `validation_entity` as a
/// name-shaped smoke fixture, since the lens has no raw payload at
/// bootstrap time — this only proves the rules *can* fire, not that
/// production data will.
fn gate_smoke_coverage(lens: &LensContract) -> Result<(), LensValidationError> {
    let produces_dimension_hit = lens.mapping_rules.iter().any(|rule| {
        Regex::new(&rule.pattern)
            .map(|re| re.is_match(&lens.validation_entity))
            .unwrap_or(false)
    });

    if !produces_dimension_hit {
        return Err(LensValidationError::new(
            "smoke_coverage",
            format!(
                "no mapping rule matches the validation entity {:?}; lens would never populate a canonical dimension",
                lens.validation_entity
            ),
        ));
    }

    if lens.modules.is_empty() || lens.module_triggers.is_empty() {
        return Err(LensValidationError::new(
            "smoke_coverage",
            "lens declares no modules or no module_triggers; would never attach structured data",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{
        lens_with_bad_canonical_reference, lens_with_bad_connector_reference, lens_with_duplicate_rule_id,
        lens_with_non_compiling_pattern, lens_with_no_smoke_coverage, test_registry, valid_lens,
    };

    #[test]
    fn valid_lens_passes_every_gate() {
        let lens = valid_lens();
        let registry = test_registry();
        assert!(validate(&lens, &registry).is_ok());
    }

    #[test]
    fn bad_canonical_reference_fails_first() {
        let lens = lens_with_bad_canonical_reference();
        let registry = test_registry();
        let err = validate(&lens, &registry).unwrap_err();
        assert_eq!(err.code, "canonical_reference_integrity");
    }

    #[test]
    fn bad_connector_reference_is_caught() {
        let lens = lens_with_bad_connector_reference();
        let registry = test_registry();
        let err = validate(&lens, &registry).unwrap_err();
        assert_eq!(err.code, "connector_reference_integrity");
    }

    #[test]
    fn duplicate_rule_id_is_caught() {
        let lens = lens_with_duplicate_rule_id();
        let registry = test_registry();
        let err = validate(&lens, &registry).unwrap_err();
        assert_eq!(err.code, "unique_rule_ids");
    }

    #[test]
    fn non_compiling_pattern_is_caught() {
        let lens = lens_with_non_compiling_pattern();
        let registry = test_registry();
        let err = validate(&lens, &registry).unwrap_err();
        assert_eq!(err.code, "patterns_compile");
    }

    #[test]
    fn missing_smoke_coverage_is_caught() {
        let lens = lens_with_no_smoke_coverage();
        let registry = test_registry();
        let err = validate(&lens, &registry).unwrap_err();
        assert_eq!(err.code, "smoke_coverage");
    }
}
