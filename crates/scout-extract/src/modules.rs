use scout_lens::{FieldCondition, FieldExtractor, FieldRule, ModuleCondition, ModuleTrigger};
use serde_json::Value;

use crate::dotted::{get_dotted, set_dotted};
use crate::entity::ExtractedEntity;
use crate::error::RuleError;
use crate::extractors::evaluate_extractor;
use crate::fields::field_text;
use crate::normalize::apply_normalizers;
use crate::structured_extract::StructuredExtract;

/// Attaches a module whenever one of its triggers' dimension values is
/// present on the entity and every trigger condition holds (spec section
/// 4.5). Attachment is idempotent: a module already attached is left as is.
pub fn attach_modules(entity: &mut ExtractedEntity, triggers: &[ModuleTrigger]) {
    for trigger in triggers {
        let dimension_hit = trigger
            .when
            .values
            .iter()
            .any(|value| entity.dimension(trigger.when.dimension).iter().any(|v| v == value));
        if !dimension_hit {
            continue;
        }

        let conditions_hold = trigger.conditions.iter().all(|condition| match condition {
            ModuleCondition::EntityClass { entity_class } => *entity_class == entity.entity_class,
        });

        if conditions_hold {
            entity.modules.entry(trigger.module.clone()).or_insert_with(|| Value::Object(Default::default()));
        }
    }
}

fn field_condition_holds(
    condition: &FieldCondition,
    module_json: &Value,
    target_path: &str,
    raw_observations: &serde_json::Map<String, Value>,
) -> bool {
    match condition {
        FieldCondition::FieldNotPopulated => get_dotted(module_json, target_path).is_none(),
        FieldCondition::AnyFieldMissing { fields } => fields.iter().any(|f| !raw_observations.contains_key(f)),
        FieldCondition::SourceHasField { field } => raw_observations.contains_key(field),
        FieldCondition::ValuePresent { field } => raw_observations.get(field).map(|v| !v.is_null()).unwrap_or(false),
    }
}

/// Runs every non-`llm_structured` field rule for one attached module, in
/// declared order, first-match-wins per `target_path` (spec section 4.5).
/// A failing rule is recorded in `errors` and skipped; earlier successful
/// writes to the module are kept.
pub fn run_deterministic_pass(
    entity: &mut ExtractedEntity,
    module_name: &str,
    rules: &[FieldRule],
    errors: &mut Vec<RuleError>,
) {
    for rule in rules {
        if rule.extractor.is_llm() {
            continue;
        }
        if !rule.applicability.matches(&entity.source, entity.entity_class) {
            continue;
        }

        let module_json = entity.modules.entry(module_name.to_string()).or_insert_with(|| Value::Object(Default::default()));
        if get_dotted(module_json, &rule.target_path).is_some() {
            continue;
        }
        if !rule
            .conditions
            .iter()
            .all(|c| field_condition_holds(c, module_json, &rule.target_path, &entity.raw_observations))
        {
            continue;
        }

        match evaluate_extractor(&rule.extractor, &rule.source_fields, &entity.primitives, &entity.raw_observations) {
            Ok(Some(value)) => {
                let value = apply_normalizers(value, &rule.normalizers);
                let module_json = entity.modules.get_mut(module_name).expect("inserted above");
                set_dotted(module_json, &rule.target_path, value);
                entity.confidence_by_field.insert(rule.target_path.clone(), rule.confidence);
            }
            Ok(None) => {}
            Err(cause) => errors.push(RuleError::new(rule.rule_id.clone(), entity.source.clone(), cause)),
        }
    }
}

fn has_evidence(rule: &FieldRule, raw_observations: &serde_json::Map<String, Value>) -> bool {
    rule.source_fields
        .iter()
        .any(|f| raw_observations.get(f).map(|v| !v.is_null()).unwrap_or(false))
}

/// Collects every applicable `llm_structured` rule on one module, builds a
/// single combined schema, invokes the structured-extract backend once,
/// and writes results only where evidence existed in `source_fields` (spec
/// section 9). A backend failure logs one `RuleError` per affected rule.
pub async fn run_llm_pass(
    entity: &mut ExtractedEntity,
    module_name: &str,
    rules: &[FieldRule],
    backend: &dyn StructuredExtract,
    errors: &mut Vec<RuleError>,
) {
    let applicable: Vec<&FieldRule> = rules
        .iter()
        .filter(|r| r.extractor.is_llm())
        .filter(|r| r.applicability.matches(&entity.source, entity.entity_class))
        .filter(|r| has_evidence(r, &entity.raw_observations))
        .collect();

    if applicable.is_empty() {
        return;
    }

    let mut schema = serde_json::Map::new();
    let mut text_lines = Vec::new();
    for rule in &applicable {
        if let FieldExtractor::LlmStructured { prompt_hint, schema_hint } = &rule.extractor {
            schema.insert(
                rule.rule_id.clone(),
                serde_json::json!({"prompt_hint": prompt_hint, "schema": schema_hint}),
            );
        }
        for field in &rule.source_fields {
            if let Some(text) = field_text(field, &entity.primitives, &entity.raw_observations) {
                text_lines.push(format!("{field}: {text}"));
            }
        }
    }
    text_lines.sort();
    text_lines.dedup();
    let text = text_lines.join("\n");

    match backend.extract(&Value::Object(schema), &text).await {
        Ok(Value::Object(values)) => {
            for rule in &applicable {
                let module_json = entity.modules.entry(module_name.to_string()).or_insert_with(|| Value::Object(Default::default()));
                if get_dotted(module_json, &rule.target_path).is_some() {
                    continue;
                }
                if !rule
                    .conditions
                    .iter()
                    .all(|c| field_condition_holds(c, module_json, &rule.target_path, &entity.raw_observations))
                {
                    continue;
                }
                if let Some(value) = values.get(&rule.rule_id) {
                    let value = apply_normalizers(value.clone(), &rule.normalizers);
                    let module_json = entity.modules.get_mut(module_name).expect("inserted above");
                    set_dotted(module_json, &rule.target_path, value);
                    entity.confidence_by_field.insert(rule.target_path.clone(), rule.confidence);
                }
            }
        }
        Ok(_) => errors.push(RuleError::new(
            module_name.to_string(),
            entity.source.clone(),
            "structured extract backend returned a non-object value".to_string(),
        )),
        Err(err) => {
            for rule in &applicable {
                errors.push(RuleError::new(rule.rule_id.clone(), entity.source.clone(), err.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_common::{Dimension, EntityClass};
    use scout_lens::{Applicability, WhenClause};
    use std::collections::HashMap;

    fn entity_with_activity() -> ExtractedEntity {
        let raw = serde_json::json!({"capacity_text": "up to 40"}).as_object().unwrap().clone();
        let mut e = ExtractedEntity::new("google_places", "deadbeef", EntityClass::Place, Default::default(), raw, HashMap::new());
        e.add_to_dimension(Dimension::CanonicalActivities, "padel");
        e
    }

    fn trigger() -> ModuleTrigger {
        ModuleTrigger {
            module: "court_details".to_string(),
            when: WhenClause { dimension: Dimension::CanonicalActivities, values: vec!["padel".to_string()] },
            conditions: vec![],
        }
    }

    #[test]
    fn module_attaches_when_dimension_value_present() {
        let mut e = entity_with_activity();
        attach_modules(&mut e, &[trigger()]);
        assert!(e.modules.contains_key("court_details"));
    }

    #[test]
    fn module_does_not_attach_without_dimension_hit() {
        let mut e = ExtractedEntity::new("google_places", "deadbeef", EntityClass::Place, Default::default(), serde_json::Map::new(), HashMap::new());
        attach_modules(&mut e, &[trigger()]);
        assert!(e.modules.is_empty());
    }

    #[test]
    fn deterministic_pass_writes_first_match_and_skips_later_rules_for_same_path() {
        let mut e = entity_with_activity();
        e.modules.insert("court_details".to_string(), Value::Object(Default::default()));
        let rules = vec![
            FieldRule {
                rule_id: "r1".to_string(),
                target_path: "capacity".to_string(),
                source_fields: vec!["capacity_text".to_string()],
                extractor: FieldExtractor::NumericParser,
                normalizers: vec![],
                confidence: 0.9,
                applicability: Applicability::default(),
                conditions: vec![],
            },
            FieldRule {
                rule_id: "r2".to_string(),
                target_path: "capacity".to_string(),
                source_fields: vec!["capacity_text".to_string()],
                extractor: FieldExtractor::Coalesce,
                normalizers: vec![],
                confidence: 0.5,
                applicability: Applicability::default(),
                conditions: vec![],
            },
        ];
        let mut errors = Vec::new();
        run_deterministic_pass(&mut e, "court_details", &rules, &mut errors);
        assert!(errors.is_empty());
        let module_json = &e.modules["court_details"];
        assert_eq!(get_dotted(module_json, "capacity"), Some(&serde_json::json!(40.0)));
    }

    #[tokio::test]
    async fn llm_pass_skips_rules_without_evidence() {
        use crate::testing::MockStructuredExtract;

        let mut e = entity_with_activity();
        e.modules.insert("court_details".to_string(), Value::Object(Default::default()));
        let rules = vec![FieldRule {
            rule_id: "r3".to_string(),
            target_path: "booking_notes".to_string(),
            source_fields: vec!["notes".to_string()],
            extractor: FieldExtractor::LlmStructured {
                prompt_hint: "extract booking notes".to_string(),
                schema_hint: serde_json::json!({"type": "string"}),
            },
            normalizers: vec![],
            confidence: 0.6,
            applicability: Applicability::default(),
            conditions: vec![],
        }];
        let backend = MockStructuredExtract::new();
        let mut errors = Vec::new();
        run_llm_pass(&mut e, "court_details", &rules, &backend, &mut errors).await;
        assert!(errors.is_empty());
        assert_eq!(get_dotted(&e.modules["court_details"], "booking_notes"), None);
    }
}
