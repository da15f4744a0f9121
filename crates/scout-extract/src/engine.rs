use scout_lens::LensContract;

use crate::entity::ExtractedEntity;
use crate::error::RuleError;
use crate::mapping::apply_mapping_rules;
use crate::modules::{attach_modules, run_deterministic_pass, run_llm_pass};
use crate::structured_extract::StructuredExtract;

/// Runs Phase B end to end on an already Phase-A-extracted entity: mapping
/// rules, dimension finalisation, module attachment, then each attached
/// module's deterministic field rules followed by its `llm_structured`
/// rules (spec section 4.5). Returns every field rule failure for the
/// caller to log; none of them abort extraction.
pub async fn run_phase_b(
    entity: &mut ExtractedEntity,
    lens: &LensContract,
    structured_extract: &dyn StructuredExtract,
) -> Vec<RuleError> {
    apply_mapping_rules(entity, &lens.mapping_rules);
    attach_modules(entity, &lens.module_triggers);

    let mut module_names: Vec<String> = entity.modules.keys().cloned().collect();
    module_names.sort();

    let mut errors = Vec::new();
    for module_name in &module_names {
        let Some(module_def) = lens.modules.get(module_name) else {
            continue;
        };
        run_deterministic_pass(entity, module_name, &module_def.field_rules, &mut errors);
        run_llm_pass(entity, module_name, &module_def.field_rules, structured_extract, &mut errors).await;
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use scout_common::EntityClass;
    use scout_lens::fixtures::valid_lens;
    use std::collections::HashMap;

    use crate::testing::MockStructuredExtract;

    #[tokio::test]
    async fn runs_without_error_when_no_dimensions_match() {
        let lens = valid_lens();
        let mut entity = ExtractedEntity::new(
            "google_places",
            "deadbeef",
            EntityClass::Place,
            Default::default(),
            serde_json::Map::new(),
            HashMap::new(),
        );
        let backend = MockStructuredExtract::new();
        let errors = run_phase_b(&mut entity, &lens, &backend).await;
        assert!(errors.is_empty());
        assert!(entity.modules.is_empty());
    }
}
