use std::collections::HashMap;

use scout_common::{Dimension, EntityClass, Mode};
use serde::{Deserialize, Serialize};

/// The complete, validated, immutable lens document (spec section 3).
/// Loaded once at bootstrap by [`crate::loader::load`]; every field here
/// is read-only for the rest of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LensContract {
    pub lens_id: String,
    pub vocabulary: Vocabulary,
    pub connector_rules: HashMap<String, ConnectorRule>,
    pub mapping_rules: Vec<MappingRule>,
    pub canonical_values: CanonicalValues,
    pub modules: HashMap<String, ModuleDef>,
    pub module_triggers: Vec<ModuleTrigger>,
    /// The fixture entity name gate 6 (smoke-coverage) exercises.
    pub validation_entity: String,
}

/// Vocabulary used by the planner to extract query features — keyword
/// hits, location hits, and category-vs-specific-entity classification
/// (spec section 4.3). Purely lens data; the planner never hardcodes a
/// vertical's terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    /// Category/activity terms (e.g. "padel", "courts") that indicate a
    /// broad category search rather than a specific named entity.
    pub category_terms: Vec<String>,
    /// Known location terms (gazetteer) used to detect a location hit in
    /// the query.
    pub location_terms: Vec<String>,
}

/// A rule governing when a connector is scheduled and with what
/// parameters (spec section 4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorRule {
    pub trigger: Trigger,
    #[serde(default)]
    pub params: serde_json::Value,
    /// Used by the planner's budget-gating cost estimate.
    pub expected_calls: u32,
}

/// Fires when the query's feature set intersects `any_keywords` (empty
/// means "always fires") and, if set, `mode` matches the request mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default)]
    pub any_keywords: Vec<String>,
    #[serde(default)]
    pub mode: Option<Mode>,
}

/// One Phase-B mapping rule: on a source-field regex hit, contribute
/// `value` to `dimension` (spec section 4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingRule {
    pub id: String,
    pub pattern: String,
    pub dimension: Dimension,
    pub value: String,
    pub source_fields: Vec<String>,
    pub confidence: f32,
    #[serde(default)]
    pub applicability: Applicability,
}

/// The canonical value registry: every value any mapping rule may
/// contribute to a dimension, keyed by dimension then by value, mapping
/// to a vertical-specific display label the engine never inspects.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanonicalValues {
    pub values: HashMap<Dimension, HashMap<String, String>>,
}

impl CanonicalValues {
    pub fn contains(&self, dimension: Dimension, value: &str) -> bool {
        self.values
            .get(&dimension)
            .map(|m| m.contains_key(value))
            .unwrap_or(false)
    }
}

/// A namespaced module definition: its ordered field-extraction rules
/// (spec section 4.5, "Module field extraction").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDef {
    pub name: String,
    pub field_rules: Vec<FieldRule>,
}

/// Fires a module attachment when `when.dimension` contains any of
/// `when.values` and every condition holds (spec section 4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleTrigger {
    pub module: String,
    pub when: WhenClause,
    #[serde(default)]
    pub conditions: Vec<ModuleCondition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhenClause {
    pub dimension: Dimension,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModuleCondition {
    EntityClass { entity_class: EntityClass },
}

/// One ordered field-extraction rule within a module (spec section 4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRule {
    pub rule_id: String,
    /// Dotted path into the module's JSON block, e.g.
    /// `football_pitches.five_a_side.total`.
    pub target_path: String,
    pub source_fields: Vec<String>,
    pub extractor: FieldExtractor,
    #[serde(default)]
    pub normalizers: Vec<Normalizer>,
    pub confidence: f32,
    #[serde(default)]
    pub applicability: Applicability,
    #[serde(default)]
    pub conditions: Vec<FieldCondition>,
}

/// The closed set of extractor kinds the engine knows how to execute
/// (spec section 9, "Dynamic class inheritance ... re-expressed as a
/// tagged variant"). New kinds require a deliberate engine change; the
/// lens only ever *parameterises* one of these, never defines new
/// behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldExtractor {
    NumericParser,
    RegexCapture { pattern: String },
    JsonPath { path: String },
    BooleanCoercion,
    Coalesce,
    Normalize,
    ArrayBuilder { separator: String },
    StringTemplate { template: String },
    LlmStructured { prompt_hint: String, schema_hint: serde_json::Value },
}

impl FieldExtractor {
    pub fn is_llm(&self) -> bool {
        matches!(self, FieldExtractor::LlmStructured { .. })
    }
}

/// A pure string→string (or string→list) pipeline step applied
/// left-to-right after extraction, before the dotted-path write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizer {
    Trim,
    Lowercase,
    Uppercase,
    TitleCase,
    CollapseWhitespace,
    StripNonDigits,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Applicability {
    pub source: Option<String>,
    pub entity_class: Option<EntityClass>,
}

impl Applicability {
    pub fn matches(&self, source: &str, entity_class: EntityClass) -> bool {
        self.source.as_deref().map(|s| s == source).unwrap_or(true)
            && self.entity_class.map(|c| c == entity_class).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldCondition {
    FieldNotPopulated,
    AnyFieldMissing { fields: Vec<String> },
    SourceHasField { field: String },
    ValuePresent { field: String },
}
