use thiserror::Error;

/// Phase A failure: the source-specific extractor could not make sense of
/// a raw payload at all (spec section 4.5).
#[derive(Debug, Error)]
#[error("phase A extraction failed: {0}")]
pub struct ExtractError(pub String);

/// A single failed field rule (spec section 4.5, "Error policy" / section
/// 7, "Extraction-rule"). Never aborts the module or the run; the module
/// keeps whatever fields earlier rules already wrote.
#[derive(Debug, Clone, Error)]
#[error("rule {rule_id} failed for source {source}: {cause}")]
pub struct RuleError {
    pub rule_id: String,
    pub source: String,
    pub cause: String,
}

impl RuleError {
    pub fn new(rule_id: impl Into<String>, source: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            source: source.into(),
            cause: cause.into(),
        }
    }
}

/// A legacy raw field name (`location_*`, `contact_*`, `address_*`) seen in
/// a source payload in place of the current schema primitive name (spec
/// section 4.5). Warning by default; promoted to a hard error when
/// `STRICT_FIELD_VALIDATION` is set (spec section 6).
#[derive(Debug, Clone, Error)]
#[error("legacy field name {field:?} in source {source}; use the current schema primitive instead")]
pub struct LegacyFieldWarning {
    pub source: String,
    pub field: String,
}
