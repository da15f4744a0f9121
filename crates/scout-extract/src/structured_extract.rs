use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("structured extract failed: {0}")]
pub struct StructuredExtractError(pub String);

/// The embedded LLM call, narrowed to a schema-bound function (spec
/// section 9, "structured-extract function with injectable backends").
/// `schema` is the combined JSON Schema for every `llm_structured` field
/// rule attached to one module; `text` is the source text the rules are
/// meant to read from. Implementations return one JSON object keyed by
/// `rule_id`.
#[async_trait]
pub trait StructuredExtract: Send + Sync {
    async fn extract(
        &self,
        schema: &serde_json::Value,
        text: &str,
    ) -> Result<serde_json::Value, StructuredExtractError>;
}
