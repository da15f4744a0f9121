use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Input for `Store::insert_raw_ingestion`. One row per source call,
/// append-only (spec section 3: RawIngestion).
#[derive(Debug, Clone)]
pub struct RawIngestionInput {
    pub source: String,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub sha256: String,
    pub payload: serde_json::Value,
}

/// A row read back from `raw_ingestions`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredRawIngestion {
    pub id: Uuid,
    pub source: String,
    pub url: String,
    pub fetched_at: DateTime<Utc>,
    pub sha256: String,
    pub payload: serde_json::Value,
}

/// Input for `Store::insert_failed_extraction`. `rule_id` is absent for
/// source- or LLM-severity failures that never reached rule execution.
#[derive(Debug, Clone)]
pub struct FailedExtractionInput {
    pub raw_ingestion_id: Option<Uuid>,
    pub rule_id: Option<String>,
    pub kind: String,
    pub message: String,
}
