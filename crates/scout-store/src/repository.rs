use async_trait::async_trait;
use scout_extract::ExtractedEntity;
use scout_merge::Entity;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{FailedExtractionInput, RawIngestionInput, StoredRawIngestion};

/// Persistence boundary for the four tables in spec section 6. Exists so
/// the orchestrator can be exercised against an in-memory fake without a
/// live Postgres instance.
#[async_trait]
pub trait Store: Send + Sync {
    /// Records a source call. Idempotent on `sha256`: calling this twice
    /// with the same hash returns the same id rather than erroring (spec
    /// section 9: no exception-driven control flow on duplicate content).
    async fn insert_raw_ingestion(&self, input: RawIngestionInput) -> Result<Uuid>;

    async fn raw_ingestion_by_sha256(&self, sha256: &str) -> Result<Option<StoredRawIngestion>>;

    /// Appends one extracted record for audit/replay. Never updated in
    /// place.
    async fn insert_extracted_entity(&self, raw_ingestion_id: Uuid, source: &str, entity: &ExtractedEntity) -> Result<Uuid>;

    /// Upsert by unique slug (spec section 3: "re-running the same request
    /// updates the same `Entity` row").
    async fn upsert_entity(&self, entity: &Entity) -> Result<Uuid>;

    async fn entity_by_slug(&self, slug: &str) -> Result<Option<Entity>>;

    async fn insert_failed_extraction(&self, input: FailedExtractionInput) -> Result<()>;
}
