//! In-memory `Store` for orchestrator and CLI tests. No Postgres
//! required; mirrors `PostgresStore`'s upsert-by-slug and
//! idempotent-by-sha256 semantics with a couple of `Mutex<HashMap<..>>`s.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{FailedExtractionInput, RawIngestionInput, StoredRawIngestion};
use crate::repository::Store;
use scout_extract::ExtractedEntity;
use scout_merge::Entity;

#[derive(Default)]
pub struct FakeStore {
    raw_ingestions: Mutex<HashMap<Uuid, StoredRawIngestion>>,
    raw_ingestions_by_hash: Mutex<HashMap<String, Uuid>>,
    extracted_entities: Mutex<HashMap<Uuid, (Uuid, String, ExtractedEntity)>>,
    entities: Mutex<HashMap<String, Entity>>,
    failed_extractions: Mutex<Vec<FailedExtractionInput>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.lock().unwrap().len()
    }

    pub fn failed_extraction_count(&self) -> usize {
        self.failed_extractions.lock().unwrap().len()
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn insert_raw_ingestion(&self, input: RawIngestionInput) -> Result<Uuid> {
        if let Some(&existing) = self.raw_ingestions_by_hash.lock().unwrap().get(&input.sha256) {
            return Ok(existing);
        }
        let id = Uuid::new_v4();
        self.raw_ingestions_by_hash.lock().unwrap().insert(input.sha256.clone(), id);
        self.raw_ingestions.lock().unwrap().insert(
            id,
            StoredRawIngestion {
                id,
                source: input.source,
                url: input.url,
                fetched_at: input.fetched_at,
                sha256: input.sha256,
                payload: input.payload,
            },
        );
        Ok(id)
    }

    async fn raw_ingestion_by_sha256(&self, sha256: &str) -> Result<Option<StoredRawIngestion>> {
        let id = self.raw_ingestions_by_hash.lock().unwrap().get(sha256).copied();
        Ok(id.and_then(|id| self.raw_ingestions.lock().unwrap().get(&id).cloned()))
    }

    async fn insert_extracted_entity(&self, raw_ingestion_id: Uuid, source: &str, entity: &ExtractedEntity) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.extracted_entities
            .lock()
            .unwrap()
            .insert(id, (raw_ingestion_id, source.to_string(), entity.clone()));
        Ok(id)
    }

    async fn upsert_entity(&self, entity: &Entity) -> Result<Uuid> {
        self.entities.lock().unwrap().insert(entity.slug.clone(), entity.clone());
        Ok(Uuid::new_v4())
    }

    async fn entity_by_slug(&self, slug: &str) -> Result<Option<Entity>> {
        Ok(self.entities.lock().unwrap().get(slug).cloned())
    }

    async fn insert_failed_extraction(&self, input: FailedExtractionInput) -> Result<()> {
        self.failed_extractions.lock().unwrap().push(input);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scout_common::EntityClass;
    use scout_extract::Primitives;
    use serde_json::json;

    fn extracted() -> ExtractedEntity {
        ExtractedEntity::new(
            "google_places",
            "deadbeef",
            EntityClass::Place,
            Primitives::default(),
            serde_json::Map::new(),
            HashMap::new(),
        )
    }

    #[tokio::test]
    async fn raw_ingestion_insert_is_idempotent_on_sha256() {
        let store = FakeStore::new();
        let input = RawIngestionInput {
            source: "google_places".to_string(),
            url: "https://example/".to_string(),
            fetched_at: Utc::now(),
            sha256: "deadbeef".to_string(),
            payload: json!({}),
        };
        let first = store.insert_raw_ingestion(input.clone()).await.unwrap();
        let second = store.insert_raw_ingestion(input).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(store.raw_ingestions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn entity_upsert_replaces_by_slug() {
        let store = FakeStore::new();
        let entity = entity_with_slug("powerleague-portobello-ab12");
        store.upsert_entity(&entity).await.unwrap();
        store.upsert_entity(&entity).await.unwrap();
        assert_eq!(store.entity_count(), 1);
    }

    #[tokio::test]
    async fn insert_extracted_entity_is_append_only() {
        let store = FakeStore::new();
        let raw_id = store
            .insert_raw_ingestion(RawIngestionInput {
                source: "google_places".to_string(),
                url: "https://example/".to_string(),
                fetched_at: Utc::now(),
                sha256: "deadbeef".to_string(),
                payload: json!({}),
            })
            .await
            .unwrap();
        store.insert_extracted_entity(raw_id, "google_places", &extracted()).await.unwrap();
        store.insert_extracted_entity(raw_id, "google_places", &extracted()).await.unwrap();
        assert_eq!(store.extracted_entities.lock().unwrap().len(), 2);
    }

    fn entity_with_slug(slug: &str) -> Entity {
        Entity {
            slug: slug.to_string(),
            entity_class: EntityClass::Place,
            primitives: Primitives::default(),
            canonical_activities: Vec::new(),
            canonical_roles: Vec::new(),
            canonical_place_types: Vec::new(),
            canonical_access: Vec::new(),
            modules: HashMap::new(),
            external_ids: HashMap::new(),
            confidence_by_field: HashMap::new(),
            raw_observations: serde_json::Map::new(),
            source_info: HashMap::new(),
            discovered_by: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}
