//! Postgres-backed `Store`. Mirrors the teacher's `ArchiveStore`: a thin
//! wrapper around a `PgPool`, one method per query, warn-and-continue for
//! writes that must never abort a run and explicit retry for the ones the
//! error taxonomy calls fatal-with-retry.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scout_common::EntityClass;
use scout_extract::{ExtractedEntity, Primitives};
use scout_merge::{Entity, SourceInfo};
use serde_json::json;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::model::{FailedExtractionInput, RawIngestionInput, StoredRawIngestion};
use crate::repository::Store;

const CONNECTIVITY_MAX_ATTEMPTS: u32 = 3;
const CONNECTIVITY_RETRY_BASE: Duration = Duration::from_millis(100);

fn is_connectivity_error(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed)
}

/// Retries a Postgres operation up to `CONNECTIVITY_MAX_ATTEMPTS` times with
/// exponential backoff when the failure looks like a connectivity issue.
/// Any other error returns immediately.
async fn with_connectivity_retry<T, F, Fut>(op: F) -> std::result::Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = std::result::Result<T, sqlx::Error>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt + 1 < CONNECTIVITY_MAX_ATTEMPTS && is_connectivity_error(&err) => {
                let backoff = CONNECTIVITY_RETRY_BASE * 3u32.pow(attempt);
                warn!(attempt = attempt + 1, ?backoff, error = %err, "database connectivity error, retrying");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn insert_raw_ingestion(&self, input: RawIngestionInput) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let won_id = with_connectivity_retry(|| async {
            sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO raw_ingestions (id, source, url, fetched_at, sha256, payload)
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (sha256) DO UPDATE SET sha256 = EXCLUDED.sha256
                RETURNING id
                "#,
            )
            .bind(id)
            .bind(&input.source)
            .bind(&input.url)
            .bind(input.fetched_at)
            .bind(&input.sha256)
            .bind(&input.payload)
            .fetch_one(&self.pool)
            .await
        })
        .await?;
        Ok(won_id)
    }

    async fn raw_ingestion_by_sha256(&self, sha256: &str) -> Result<Option<StoredRawIngestion>> {
        let row = sqlx::query_as::<_, StoredRawIngestion>(
            r#"SELECT id, source, url, fetched_at, sha256, payload FROM raw_ingestions WHERE sha256 = $1"#,
        )
        .bind(sha256)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_extracted_entity(&self, raw_ingestion_id: Uuid, source: &str, entity: &ExtractedEntity) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let primitives = serde_json::to_value(&entity.primitives)?;
        let dimensions = json!({
            "canonical_activities": entity.canonical_activities,
            "canonical_roles": entity.canonical_roles,
            "canonical_place_types": entity.canonical_place_types,
            "canonical_access": entity.canonical_access,
        });
        let modules = serde_json::to_value(&entity.modules)?;
        let external_ids = serde_json::to_value(&entity.external_ids)?;
        let confidence_by_field = serde_json::to_value(&entity.confidence_by_field)?;
        let raw_observations = serde_json::Value::Object(entity.raw_observations.clone());

        sqlx::query(
            r#"
            INSERT INTO extracted_entities
                (id, raw_ingestion_id, source, entity_class, primitives, dimensions,
                 modules, external_ids, confidence_by_field, raw_observations)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(id)
        .bind(raw_ingestion_id)
        .bind(source)
        .bind(entity.entity_class.to_string())
        .bind(&primitives)
        .bind(&dimensions)
        .bind(&modules)
        .bind(&external_ids)
        .bind(&confidence_by_field)
        .bind(&raw_observations)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn upsert_entity(&self, entity: &Entity) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let primitives = serde_json::to_value(&entity.primitives)?;
        let modules = serde_json::to_value(&entity.modules)?;
        let external_ids = serde_json::to_value(&entity.external_ids)?;
        let confidence_by_field = serde_json::to_value(&entity.confidence_by_field)?;
        let raw_observations = serde_json::Value::Object(entity.raw_observations.clone());
        let source_info = serde_json::to_value(&entity.source_info)?;

        let won_id = with_connectivity_retry(|| async {
            sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO entities
                    (id, slug, entity_class, primitives, canonical_activities, canonical_roles,
                     canonical_place_types, canonical_access, modules, external_ids,
                     confidence_by_field, raw_observations, source_info, discovered_by, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                ON CONFLICT (slug) DO UPDATE SET
                    entity_class = EXCLUDED.entity_class,
                    primitives = EXCLUDED.primitives,
                    canonical_activities = EXCLUDED.canonical_activities,
                    canonical_roles = EXCLUDED.canonical_roles,
                    canonical_place_types = EXCLUDED.canonical_place_types,
                    canonical_access = EXCLUDED.canonical_access,
                    modules = EXCLUDED.modules,
                    external_ids = EXCLUDED.external_ids,
                    confidence_by_field = EXCLUDED.confidence_by_field,
                    raw_observations = EXCLUDED.raw_observations,
                    source_info = EXCLUDED.source_info,
                    discovered_by = EXCLUDED.discovered_by,
                    updated_at = EXCLUDED.updated_at
                RETURNING id
                "#,
            )
            .bind(id)
            .bind(&entity.slug)
            .bind(entity.entity_class.to_string())
            .bind(&primitives)
            .bind(&entity.canonical_activities)
            .bind(&entity.canonical_roles)
            .bind(&entity.canonical_place_types)
            .bind(&entity.canonical_access)
            .bind(&modules)
            .bind(&external_ids)
            .bind(&confidence_by_field)
            .bind(&raw_observations)
            .bind(&source_info)
            .bind(&entity.discovered_by)
            .bind(entity.updated_at)
            .fetch_one(&self.pool)
            .await
        })
        .await?;

        Ok(won_id)
    }

    async fn entity_by_slug(&self, slug: &str) -> Result<Option<Entity>> {
        let row = sqlx::query_as::<_, EntityRow>(r#"SELECT * FROM entities WHERE slug = $1"#)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        row.map(EntityRow::into_entity).transpose()
    }

    async fn insert_failed_extraction(&self, input: FailedExtractionInput) -> Result<()> {
        let id = Uuid::new_v4();
        let result = sqlx::query(
            r#"
            INSERT INTO failed_extractions (id, raw_ingestion_id, rule_id, kind, message)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(input.raw_ingestion_id)
        .bind(&input.rule_id)
        .bind(&input.kind)
        .bind(&input.message)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            warn!(kind = %input.kind, error = %e, "failed to record failed extraction");
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct EntityRow {
    #[allow(dead_code)]
    id: Uuid,
    slug: String,
    entity_class: String,
    primitives: serde_json::Value,
    canonical_activities: Vec<String>,
    canonical_roles: Vec<String>,
    canonical_place_types: Vec<String>,
    canonical_access: Vec<String>,
    modules: serde_json::Value,
    external_ids: serde_json::Value,
    confidence_by_field: serde_json::Value,
    raw_observations: serde_json::Value,
    source_info: serde_json::Value,
    discovered_by: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl EntityRow {
    fn into_entity(self) -> Result<Entity> {
        let entity_class: EntityClass = self.entity_class.parse().map_err(StoreError::Decode)?;
        let primitives: Primitives = serde_json::from_value(self.primitives)?;
        let modules: HashMap<String, serde_json::Value> = serde_json::from_value(self.modules)?;
        let external_ids: HashMap<String, String> = serde_json::from_value(self.external_ids)?;
        let confidence_by_field: HashMap<String, f32> = serde_json::from_value(self.confidence_by_field)?;
        let raw_observations = self.raw_observations.as_object().cloned().unwrap_or_default();
        let source_info: HashMap<String, SourceInfo> = serde_json::from_value(self.source_info)?;

        Ok(Entity {
            slug: self.slug,
            entity_class,
            primitives,
            canonical_activities: self.canonical_activities,
            canonical_roles: self.canonical_roles,
            canonical_place_types: self.canonical_place_types,
            canonical_access: self.canonical_access,
            modules,
            external_ids,
            confidence_by_field,
            raw_observations,
            source_info,
            discovered_by: self.discovered_by,
            updated_at: self.updated_at,
        })
    }
}
