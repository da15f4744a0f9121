//! Process bootstrap wiring: registry, extractors, structured-extract
//! backend, and store construction from `scout_common::Config` (spec
//! section 6). Connector registration is the one seam this binary leaves
//! empty — see [`crate::connectors::UnimplementedConnector`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use scout_common::Config;
use scout_extract::StructuredExtract;
use scout_lens::{LensContract, LensValidationError};
use scout_orchestrator::{ExtractorRegistry, Orchestrator};
use scout_registry::{Adapter, ConnectorRegistry};
use scout_store::{PostgresStore, Store};
use sqlx::postgres::PgPoolOptions;

use crate::connectors::UnimplementedConnector;
use crate::structured_extract::AnthropicStructuredExtract;

/// A structured-extract backend that always fails, used when no
/// credential is configured so a run that never triggers `llm_structured`
/// rules still succeeds, and one that does gets a clear cause.
struct NoStructuredExtractConfigured;

#[async_trait::async_trait]
impl StructuredExtract for NoStructuredExtractConfigured {
    async fn extract(
        &self,
        _schema: &serde_json::Value,
        _text: &str,
    ) -> Result<serde_json::Value, scout_extract::StructuredExtractError> {
        Err(scout_extract::StructuredExtractError(
            "no structured-extract credential configured (set ANTHROPIC_API_KEY)".to_string(),
        ))
    }
}

fn structured_extract_backend(config: &Config) -> Arc<dyn StructuredExtract> {
    match &config.anthropic_api_key {
        Some(key) => Arc::new(AnthropicStructuredExtract::new(key.clone())),
        None => Arc::new(NoStructuredExtractConfigured),
    }
}

pub async fn connect_store(database_url: &str) -> anyhow::Result<Arc<PostgresStore>> {
    let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
    let store = PostgresStore::new(pool);
    store.migrate().await?;
    Ok(Arc::new(store))
}

pub fn build_orchestrator(
    config: &Config,
    registry: ConnectorRegistry,
    store: Option<Arc<dyn Store>>,
) -> Orchestrator<UnimplementedConnector> {
    let adapter = Adapter::new(UnimplementedConnector);
    let extractors = ExtractorRegistry::new();
    let structured_extract = structured_extract_backend(config);

    Orchestrator::new(registry, adapter, extractors, structured_extract, store)
        .with_max_in_flight_per_phase(config.max_in_flight_per_phase)
        .with_strict_field_validation(config.strict_field_validation)
}

/// Maps a lens id to its document path (spec section 6's `load(lens_id)`)
/// under the convention `<lens_dir>/<lens_id>.yaml`.
pub fn lens_path(lens_dir: &Path, lens_id: &str) -> PathBuf {
    lens_dir.join(format!("{lens_id}.yaml"))
}

pub fn load_lens(lens_dir: &Path, lens_id: &str, registry: &ConnectorRegistry) -> Result<LensContract, LensValidationError> {
    scout_lens::load(&lens_path(lens_dir, lens_id), registry)
}
