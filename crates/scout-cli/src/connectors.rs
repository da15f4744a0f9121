//! Bootstrap-time connector wiring. Concrete HTTP connectors are an
//! external collaborator (spec section 1) — this binary ships the seam,
//! not their business logic. [`UnimplementedConnector`] is the fetcher
//! plugged in until a real one is registered; every call fails with
//! `NotFound` so a misconfigured lens fails loudly instead of silently
//! returning empty results.

use async_trait::async_trait;
use scout_registry::adapter::{ConnectorFetch, ConnectorResponse};
use scout_registry::error::{SourceError, SourceErrorKind};

#[derive(Default)]
pub struct UnimplementedConnector;

#[async_trait]
impl ConnectorFetch for UnimplementedConnector {
    async fn call(&self, connector: &str, _params: &serde_json::Value) -> Result<ConnectorResponse, SourceError> {
        Err(SourceError::new(
            SourceErrorKind::NotFound,
            format!("no concrete connector wired for {connector}; register one in scout-cli::connectors"),
        ))
    }
}
