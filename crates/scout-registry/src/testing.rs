//! Deterministic connector double for orchestrator/CLI integration tests.
//! No network, no real rate limiting surprises — mirrors the teacher
//! crate's own `MockFetcher`/`MockSignalReader` testing convention.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::adapter::{ConnectorFetch, ConnectorResponse};
use crate::error::SourceError;

/// A scripted response or failure for one connector, consumed in FIFO
/// order each time that connector is called.
pub enum Scripted {
    Response(ConnectorResponse),
    Fail(SourceError),
}

#[derive(Default)]
pub struct MockConnector {
    scripts: Mutex<HashMap<String, Vec<Scripted>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, connector: &str, url: &str, payload: serde_json::Value) {
        self.scripts
            .lock()
            .unwrap()
            .entry(connector.to_string())
            .or_default()
            .push(Scripted::Response(ConnectorResponse {
                url: url.to_string(),
                payload,
            }));
    }

    pub fn push_failure(&self, connector: &str, err: SourceError) {
        self.scripts
            .lock()
            .unwrap()
            .entry(connector.to_string())
            .or_default()
            .push(Scripted::Fail(err));
    }

    /// Script the same failure forever (e.g. a connector that is
    /// continuously rate-limited for the whole run).
    pub fn push_repeating_failure(&self, connector: &str, err: SourceError, times: usize) {
        for _ in 0..times {
            self.push_failure(connector, SourceError::new(err.kind, err.cause.clone()));
        }
    }
}

#[async_trait]
impl ConnectorFetch for MockConnector {
    async fn call(&self, connector: &str, _params: &serde_json::Value) -> Result<ConnectorResponse, SourceError> {
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts
            .get_mut(connector)
            .ok_or_else(|| SourceError::new(crate::error::SourceErrorKind::NotFound, format!("no script for {connector}")))?;
        if queue.is_empty() {
            return Err(SourceError::new(
                crate::error::SourceErrorKind::NotFound,
                format!("script exhausted for {connector}"),
            ));
        }
        match queue.remove(0) {
            Scripted::Response(r) => Ok(r),
            Scripted::Fail(e) => Err(e),
        }
    }
}
