use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::structured_extract::{StructuredExtract, StructuredExtractError};

/// Deterministic test double for [`StructuredExtract`]. Responses are
/// scripted per call, FIFO, mirroring `scout_registry::testing::MockConnector`.
#[derive(Default)]
pub struct MockStructuredExtract {
    responses: Mutex<VecDeque<Result<serde_json::Value, String>>>,
}

impl MockStructuredExtract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, value: serde_json::Value) {
        self.responses.lock().unwrap().push_back(Ok(value));
    }

    pub fn push_failure(&self, cause: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Err(cause.into()));
    }
}

#[async_trait]
impl StructuredExtract for MockStructuredExtract {
    async fn extract(
        &self,
        _schema: &serde_json::Value,
        _text: &str,
    ) -> Result<serde_json::Value, StructuredExtractError> {
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(value)) => Ok(value),
            Some(Err(cause)) => Err(StructuredExtractError(cause)),
            None => Err(StructuredExtractError("no scripted response left".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn returns_scripted_responses_in_order() {
        let mock = MockStructuredExtract::new();
        mock.push_response(json!({"capacity": 40}));
        mock.push_failure("model unavailable");

        let first = mock.extract(&json!({}), "text").await.unwrap();
        assert_eq!(first, json!({"capacity": 40}));

        let second = mock.extract(&json!({}), "text").await;
        assert!(second.is_err());
    }
}
