//! Real `llm_structured` backend (spec section 4.5's injected
//! `StructuredExtract` capability). Mirrors the teacher's `ai-client`
//! Claude client: a thin `reqwest` wrapper around the Messages API,
//! forcing a single tool call whose input schema is the combined schema
//! for one module's `llm_structured` field rules.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use scout_extract::{StructuredExtract, StructuredExtractError};
use serde_json::json;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const STRUCTURED_EXTRACT_TOOL: &str = "emit_structured_extract";

pub struct AnthropicStructuredExtract {
    api_key: String,
    http: reqwest::Client,
    model: String,
}

impl AnthropicStructuredExtract {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            http: reqwest::Client::new(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, StructuredExtractError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|e| StructuredExtractError(e.to_string()))?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl StructuredExtract for AnthropicStructuredExtract {
    async fn extract(&self, schema: &serde_json::Value, text: &str) -> Result<serde_json::Value, StructuredExtractError> {
        let body = json!({
            "model": self.model,
            "max_tokens": 1024,
            "messages": [{"role": "user", "content": text}],
            "tools": [{
                "name": STRUCTURED_EXTRACT_TOOL,
                "description": "Emit the fields requested by the extraction schema.",
                "input_schema": schema,
            }],
            "tool_choice": {"type": "tool", "name": STRUCTURED_EXTRACT_TOOL},
        });

        let response = self
            .http
            .post(ANTHROPIC_API_URL)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| StructuredExtractError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(StructuredExtractError(format!("anthropic api error ({status}): {text}")));
        }

        let payload: serde_json::Value = response.json().await.map_err(|e| StructuredExtractError(e.to_string()))?;
        let tool_input = payload["content"]
            .as_array()
            .and_then(|blocks| blocks.iter().find(|b| b["type"] == "tool_use"))
            .map(|b| b["input"].clone())
            .ok_or_else(|| StructuredExtractError("anthropic response contained no tool_use block".to_string()))?;

        Ok(tool_input)
    }
}
