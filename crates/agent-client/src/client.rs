//! HTTP client for the agent runtime.
//!
//! One instance is built at startup and passed around explicitly; nothing in
//! here is process-global. Catalog endpoints return either bare arrays or a
//! `{"data": [...]}` envelope depending on the runtime version, so both are
//! accepted.

use std::pin::Pin;

use futures::{Stream, StreamExt, pin_mut};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::events::{EventPayload, TurnEvent};

const RUNTIME_URL_ENV: &str = "AGENT_RUNTIME_URL";
const DEFAULT_RUNTIME_URL: &str = "http://localhost:8321";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Runtime API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Response parse error: {0}")]
    Parse(String),
}

/// Model as listed by the runtime catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSummary {
    pub identifier: String,
    #[serde(default)]
    pub provider_resource_id: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub model_type: Option<String>,
}

impl ModelSummary {
    pub fn is_llm(&self) -> bool {
        self.model_type.as_deref() == Some("llm")
    }

    pub fn is_embedding(&self) -> bool {
        self.model_type.as_deref() == Some("embedding")
    }

    pub fn is_safety(&self) -> bool {
        self.model_type.as_deref() == Some("safety")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolgroupSummary {
    pub identifier: String,
    #[serde(default)]
    pub provider_resource_id: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDbSummary {
    pub identifier: String,
    #[serde(default)]
    pub provider_resource_id: Option<String>,
    #[serde(default)]
    pub provider_id: Option<String>,
    #[serde(default)]
    pub embedding_model: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldSummary {
    pub identifier: String,
    #[serde(default)]
    pub provider_resource_id: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

/// A tool entry in an agent configuration: either a bare toolgroup
/// identifier or an identifier with arguments (the RAG toolgroup carries
/// its vector store ids this way).
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolgroupSpec {
    Name(String),
    WithArgs { name: String, args: Value },
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentConfig {
    pub model: String,
    pub instructions: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub toolgroups: Vec<ToolgroupSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
    pub sampling_params: Value,
    pub max_infer_iters: u32,
}

impl AgentConfig {
    /// Greedy sampling with a token cap, the only strategy the chat layer
    /// asks for.
    pub fn greedy(model: String, instructions: String, max_tokens: u32) -> Self {
        Self {
            model,
            instructions,
            toolgroups: Vec::new(),
            response_format: None,
            sampling_params: serde_json::json!({
                "strategy": {"type": "greedy"},
                "max_tokens": max_tokens,
            }),
            max_infer_iters: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnMessage {
    pub role: String,
    pub content: String,
}

impl TurnMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

pub struct RuntimeClient {
    client: reqwest::Client,
    base_url: String,
}

impl RuntimeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn from_env() -> Self {
        let base_url =
            std::env::var(RUNTIME_URL_ENV).unwrap_or_else(|_| DEFAULT_RUNTIME_URL.to_string());
        tracing::info!("Agent runtime endpoint: {}", base_url);
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_catalog(&self, path: &str) -> Result<Vec<Value>, RuntimeError> {
        let response = self.client.get(self.url(path)).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RuntimeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RuntimeError::Parse(e.to_string()))?;
        Ok(extract_data_array(body))
    }

    pub async fn list_models(&self) -> Result<Vec<ModelSummary>, RuntimeError> {
        deserialize_entries(self.get_catalog("/v1/models").await?)
    }

    pub async fn list_toolgroups(&self) -> Result<Vec<ToolgroupSummary>, RuntimeError> {
        deserialize_entries(self.get_catalog("/v1/toolgroups").await?)
    }

    /// Raw tool listing; the sync job snapshots arbitrary per-tool metadata
    /// so this stays untyped.
    pub async fn list_tools(&self) -> Result<Vec<Value>, RuntimeError> {
        self.get_catalog("/v1/tools").await
    }

    pub async fn list_vector_dbs(&self) -> Result<Vec<VectorDbSummary>, RuntimeError> {
        deserialize_entries(self.get_catalog("/v1/vector-dbs").await?)
    }

    pub async fn list_shields(&self) -> Result<Vec<ShieldSummary>, RuntimeError> {
        deserialize_entries(self.get_catalog("/v1/shields").await?)
    }

    pub async fn create_agent(&self, config: &AgentConfig) -> Result<String, RuntimeError> {
        let response = self
            .client
            .post(self.url("/v1/agents"))
            .json(&serde_json::json!({ "agent_config": config }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RuntimeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RuntimeError::Parse(e.to_string()))?;
        body.get("agent_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RuntimeError::Parse("agent_id missing from response".to_string()))
    }

    pub async fn create_session(
        &self,
        agent_id: &str,
        session_name: &str,
    ) -> Result<String, RuntimeError> {
        let response = self
            .client
            .post(self.url(&format!("/v1/agents/{agent_id}/session")))
            .json(&serde_json::json!({ "session_name": session_name }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RuntimeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| RuntimeError::Parse(e.to_string()))?;
        body.get("session_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| RuntimeError::Parse("session_id missing from response".to_string()))
    }

    /// Open a streamed turn and surface its SSE chunks as `TurnEvent`s.
    ///
    /// Chunks we cannot decode become payload-less events rather than stream
    /// errors; the reformatter decides what a missing payload means for the
    /// active mode. A transport error mid-stream ends the sequence.
    pub async fn create_turn(
        &self,
        agent_id: &str,
        session_id: &str,
        messages: Vec<TurnMessage>,
    ) -> Result<Pin<Box<dyn Stream<Item = TurnEvent> + Send>>, RuntimeError> {
        let response = self
            .client
            .post(self.url(&format!(
                "/v1/agents/{agent_id}/session/{session_id}/turn"
            )))
            .json(&serde_json::json!({ "messages": messages, "stream": true }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RuntimeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let byte_stream = response.bytes_stream();

        let stream = async_stream::stream! {
            pin_mut!(byte_stream);
            let mut buffer = String::new();

            while let Some(chunk) = byte_stream.next().await {
                match chunk {
                    Ok(bytes) => {
                        buffer.push_str(&String::from_utf8_lossy(&bytes));

                        while let Some(newline) = buffer.find('\n') {
                            let line = buffer[..newline].trim().to_string();
                            buffer.drain(..=newline);

                            if let Some(data) = line.strip_prefix("data: ") {
                                if data == "[DONE]" {
                                    return;
                                }
                                yield parse_turn_chunk(data);
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Turn stream transport error: {}", e);
                        return;
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Catalog responses are either `[...]` or `{"data": [...]}`.
fn extract_data_array(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn deserialize_entries<T: serde::de::DeserializeOwned>(
    entries: Vec<Value>,
) -> Result<Vec<T>, RuntimeError> {
    entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value(entry).map_err(|e| RuntimeError::Parse(e.to_string()))
        })
        .collect()
}

/// Decode one SSE data payload into a turn event.
fn parse_turn_chunk(data: &str) -> TurnEvent {
    #[derive(Deserialize)]
    struct Envelope {
        #[serde(default)]
        event: Option<EventBody>,
    }

    #[derive(Deserialize)]
    struct EventBody {
        #[serde(default)]
        payload: Option<EventPayload>,
    }

    let payload = serde_json::from_str::<Envelope>(data)
        .ok()
        .and_then(|envelope| envelope.event)
        .and_then(|event| event.payload);

    if payload.is_none() {
        tracing::warn!("Turn chunk without a usable payload: {}", data);
    }

    TurnEvent {
        payload,
        raw: Some(data.to_string()),
    }
}
