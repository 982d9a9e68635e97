//! Chat streaming: resolve the assistant's components, open a streamed turn
//! on the agent runtime and serve the reformatted fragments as SSE.

use std::convert::Infallible;

use agent_client::{
    AgentConfig, AgentMode, ToolgroupSpec, TurnMessage, reformat_turn,
};
use axum::{
    Extension, Router,
    extract::State,
    response::{
        Json as ResponseJson,
        sse::{Event, Sse},
    },
    routing::post,
};
use db::models::virtual_assistant::{AssistantComponents, VirtualAssistant};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use ts_rs::TS;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::CurrentUser};

const ASSISTANT_INSTRUCTIONS: &str =
    "You are a helpful assistant. When you use a tool always respond with a summary of the result.";
const MAX_TOKENS: u32 = 512;
const RAG_TOOLGROUP: &str = "builtin::rag";

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat_stream))
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct ChatMessageInput {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct ChatRequest {
    pub virtual_assistant_id: Uuid,
    pub messages: Vec<ChatMessageInput>,
    #[serde(default)]
    pub session_id: Option<String>,
    /// "Regular" (default) or "ReAct".
    #[serde(default)]
    pub agent_mode: Option<String>,
}

/// POST /api/chat - One streamed turn against the assistant's agent.
///
/// Lookup failures (missing assistant, missing model server) fail the
/// request before any streaming begins; once the SSE stream is open every
/// problem degrades to an in-stream fragment.
async fn chat_stream(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ResponseJson(request): ResponseJson<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let prompt = request
        .messages
        .last()
        .map(|message| message.content.clone())
        .filter(|content| !content.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No messages provided".to_string()))?;

    let mode = request
        .agent_mode
        .as_deref()
        .map(str::parse::<AgentMode>)
        .transpose()
        .map_err(ApiError::BadRequest)?
        .unwrap_or_default();

    tracing::info!(
        "Chat request: assistant={}, user={}, mode={}, message_len={}",
        request.virtual_assistant_id,
        user.email,
        mode,
        prompt.len()
    );

    let components =
        VirtualAssistant::resolve_components(state.pool(), request.virtual_assistant_id).await?;

    let assistant = VirtualAssistant::find_by_id(state.pool(), request.virtual_assistant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Virtual assistant not found".to_string()))?;

    let mut config = AgentConfig::greedy(
        components.model_server.model_name.clone(),
        instructions_for(mode, &assistant.prompt),
        MAX_TOKENS,
    );
    if mode == AgentMode::ReAct {
        config.response_format = Some(react_response_format());
    }
    config.toolgroups = build_toolgroups(&state, &components).await;

    let agent_id = state.runtime.create_agent(&config).await?;
    let session_name = request
        .session_id
        .unwrap_or_else(|| format!("assistant_chat_{}", Uuid::new_v4()));
    let session_id = state
        .runtime
        .create_session(&agent_id, &session_name)
        .await?;

    let events = state
        .runtime
        .create_turn(&agent_id, &session_id, vec![TurnMessage::user(prompt)])
        .await?;

    let sse_stream = reformat_turn(mode, events)
        .map(|fragment| Ok::<_, Infallible>(Event::default().data(fragment)))
        .chain(futures::stream::once(async {
            Ok(Event::default().data("[DONE]"))
        }));

    Ok(Sse::new(sse_stream))
}

fn instructions_for(mode: AgentMode, assistant_prompt: &str) -> String {
    match mode {
        // ReAct agents are steered entirely by the response format.
        AgentMode::ReAct => String::new(),
        AgentMode::Regular if assistant_prompt.is_empty() => ASSISTANT_INSTRUCTIONS.to_string(),
        AgentMode::Regular => assistant_prompt.to_string(),
    }
}

/// JSON schema forcing ReAct agents to emit reasoning/action/answer steps.
fn react_response_format() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "type": "object",
            "properties": {
                "thought": {"type": "string"},
                "action": {
                    "type": ["object", "null"],
                    "properties": {
                        "tool_name": {"type": "string"},
                        "tool_params": {"type": "object"}
                    }
                },
                "answer": {"type": ["string", "null"]}
            },
            "required": ["thought", "action", "answer"]
        }
    })
}

/// Assemble the agent's toolgroups from the resolved components.
///
/// With no MCP tools wired there are no toolgroups at all, even when
/// knowledge bases exist. The RAG toolgroup is only attached when the
/// runtime actually advertises it.
async fn build_toolgroups(
    state: &AppState,
    components: &AssistantComponents,
) -> Vec<ToolgroupSpec> {
    let mcp_tools: Vec<String> = components
        .tools
        .iter()
        .map(|tool| tool.name.clone())
        .collect();

    if mcp_tools.is_empty() {
        return Vec::new();
    }

    let mut specs: Vec<ToolgroupSpec> = mcp_tools.into_iter().map(ToolgroupSpec::Name).collect();

    if !components.knowledge_bases.is_empty() {
        match state.runtime.list_toolgroups().await {
            Ok(groups) if groups.iter().any(|g| g.identifier == RAG_TOOLGROUP) => {
                let vector_db_ids: Vec<String> = components
                    .knowledge_bases
                    .iter()
                    .map(|kb| kb.vector_db_name.clone())
                    .collect();
                specs.push(ToolgroupSpec::WithArgs {
                    name: RAG_TOOLGROUP.to_string(),
                    args: serde_json::json!({ "vector_db_ids": vector_db_ids }),
                });
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Could not list runtime toolgroups: {}", e),
        }
    }

    specs
}
