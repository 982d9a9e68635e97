//! Thin pass-throughs over the agent runtime's catalog. Connectivity
//! failures surface as 502 via the `RuntimeError` conversion.

use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use agent_client::ModelSummary;
use serde::Serialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/runtime/llms", get(get_llms))
        .route("/runtime/embedding_models", get(get_embedding_models))
        .route("/runtime/safety_models", get(get_safety_models))
        .route("/runtime/shields", get(get_shields))
        .route("/runtime/knowledge_bases", get(get_knowledge_bases))
        .route("/runtime/mcp_servers", get(get_mcp_servers))
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RuntimeModel {
    pub id: String,
    pub name: Option<String>,
    pub model_type: Option<String>,
}

impl From<ModelSummary> for RuntimeModel {
    fn from(model: ModelSummary) -> Self {
        Self {
            id: model.identifier,
            name: model.provider_resource_id,
            model_type: model.model_type,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RuntimeKnowledgeBase {
    pub id: String,
    pub name: Option<String>,
    pub provider_id: Option<String>,
    pub embedding_model: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RuntimeToolgroup {
    pub id: String,
    pub name: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct RuntimeShield {
    pub id: String,
    pub name: Option<String>,
}

async fn get_llms(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<RuntimeModel>>>, ApiError> {
    let models = state.runtime.list_models().await?;
    let llms = models
        .into_iter()
        .filter(ModelSummary::is_llm)
        .map(Into::into)
        .collect();
    Ok(ResponseJson(ApiResponse::success(llms)))
}

async fn get_embedding_models(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<RuntimeModel>>>, ApiError> {
    let models = state.runtime.list_models().await?;
    let embeddings = models
        .into_iter()
        .filter(ModelSummary::is_embedding)
        .map(Into::into)
        .collect();
    Ok(ResponseJson(ApiResponse::success(embeddings)))
}

async fn get_safety_models(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<RuntimeModel>>>, ApiError> {
    let models = state.runtime.list_models().await?;
    let safety = models
        .into_iter()
        .filter(ModelSummary::is_safety)
        .map(Into::into)
        .collect();
    Ok(ResponseJson(ApiResponse::success(safety)))
}

async fn get_shields(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<RuntimeShield>>>, ApiError> {
    let shields = state.runtime.list_shields().await?;
    let shields = shields
        .into_iter()
        .map(|shield| RuntimeShield {
            id: shield.identifier,
            name: shield.provider_resource_id,
        })
        .collect();
    Ok(ResponseJson(ApiResponse::success(shields)))
}

async fn get_knowledge_bases(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<RuntimeKnowledgeBase>>>, ApiError> {
    let vector_dbs = state.runtime.list_vector_dbs().await?;
    let kbs = vector_dbs
        .into_iter()
        .map(|db| RuntimeKnowledgeBase {
            id: db.identifier,
            name: db.provider_resource_id,
            provider_id: db.provider_id,
            embedding_model: db.embedding_model,
        })
        .collect();
    Ok(ResponseJson(ApiResponse::success(kbs)))
}

async fn get_mcp_servers(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<RuntimeToolgroup>>>, ApiError> {
    let toolgroups = state.runtime.list_toolgroups().await?;
    let servers = toolgroups
        .into_iter()
        .map(|group| RuntimeToolgroup {
            id: group.identifier,
            name: group.provider_resource_id,
            title: group.provider_id,
        })
        .collect();
    Ok(ResponseJson(ApiResponse::success(servers)))
}
