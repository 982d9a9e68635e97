use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use db::models::virtual_assistant::{
    AssistantComponents, CreateVirtualAssistant, VirtualAssistant, VirtualAssistantWithRelations,
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/virtual_assistants", post(create_virtual_assistant))
        .route("/virtual_assistants", get(list_virtual_assistants))
        .route("/virtual_assistants/{id}", get(get_virtual_assistant))
        .route("/virtual_assistants/{id}", put(update_virtual_assistant))
        .route("/virtual_assistants/{id}", delete(delete_virtual_assistant))
        .route(
            "/virtual_assistants/{id}/components",
            get(get_virtual_assistant_components),
        )
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct VirtualAssistantRequest {
    pub name: String,
    pub prompt: String,
    pub model_name: String,
    #[serde(default)]
    pub knowledge_base_ids: Vec<String>,
    #[serde(default)]
    pub tool_ids: Vec<String>,
}

impl VirtualAssistantRequest {
    fn into_create(self) -> CreateVirtualAssistant {
        CreateVirtualAssistant {
            name: self.name,
            prompt: self.prompt,
            model_name: self.model_name,
            created_by: None,
            knowledge_base_ids: self.knowledge_base_ids,
            tool_ids: self.tool_ids,
        }
    }
}

/// POST /api/virtual_assistants
async fn create_virtual_assistant(
    State(state): State<AppState>,
    ResponseJson(req): ResponseJson<VirtualAssistantRequest>,
) -> Result<
    (
        StatusCode,
        ResponseJson<ApiResponse<VirtualAssistantWithRelations>>,
    ),
    ApiError,
> {
    let assistant = VirtualAssistant::create(state.pool(), &req.into_create()).await?;
    let read = assistant.with_relations(state.pool()).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(read))))
}

/// GET /api/virtual_assistants
async fn list_virtual_assistants(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<VirtualAssistantWithRelations>>>, ApiError> {
    let assistants = VirtualAssistant::find_all(state.pool()).await?;

    let mut result = Vec::with_capacity(assistants.len());
    for assistant in &assistants {
        result.push(assistant.with_relations(state.pool()).await?);
    }

    Ok(ResponseJson(ApiResponse::success(result)))
}

/// GET /api/virtual_assistants/:id
async fn get_virtual_assistant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<VirtualAssistantWithRelations>>, ApiError> {
    let assistant = VirtualAssistant::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Virtual assistant not found".to_string()))?;
    let read = assistant.with_relations(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(read)))
}

/// PUT /api/virtual_assistants/:id - Update fields and replace both
/// association sets
async fn update_virtual_assistant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ResponseJson(req): ResponseJson<VirtualAssistantRequest>,
) -> Result<ResponseJson<ApiResponse<VirtualAssistantWithRelations>>, ApiError> {
    if VirtualAssistant::find_by_id(state.pool(), id).await?.is_none() {
        return Err(ApiError::NotFound("Virtual assistant not found".to_string()));
    }

    let assistant = VirtualAssistant::update(state.pool(), id, &req.into_create()).await?;
    let read = assistant.with_relations(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(read)))
}

/// DELETE /api/virtual_assistants/:id
async fn delete_virtual_assistant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = VirtualAssistant::delete(state.pool(), id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Virtual assistant not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/virtual_assistants/:id/components - Resolve the assistant's
/// model server, knowledge bases and tools
async fn get_virtual_assistant_components(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<AssistantComponents>>, ApiError> {
    let components = VirtualAssistant::resolve_components(state.pool(), id).await?;
    Ok(ResponseJson(ApiResponse::success(components)))
}
