use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use db::models::knowledge_base::{CreateKnowledgeBase, KnowledgeBase};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/knowledge_bases", post(create_knowledge_base))
        .route("/knowledge_bases", get(list_knowledge_bases))
        .route("/knowledge_bases/{id}", get(get_knowledge_base))
        .route("/knowledge_bases/{id}", put(update_knowledge_base))
        .route("/knowledge_bases/{id}", delete(delete_knowledge_base))
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct KnowledgeBaseRequest {
    pub name: String,
    pub version: String,
    pub embedding_model: String,
    pub provider_id: Option<String>,
    pub vector_db_name: String,
    #[serde(default)]
    pub is_external: bool,
    pub source: Option<String>,
    pub source_configuration: Option<serde_json::Value>,
}

impl KnowledgeBaseRequest {
    fn into_create(self) -> CreateKnowledgeBase {
        CreateKnowledgeBase {
            name: self.name,
            version: self.version,
            embedding_model: self.embedding_model,
            provider_id: self.provider_id,
            vector_db_name: self.vector_db_name,
            is_external: self.is_external,
            source: self.source,
            source_configuration: self.source_configuration.map(|v| v.to_string()),
            created_by: None,
        }
    }
}

/// Read shape with the configuration column parsed back into JSON.
#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct KnowledgeBaseResponse {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub embedding_model: String,
    pub provider_id: Option<String>,
    pub vector_db_name: String,
    pub is_external: bool,
    pub source: Option<String>,
    pub source_configuration: Option<serde_json::Value>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<KnowledgeBase> for KnowledgeBaseResponse {
    fn from(kb: KnowledgeBase) -> Self {
        let source_configuration = kb.source_configuration_json();
        Self {
            id: kb.id,
            name: kb.name,
            version: kb.version,
            embedding_model: kb.embedding_model,
            provider_id: kb.provider_id,
            vector_db_name: kb.vector_db_name,
            is_external: kb.is_external,
            source: kb.source,
            source_configuration,
            created_by: kb.created_by,
            created_at: kb.created_at,
            updated_at: kb.updated_at,
        }
    }
}

async fn create_knowledge_base(
    State(state): State<AppState>,
    ResponseJson(req): ResponseJson<KnowledgeBaseRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<KnowledgeBaseResponse>>), ApiError> {
    let kb = KnowledgeBase::create(state.pool(), &req.into_create()).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(kb.into())),
    ))
}

async fn list_knowledge_bases(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<KnowledgeBaseResponse>>>, ApiError> {
    let kbs = KnowledgeBase::find_all(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(
        kbs.into_iter().map(Into::into).collect(),
    )))
}

async fn get_knowledge_base(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<KnowledgeBaseResponse>>, ApiError> {
    let kb = KnowledgeBase::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Knowledge base not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(kb.into())))
}

async fn update_knowledge_base(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ResponseJson(req): ResponseJson<KnowledgeBaseRequest>,
) -> Result<ResponseJson<ApiResponse<KnowledgeBaseResponse>>, ApiError> {
    if KnowledgeBase::find_by_id(state.pool(), id).await?.is_none() {
        return Err(ApiError::NotFound("Knowledge base not found".to_string()));
    }
    let kb = KnowledgeBase::update(state.pool(), id, &req.into_create()).await?;
    Ok(ResponseJson(ApiResponse::success(kb.into())))
}

async fn delete_knowledge_base(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = KnowledgeBase::delete(state.pool(), id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Knowledge base not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
