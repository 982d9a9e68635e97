use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use db::models::mcp_server::{CreateMcpServer, McpServer};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, sync};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mcp_servers", post(create_mcp_server))
        .route("/mcp_servers", get(list_mcp_servers))
        .route("/mcp_servers/sync", post(sync_mcp_servers))
        .route("/mcp_servers/{id}", get(get_mcp_server))
        .route("/mcp_servers/{id}", put(update_mcp_server))
        .route("/mcp_servers/{id}", delete(delete_mcp_server))
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct McpServerRequest {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub endpoint_url: String,
    pub configuration: Option<serde_json::Value>,
}

impl McpServerRequest {
    fn into_create(self) -> CreateMcpServer {
        CreateMcpServer {
            name: self.name,
            title: self.title,
            description: self.description,
            endpoint_url: self.endpoint_url,
            configuration: self.configuration.map(|v| v.to_string()),
            created_by: None,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct McpServerResponse {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub endpoint_url: String,
    pub configuration: Option<serde_json::Value>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<McpServer> for McpServerResponse {
    fn from(server: McpServer) -> Self {
        let configuration = server.configuration_json();
        Self {
            id: server.id,
            name: server.name,
            title: server.title,
            description: server.description,
            endpoint_url: server.endpoint_url,
            configuration,
            created_by: server.created_by,
            created_at: server.created_at,
            updated_at: server.updated_at,
        }
    }
}

async fn create_mcp_server(
    State(state): State<AppState>,
    ResponseJson(req): ResponseJson<McpServerRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<McpServerResponse>>), ApiError> {
    let server = McpServer::create(state.pool(), &req.into_create()).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(server.into())),
    ))
}

async fn list_mcp_servers(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<McpServerResponse>>>, ApiError> {
    let servers = McpServer::find_all(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(
        servers.into_iter().map(Into::into).collect(),
    )))
}

async fn get_mcp_server(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<McpServerResponse>>, ApiError> {
    let server = McpServer::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Server not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(server.into())))
}

async fn update_mcp_server(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ResponseJson(req): ResponseJson<McpServerRequest>,
) -> Result<ResponseJson<ApiResponse<McpServerResponse>>, ApiError> {
    if McpServer::find_by_id(state.pool(), id).await?.is_none() {
        return Err(ApiError::NotFound("Server not found".to_string()));
    }
    let server = McpServer::update(state.pool(), id, &req.into_create()).await?;
    Ok(ResponseJson(ApiResponse::success(server.into())))
}

async fn delete_mcp_server(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = McpServer::delete(state.pool(), id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Server not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/mcp_servers/sync - Reconcile rows against the runtime's tool
/// listing
async fn sync_mcp_servers(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<McpServerResponse>>>, ApiError> {
    let servers = sync::sync_mcp_servers(&state).await?;
    Ok(ResponseJson(ApiResponse::success(
        servers.into_iter().map(Into::into).collect(),
    )))
}
