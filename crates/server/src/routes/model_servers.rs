use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use db::models::model_server::{CreateModelServer, ModelServer};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, sync};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/model_servers", post(create_model_server))
        .route("/model_servers", get(list_model_servers))
        .route("/model_servers/sync", post(sync_model_servers))
        .route("/model_servers/{id}", get(get_model_server))
        .route("/model_servers/{id}", put(update_model_server))
        .route("/model_servers/{id}", delete(delete_model_server))
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct ModelServerRequest {
    pub name: String,
    pub provider_name: String,
    pub model_name: String,
    pub endpoint_url: String,
    pub token: Option<String>,
}

impl ModelServerRequest {
    fn into_create(self) -> CreateModelServer {
        CreateModelServer {
            name: self.name,
            provider_name: self.provider_name,
            model_name: self.model_name,
            endpoint_url: self.endpoint_url,
            token: self.token,
        }
    }
}

async fn create_model_server(
    State(state): State<AppState>,
    ResponseJson(req): ResponseJson<ModelServerRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<ModelServer>>), ApiError> {
    let server = ModelServer::create(state.pool(), &req.into_create()).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(server)),
    ))
}

async fn list_model_servers(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<ModelServer>>>, ApiError> {
    let servers = ModelServer::find_all(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(servers)))
}

async fn get_model_server(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<ModelServer>>, ApiError> {
    let server = ModelServer::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Server not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(server)))
}

async fn update_model_server(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ResponseJson(req): ResponseJson<ModelServerRequest>,
) -> Result<ResponseJson<ApiResponse<ModelServer>>, ApiError> {
    if ModelServer::find_by_id(state.pool(), id).await?.is_none() {
        return Err(ApiError::NotFound("Server not found".to_string()));
    }
    let server = ModelServer::update(state.pool(), id, &req.into_create()).await?;
    Ok(ResponseJson(ApiResponse::success(server)))
}

async fn delete_model_server(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = ModelServer::delete(state.pool(), id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Server not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/model_servers/sync - Reconcile rows against the runtime's
/// model catalog
async fn sync_model_servers(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<ModelServer>>>, ApiError> {
    let servers = sync::sync_model_servers(&state).await?;
    Ok(ResponseJson(ApiResponse::success(servers)))
}
