use axum::{
    Extension, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::chat_history::{ChatHistory, CreateChatHistory};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::CurrentUser};

/// Routes for the calling user; wrapped in `require_auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/chat_history", post(create_chat_history))
        .route("/chat_history", get(list_chat_history))
        .route("/chat_history/{id}", get(get_chat_history))
        .route("/chat_history/{id}", delete(delete_chat_history))
}

/// Admin-only listing of every user's history; wrapped in `require_admin`.
pub fn admin_router() -> Router<AppState> {
    Router::new().route("/chat_history/admin/all", get(list_all_chat_history))
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct ChatHistoryRequest {
    pub virtual_assistant_id: Option<Uuid>,
    pub message: String,
    pub response: String,
}

/// POST /api/chat_history - Record an exchange for the current user
async fn create_chat_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ResponseJson(req): ResponseJson<ChatHistoryRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<ChatHistory>>), ApiError> {
    let record = ChatHistory::create(
        state.pool(),
        &CreateChatHistory {
            virtual_assistant_id: req.virtual_assistant_id,
            user_id: Some(user.id),
            message: req.message,
            response: req.response,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(record)),
    ))
}

/// GET /api/chat_history - Admins see everything, others only their own rows
async fn list_chat_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<ResponseJson<ApiResponse<Vec<ChatHistory>>>, ApiError> {
    let records = if user.is_admin() {
        ChatHistory::find_all(state.pool()).await?
    } else {
        ChatHistory::find_by_user(state.pool(), user.id).await?
    };
    Ok(ResponseJson(ApiResponse::success(records)))
}

/// GET /api/chat_history/:id
async fn get_chat_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<ChatHistory>>, ApiError> {
    let record = ChatHistory::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chat history not found".to_string()))?;

    if !user.is_admin() && record.user_id != Some(user.id) {
        return Err(ApiError::Forbidden(
            "You don't have access to this chat history".to_string(),
        ));
    }

    Ok(ResponseJson(ApiResponse::success(record)))
}

/// DELETE /api/chat_history/:id
async fn delete_chat_history(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let record = ChatHistory::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Chat history not found".to_string()))?;

    if !user.is_admin() && record.user_id != Some(user.id) {
        return Err(ApiError::Forbidden(
            "You don't have access to this chat history".to_string(),
        ));
    }

    ChatHistory::delete(state.pool(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/chat_history/admin/all
async fn list_all_chat_history(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<ChatHistory>>>, ApiError> {
    let records = ChatHistory::find_all(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(records)))
}
