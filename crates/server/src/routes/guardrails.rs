use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use chrono::{DateTime, Utc};
use db::models::guardrail::{CreateGuardrail, Guardrail};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/guardrails", post(create_guardrail))
        .route("/guardrails", get(list_guardrails))
        .route("/guardrails/{id}", get(get_guardrail))
        .route("/guardrails/{id}", put(update_guardrail))
        .route("/guardrails/{id}", delete(delete_guardrail))
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct GuardrailRequest {
    pub name: String,
    pub rules: serde_json::Value,
}

impl GuardrailRequest {
    fn into_create(self) -> CreateGuardrail {
        CreateGuardrail {
            name: self.name,
            rules: self.rules.to_string(),
            created_by: None,
        }
    }
}

#[derive(Debug, Serialize, TS)]
#[ts(export)]
pub struct GuardrailResponse {
    pub id: Uuid,
    pub name: String,
    pub rules: serde_json::Value,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Guardrail> for GuardrailResponse {
    fn from(guardrail: Guardrail) -> Self {
        let rules = guardrail
            .rules_json()
            .unwrap_or(serde_json::Value::Null);
        Self {
            id: guardrail.id,
            name: guardrail.name,
            rules,
            created_by: guardrail.created_by,
            created_at: guardrail.created_at,
            updated_at: guardrail.updated_at,
        }
    }
}

async fn create_guardrail(
    State(state): State<AppState>,
    ResponseJson(req): ResponseJson<GuardrailRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<GuardrailResponse>>), ApiError> {
    let guardrail = Guardrail::create(state.pool(), &req.into_create()).await?;
    Ok((
        StatusCode::CREATED,
        ResponseJson(ApiResponse::success(guardrail.into())),
    ))
}

async fn list_guardrails(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<GuardrailResponse>>>, ApiError> {
    let guardrails = Guardrail::find_all(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(
        guardrails.into_iter().map(Into::into).collect(),
    )))
}

async fn get_guardrail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<GuardrailResponse>>, ApiError> {
    let guardrail = Guardrail::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Guardrail not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(guardrail.into())))
}

async fn update_guardrail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ResponseJson(req): ResponseJson<GuardrailRequest>,
) -> Result<ResponseJson<ApiResponse<GuardrailResponse>>, ApiError> {
    if Guardrail::find_by_id(state.pool(), id).await?.is_none() {
        return Err(ApiError::NotFound("Guardrail not found".to_string()));
    }
    let guardrail = Guardrail::update(state.pool(), id, &req.into_create()).await?;
    Ok(ResponseJson(ApiResponse::success(guardrail.into())))
}

async fn delete_guardrail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = Guardrail::delete(state.pool(), id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Guardrail not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
