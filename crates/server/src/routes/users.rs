use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use db::models::user::{CreateUser, UpdateUser, User, UserRole};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users", get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/users/{id}", put(update_user))
        .route("/users/{id}", delete(delete_user))
        .route("/users/username/{username}", get(get_user_by_username))
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Deserialize, TS)]
#[ts(export)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub role: UserRole,
}

/// POST /api/users - Register a user with a bcrypt-hashed password
async fn create_user(
    State(state): State<AppState>,
    ResponseJson(req): ResponseJson<CreateUserRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<User>>), ApiError> {
    if req.username.len() < 3 {
        return Err(ApiError::BadRequest(
            "Username must be at least 3 characters".to_string(),
        ));
    }
    if req.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    if User::find_by_username(state.pool(), &req.username)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Username already exists".to_string()));
    }
    if User::find_by_email(state.pool(), &req.email)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = db::services::AuthService::hash_password(&req.password)
        .map_err(|e| ApiError::InternalError(format!("Failed to hash password: {}", e)))?;

    let user = User::create(
        state.pool(),
        &CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(user))))
}

/// GET /api/users - List all users
async fn list_users(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<User>>>, ApiError> {
    let users = User::find_all(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

/// GET /api/users/:id
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = User::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// GET /api/users/username/:username
async fn get_user_by_username(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = User::find_by_username(state.pool(), &username)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    Ok(ResponseJson(ApiResponse::success(user)))
}

/// PUT /api/users/:id - Update profile fields; re-hash when a password is
/// supplied
async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ResponseJson(req): ResponseJson<UpdateUserRequest>,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    if User::find_by_id(state.pool(), id).await?.is_none() {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let password_hash = match &req.password {
        Some(password) => Some(
            db::services::AuthService::hash_password(password)
                .map_err(|e| ApiError::InternalError(format!("Failed to hash password: {}", e)))?,
        ),
        None => None,
    };

    let user = User::update(
        state.pool(),
        id,
        &UpdateUser {
            username: req.username,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?;

    Ok(ResponseJson(ApiResponse::success(user)))
}

/// DELETE /api/users/:id
async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let removed = User::delete(state.pool(), id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("User not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
