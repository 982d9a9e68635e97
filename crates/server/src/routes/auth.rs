use axum::{Router, extract::State, http::HeaderMap, response::Json as ResponseJson, routing::get};
use db::models::user::User;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError, middleware};

pub fn router() -> Router<AppState> {
    Router::new().route("/login", get(login))
}

/// GET /api/login - Resolve the proxied identity, provisioning a user on
/// first login
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<ResponseJson<ApiResponse<User>>, ApiError> {
    let user = middleware::get_or_create_user(&state, &headers).await?;
    Ok(ResponseJson(ApiResponse::success(user)))
}
