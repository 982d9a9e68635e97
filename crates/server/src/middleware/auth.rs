//! Identity resolution from OAuth proxy headers.
//!
//! Production requests arrive behind an OAuth proxy that forwards the user
//! identity in headers. `DEV_MODE=true` bypasses the headers entirely and
//! yields a configurable local user without touching the database.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use db::models::user::{CreateUser, User, UserRole};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Identity headers in precedence order.
const FORWARDED_IDENTITY_HEADERS: [&str; 4] = [
    "x-forwarded-email",
    "x-auth-request-email",
    "x-forwarded-user",
    "x-auth-request-user",
];

/// Authenticated user attached to the request by the auth middleware.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

pub fn is_dev_mode() -> bool {
    matches!(
        std::env::var("DEV_MODE").unwrap_or_default().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn parse_dev_role(raw: &str) -> UserRole {
    // An invalid DEV_USER_ROLE falls back to admin, matching the dev-mode
    // default.
    raw.parse().unwrap_or(UserRole::Admin)
}

pub fn dev_user() -> User {
    let now = Utc::now();
    User {
        id: Uuid::new_v4(),
        username: std::env::var("DEV_USER_USERNAME").unwrap_or_else(|_| "dev-user".to_string()),
        email: std::env::var("DEV_USER_EMAIL").unwrap_or_else(|_| "dev@example.com".to_string()),
        password_hash: String::new(),
        role: parse_dev_role(
            &std::env::var("DEV_USER_ROLE").unwrap_or_else(|_| "admin".to_string()),
        ),
        created_at: now,
        updated_at: now,
    }
}

/// First non-empty identity header, trimmed.
pub fn forwarded_identity(headers: &HeaderMap) -> Option<String> {
    FORWARDED_IDENTITY_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}

pub async fn get_current_user(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    if is_dev_mode() {
        return Ok(dev_user());
    }

    let email = forwarded_identity(headers).ok_or_else(|| {
        ApiError::Unauthorized("Not authenticated - no user information in headers".to_string())
    })?;

    User::find_by_email(state.pool(), &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Resolve the identity, provisioning a first-time user with the default
/// role. Backs the login endpoint.
pub async fn get_or_create_user(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    if is_dev_mode() {
        return Ok(dev_user());
    }

    let email = forwarded_identity(headers).ok_or_else(|| {
        ApiError::Unauthorized("Not authenticated - no user information in headers".to_string())
    })?;

    if let Some(user) = User::find_by_email(state.pool(), &email).await? {
        return Ok(user);
    }

    tracing::info!("Provisioning first-time user {}", email);
    let user = User::create(
        state.pool(),
        &CreateUser {
            username: email.clone(),
            email,
            password_hash: String::new(),
            role: UserRole::User,
        },
    )
    .await?;

    Ok(user)
}

/// Middleware requiring an authenticated user; attaches `CurrentUser`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = get_current_user(&state, req.headers()).await?;
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Middleware requiring the admin role; attaches `CurrentUser`.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = get_current_user(&state, req.headers()).await?;
    let mode = if is_dev_mode() { "DEV" } else { "PROD" };

    if !user.is_admin() {
        tracing::warn!(
            "[{}] Access denied: user={}, role={}",
            mode,
            user.email,
            user.role
        );
        return Err(ApiError::Forbidden(
            "User does not have the right privileges".to_string(),
        ));
    }

    tracing::info!(
        "[{}] Access granted: user={}, role={}",
        mode,
        user.email,
        user.role
    );
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}
