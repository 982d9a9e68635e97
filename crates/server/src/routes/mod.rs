use axum::{Router, middleware, routing::get};
use tower_http::cors::CorsLayer;

use crate::{AppState, middleware as app_middleware};

pub mod auth;
pub mod chat;
pub mod chat_history;
pub mod frontend;
pub mod guardrails;
pub mod health;
pub mod knowledge_bases;
pub mod mcp_servers;
pub mod model_servers;
pub mod runtime;
pub mod users;
pub mod virtual_assistants;

pub fn router(state: AppState) -> Router {
    // User management and the global history listing are admin-only.
    let admin_routes = Router::new()
        .merge(users::router())
        .merge(chat_history::admin_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth::require_admin,
        ));

    // Chat and per-user history need an authenticated caller.
    let authed_routes = Router::new()
        .merge(chat::router())
        .merge(chat_history::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth::require_auth,
        ));

    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .merge(auth::router())
        .merge(virtual_assistants::router())
        .merge(knowledge_bases::router())
        .merge(mcp_servers::router())
        .merge(model_servers::router())
        .merge(guardrails::router())
        .merge(runtime::router())
        .merge(authed_routes)
        .merge(admin_routes)
        .with_state(state);

    Router::new()
        .route("/", get(frontend::serve_frontend_root))
        .route("/{*path}", get(frontend::serve_frontend))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use agent_client::RuntimeClient;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use db::DBService;
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    use super::router;
    use crate::AppState;

    async fn test_state() -> AppState {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");

        AppState {
            db: DBService { pool },
            runtime: Arc::new(RuntimeClient::new("http://localhost:1")),
        }
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let app = router(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_paths_fall_back_to_the_spa_shell() {
        let app = router(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/assistants/some-client-route")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(content_type.starts_with("text/html"));
    }

    #[tokio::test]
    async fn chat_history_requires_identity_headers() {
        let app = router(test_state().await);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/chat_history")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
