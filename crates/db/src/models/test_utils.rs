use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use super::user::{CreateUser, User, UserRole};

pub(crate) async fn setup_test_pool() -> SqlitePool {
    // One private in-memory database per test; a single connection keeps it
    // alive for the pool's lifetime.
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("invalid sqlite config")
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("failed to open sqlite memory db");

    bootstrap_schema(&pool).await;

    pool
}

async fn bootstrap_schema(pool: &SqlitePool) {
    let statements = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id BLOB PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user',
            created_at TEXT NOT NULL DEFAULT (datetime('now','subsec')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now','subsec'))
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS mcp_servers (
            id BLOB PRIMARY KEY,
            name TEXT NOT NULL,
            title TEXT NOT NULL,
            description TEXT,
            endpoint_url TEXT NOT NULL,
            configuration TEXT,
            created_by BLOB REFERENCES users(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now','subsec')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now','subsec'))
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS knowledge_bases (
            id BLOB PRIMARY KEY,
            name TEXT NOT NULL,
            version TEXT NOT NULL,
            embedding_model TEXT NOT NULL,
            provider_id TEXT,
            vector_db_name TEXT NOT NULL,
            is_external INTEGER NOT NULL DEFAULT 0,
            source TEXT,
            source_configuration TEXT,
            created_by BLOB REFERENCES users(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now','subsec')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now','subsec'))
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS virtual_assistants (
            id BLOB PRIMARY KEY,
            name TEXT NOT NULL,
            prompt TEXT NOT NULL,
            model_name TEXT NOT NULL,
            created_by BLOB REFERENCES users(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now','subsec')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now','subsec'))
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS virtual_assistant_knowledge_bases (
            virtual_assistant_id BLOB NOT NULL REFERENCES virtual_assistants(id) ON DELETE CASCADE,
            knowledge_base_id TEXT NOT NULL,
            PRIMARY KEY (virtual_assistant_id, knowledge_base_id)
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS virtual_assistant_tools (
            virtual_assistant_id BLOB NOT NULL REFERENCES virtual_assistants(id) ON DELETE CASCADE,
            tool_id TEXT NOT NULL,
            PRIMARY KEY (virtual_assistant_id, tool_id)
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS chat_history (
            id BLOB PRIMARY KEY,
            virtual_assistant_id BLOB REFERENCES virtual_assistants(id) ON DELETE SET NULL,
            user_id BLOB REFERENCES users(id) ON DELETE SET NULL,
            message TEXT NOT NULL,
            response TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now','subsec'))
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS guardrails (
            id BLOB PRIMARY KEY,
            name TEXT NOT NULL,
            rules TEXT NOT NULL,
            created_by BLOB REFERENCES users(id) ON DELETE SET NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now','subsec')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now','subsec'))
        );
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS model_servers (
            id BLOB PRIMARY KEY,
            name TEXT NOT NULL,
            provider_name TEXT NOT NULL,
            model_name TEXT NOT NULL,
            endpoint_url TEXT NOT NULL,
            token TEXT
        );
        "#,
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .expect("failed to bootstrap schema");
    }
}

pub(crate) async fn create_test_user(pool: &SqlitePool, username: &str) -> User {
    User::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$2b$test-hash".into(),
            role: UserRole::User,
        },
    )
    .await
    .expect("failed to create test user")
}
