//! MCP server registrations. `name` is the runtime toolgroup identifier
//! and is the key the sync job reconciles against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[ts(export)]
pub struct McpServer {
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub endpoint_url: String,
    /// JSON snapshot of the tool configuration, stored as text.
    pub configuration: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl McpServer {
    /// Parsed view of the configuration column.
    pub fn configuration_json(&self) -> Option<serde_json::Value> {
        self.configuration
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

#[derive(Debug, Clone)]
pub struct CreateMcpServer {
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub endpoint_url: String,
    pub configuration: Option<String>,
    pub created_by: Option<Uuid>,
}

impl McpServer {
    pub async fn create(pool: &SqlitePool, data: &CreateMcpServer) -> sqlx::Result<Self> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO mcp_servers (
                id, name, title, description, endpoint_url, configuration,
                created_by, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.endpoint_url)
        .bind(&data.configuration)
        .bind(data.created_by)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM mcp_servers WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &SqlitePool, name: &str) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM mcp_servers WHERE name = ? LIMIT 1")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as("SELECT * FROM mcp_servers ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &SqlitePool, id: Uuid, data: &CreateMcpServer) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            UPDATE mcp_servers
            SET name = ?, title = ?, description = ?, endpoint_url = ?,
                configuration = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.name)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.endpoint_url)
        .bind(&data.configuration)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM mcp_servers WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
