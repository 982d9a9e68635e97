//! Knowledge base registrations. `vector_db_name` is the runtime vector
//! store identifier that assistants reference in their associations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[ts(export)]
pub struct KnowledgeBase {
    pub id: Uuid,
    pub name: String,
    pub version: String,
    pub embedding_model: String,
    pub provider_id: Option<String>,
    pub vector_db_name: String,
    pub is_external: bool,
    pub source: Option<String>,
    /// JSON ingestion configuration, stored as text.
    pub source_configuration: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeBase {
    pub fn source_configuration_json(&self) -> Option<serde_json::Value> {
        self.source_configuration
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }
}

#[derive(Debug, Clone)]
pub struct CreateKnowledgeBase {
    pub name: String,
    pub version: String,
    pub embedding_model: String,
    pub provider_id: Option<String>,
    pub vector_db_name: String,
    pub is_external: bool,
    pub source: Option<String>,
    pub source_configuration: Option<String>,
    pub created_by: Option<Uuid>,
}

impl KnowledgeBase {
    pub async fn create(pool: &SqlitePool, data: &CreateKnowledgeBase) -> sqlx::Result<Self> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO knowledge_bases (
                id, name, version, embedding_model, provider_id, vector_db_name,
                is_external, source, source_configuration, created_by, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.version)
        .bind(&data.embedding_model)
        .bind(&data.provider_id)
        .bind(&data.vector_db_name)
        .bind(data.is_external)
        .bind(&data.source)
        .bind(&data.source_configuration)
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
        sqlx::query_as("SELECT * FROM knowledge_bases WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_vector_db_name(
        pool: &SqlitePool,
        vector_db_name: &str,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM knowledge_bases WHERE vector_db_name = ? LIMIT 1")
            .bind(vector_db_name)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as("SELECT * FROM knowledge_bases ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &CreateKnowledgeBase,
    ) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            UPDATE knowledge_bases
            SET name = ?, version = ?, embedding_model = ?, provider_id = ?,
                vector_db_name = ?, is_external = ?, source = ?,
                source_configuration = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.name)
        .bind(&data.version)
        .bind(&data.embedding_model)
        .bind(&data.provider_id)
        .bind(&data.vector_db_name)
        .bind(data.is_external)
        .bind(&data.source)
        .bind(&data.source_configuration)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM knowledge_bases WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
