//! Model server registrations: where each named model can be reached.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[ts(export)]
pub struct ModelServer {
    pub id: Uuid,
    pub name: String,
    pub provider_name: String,
    pub model_name: String,
    pub endpoint_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateModelServer {
    pub name: String,
    pub provider_name: String,
    pub model_name: String,
    pub endpoint_url: String,
    pub token: Option<String>,
}

impl ModelServer {
    pub async fn create(pool: &SqlitePool, data: &CreateModelServer) -> sqlx::Result<Self> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO model_servers (id, name, provider_name, model_name, endpoint_url, token)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.provider_name)
        .bind(&data.model_name)
        .bind(&data.endpoint_url)
        .bind(&data.token)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM model_servers WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &SqlitePool, name: &str) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM model_servers WHERE name = ?")
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Lookup used when wiring an assistant to its serving endpoint.
    pub async fn find_by_model_name(
        pool: &SqlitePool,
        model_name: &str,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM model_servers WHERE model_name = ? LIMIT 1")
            .bind(model_name)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as("SELECT * FROM model_servers ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &CreateModelServer,
    ) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            UPDATE model_servers
            SET name = ?, provider_name = ?, model_name = ?, endpoint_url = ?, token = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.name)
        .bind(&data.provider_name)
        .bind(&data.model_name)
        .bind(&data.endpoint_url)
        .bind(&data.token)
        .bind(id)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM model_servers WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_utils::setup_test_pool;

    #[tokio::test]
    async fn model_name_lookup_finds_registration() {
        let pool = setup_test_pool().await;

        ModelServer::create(
            &pool,
            &CreateModelServer {
                name: "granite".into(),
                provider_name: "vllm".into(),
                model_name: "granite-3.1-8b-instruct".into(),
                endpoint_url: "http://models.local:8000/v1".into(),
                token: None,
            },
        )
        .await
        .expect("create model server");

        let hit = ModelServer::find_by_model_name(&pool, "granite-3.1-8b-instruct")
            .await
            .expect("query")
            .expect("registration exists");
        assert_eq!(hit.provider_name, "vllm");

        assert!(ModelServer::find_by_model_name(&pool, "missing-model")
            .await
            .expect("query")
            .is_none());
    }
}
