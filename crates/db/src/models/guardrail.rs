use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[ts(export)]
pub struct Guardrail {
    pub id: Uuid,
    pub name: String,
    /// JSON rule document, stored as text.
    pub rules: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Guardrail {
    pub fn rules_json(&self) -> Option<serde_json::Value> {
        serde_json::from_str(&self.rules).ok()
    }
}

#[derive(Debug, Clone)]
pub struct CreateGuardrail {
    pub name: String,
    pub rules: String,
    pub created_by: Option<Uuid>,
}

impl Guardrail {
    pub async fn create(pool: &SqlitePool, data: &CreateGuardrail) -> sqlx::Result<Self> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO guardrails (id, name, rules, created_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.rules)
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
        sqlx::query_as("SELECT * FROM guardrails WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as("SELECT * FROM guardrails ORDER BY name ASC")
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &SqlitePool, id: Uuid, data: &CreateGuardrail) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            UPDATE guardrails
            SET name = ?, rules = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.name)
        .bind(&data.rules)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM guardrails WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
