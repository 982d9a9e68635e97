//! Persistent record of one prompt/response exchange per row. Visibility
//! is enforced by the routes: users see their own rows, admins see all.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[ts(export)]
pub struct ChatHistory {
    pub id: Uuid,
    pub virtual_assistant_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub message: String,
    pub response: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateChatHistory {
    pub virtual_assistant_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub message: String,
    pub response: String,
}

impl ChatHistory {
    pub async fn create(pool: &SqlitePool, data: &CreateChatHistory) -> sqlx::Result<Self> {
        let id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO chat_history (id, virtual_assistant_id, user_id, message, response, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(data.virtual_assistant_id)
        .bind(data.user_id)
        .bind(&data.message)
        .bind(&data.response)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM chat_history WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as("SELECT * FROM chat_history ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_user(pool: &SqlitePool, user_id: Uuid) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as(
            r#"
            SELECT * FROM chat_history
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM chat_history WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_utils::{create_test_user, setup_test_pool};

    #[tokio::test]
    async fn per_user_listing_excludes_other_users() {
        let pool = setup_test_pool().await;
        let alice = create_test_user(&pool, "alice").await;
        let bob = create_test_user(&pool, "bob").await;

        for (user, message) in [(&alice, "hi from alice"), (&bob, "hi from bob")] {
            ChatHistory::create(
                &pool,
                &CreateChatHistory {
                    virtual_assistant_id: None,
                    user_id: Some(user.id),
                    message: message.to_string(),
                    response: "hello".into(),
                },
            )
            .await
            .expect("create chat history");
        }

        let mine = ChatHistory::find_by_user(&pool, alice.id)
            .await
            .expect("query");
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].message, "hi from alice");

        let all = ChatHistory::find_all(&pool).await.expect("query");
        assert_eq!(all.len(), 2);
    }
}
