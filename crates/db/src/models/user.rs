//! User accounts and role-based access control.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Application-wide user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum UserRole {
    Admin,
    Ops,
    User,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Ops => write!(f, "ops"),
            UserRole::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            // "devops" was renamed to "ops"; accept the old spelling on read.
            "ops" | "devops" => Ok(Self::Ops),
            "user" => Ok(Self::User),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

impl TryFrom<String> for UserRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, TS)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Data for creating a new user. The caller is responsible for hashing
/// the password before it gets here.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: UserRole,
}

/// Data for a full user update. `password_hash` is only replaced when set.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub role: UserRole,
}

impl User {
    pub async fn create(pool: &SqlitePool, data: &CreateUser) -> sqlx::Result<Self> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id)
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.role.to_string())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(pool: &SqlitePool, username: &str) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_email(pool: &SqlitePool, email: &str) -> sqlx::Result<Option<Self>> {
        sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_all(pool: &SqlitePool) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(pool)
            .await
    }

    pub async fn update(pool: &SqlitePool, id: Uuid, data: &UpdateUser) -> sqlx::Result<Self> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = ?,
                email = ?,
                password_hash = COALESCE(?, password_hash),
                role = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(data.role.to_string())
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> sqlx::Result<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
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

    #[test]
    fn role_round_trips_through_strings() {
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
        assert_eq!("OPS".parse::<UserRole>(), Ok(UserRole::Ops));
        assert_eq!("devops".parse::<UserRole>(), Ok(UserRole::Ops));
        assert_eq!(UserRole::User.to_string(), "user");
        assert!("root".parse::<UserRole>().is_err());
    }

    #[tokio::test]
    async fn create_find_update_delete() {
        let pool = setup_test_pool().await;

        let created = User::create(
            &pool,
            &CreateUser {
                username: "alice".into(),
                email: "alice@example.com".into(),
                password_hash: "$2b$fakehash".into(),
                role: UserRole::Admin,
            },
        )
        .await
        .expect("create user");

        assert_eq!(created.username, "alice");
        assert!(created.is_admin());

        let by_email = User::find_by_email(&pool, "alice@example.com")
            .await
            .expect("query")
            .expect("user exists");
        assert_eq!(by_email.id, created.id);

        let updated = User::update(
            &pool,
            created.id,
            &UpdateUser {
                username: "alice2".into(),
                email: "alice@example.com".into(),
                password_hash: None,
                role: UserRole::User,
            },
        )
        .await
        .expect("update user");
        assert_eq!(updated.username, "alice2");
        assert_eq!(updated.role, UserRole::User);
        // untouched password hash survives a None update
        assert_eq!(updated.password_hash, created.password_hash);

        let removed = User::delete(&pool, created.id).await.expect("delete");
        assert_eq!(removed, 1);
        assert!(User::find_by_id(&pool, created.id)
            .await
            .expect("query")
            .is_none());
    }
}
