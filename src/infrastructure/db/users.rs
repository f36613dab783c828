use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::domain::error::{AppError, Result};
use crate::domain::user::User;

/// Accounts and their API tokens.
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a user; a taken username surfaces as `ValidationError` on `username`.
    pub async fn insert_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let created_at = chrono::Utc::now().timestamp_millis();
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?, ?, ?)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(User {
                id: done.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at,
            }),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Err(
                AppError::field("username", "A user with that username already exists."),
            ),
            Err(e) => Err(AppError::DatabaseError(format!("Failed to insert user: {e}"))),
        }
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to fetch user: {e}")))?;

        Ok(user.map(|user| user.into()))
    }

    /// Returns the user's existing token or issues a new one.
    pub async fn get_or_create_token(&self, user_id: i64) -> Result<String> {
        let key = Uuid::new_v4().simple().to_string();
        sqlx::query(
            "INSERT INTO auth_tokens (key, user_id, created_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(&key)
        .bind(user_id)
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to issue token: {e}")))?;

        sqlx::query_scalar::<_, String>("SELECT key FROM auth_tokens WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch token: {e}")))
    }

    pub async fn find_by_token(&self, key: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT u.id, u.username, u.password_hash, u.created_at
             FROM auth_tokens t JOIN users u ON u.id = t.user_id
             WHERE t.key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to resolve token: {e}")))?;

        Ok(user.map(|user| user.into()))
    }
}

#[derive(sqlx::FromRow)]
struct UserEntity {
    id: i64,
    username: String,
    password_hash: String,
    created_at: i64,
}

impl From<UserEntity> for User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            username: entity.username,
            password_hash: entity.password_hash,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::connection::init_memory_db;

    async fn repository() -> UserRepository {
        UserRepository::new(init_memory_db().await.unwrap())
    }

    #[tokio::test]
    async fn test_duplicate_username_is_field_error() {
        let repo = repository().await;
        repo.insert_user("alice", "hash").await.unwrap();

        match repo.insert_user("alice", "other").await {
            Err(AppError::ValidationError(errors)) => {
                assert_eq!(
                    errors["username"],
                    vec!["A user with that username already exists.".to_string()]
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_token_is_stable_per_user() {
        let repo = repository().await;
        let user = repo.insert_user("bob", "hash").await.unwrap();

        let first = repo.get_or_create_token(user.id).await.unwrap();
        let second = repo.get_or_create_token(user.id).await.unwrap();
        assert_eq!(first, second);

        let resolved = repo.find_by_token(&first).await.unwrap().unwrap();
        assert_eq!(resolved.username, "bob");
        assert!(repo.find_by_token("nope").await.unwrap().is_none());
    }
}
