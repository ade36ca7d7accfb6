use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    Conflict,
    #[error("user no longer exists")]
    Missing,
    #[error("{0}")]
    Unavailable(#[from] sqlx::Error),
}

/// Persistence for user records. Email uniqueness is enforced here, not by callers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;
    async fn save(&self, user: &User) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

// `users_email_key` turns a lost registration race into Conflict. The in-memory
// store mirrors this; see `services::tests::concurrent_registrations_produce_one_user`.
fn map_write_err(e: sqlx::Error) -> StoreError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => StoreError::Conflict,
        _ => StoreError::Unavailable(e),
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    /// Find a user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    /// Create a new user with hashed password.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_err)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET username = $2, email = $3, password_hash = $4
             WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.db)
        .await
        .map_err(map_write_err)?;

        if res.rows_affected() == 0 {
            return Err(StoreError::Missing);
        }
        Ok(())
    }
}
