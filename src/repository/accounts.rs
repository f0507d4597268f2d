//! Accounts repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::AccountsRepository;
use crate::{
    error::{AppError, AppResult},
    models::Account,
};

const ACCOUNT_COLUMNS: &str = "id, username, email, password, creation_date";

#[derive(Clone)]
pub struct PgAccountsRepository {
    pool: Pool<Postgres>,
}

impl PgAccountsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// A concurrent registration can still hit the unique indexes after the
/// existence checks passed
fn map_unique(e: sqlx::Error) -> AppError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict("Username or email already exists!".to_string())
        }
        e => AppError::Database(e),
    }
}

#[async_trait]
impl AccountsRepository for PgAccountsRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!("SELECT {} FROM users WHERE id = $1", ACCOUNT_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(account)
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<Account>> {
        let account =
            sqlx::query_as::<_, Account>(&format!("SELECT {} FROM users WHERE username = $1", ACCOUNT_COLUMNS))
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(account)
    }

    async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND id != $2)")
                .bind(username)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    async fn email_exists(&self, email: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = if let Some(id) = exclude_id {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND id != $2)")
                .bind(email)
                .bind(id)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    async fn create(&self, username: &str, email: &str, password_hash: &str) -> AppResult<Account> {
        sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO users (username, email, password, creation_date) VALUES ($1, $2, $3, NOW()) RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique)
    }

    async fn update_password(&self, id: i32, password_hash: &str) -> AppResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "UPDATE users SET password = $2 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    async fn update_profile(&self, id: i32, username: &str, email: &str) -> AppResult<Option<Account>> {
        sqlx::query_as::<_, Account>(&format!(
            "UPDATE users SET username = $2, email = $3 WHERE id = $1 RETURNING {}",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique)
    }
}
