//! Credential store: registration, login and account updates

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        account::{Credentials, NewAccount, PasswordChange, ProfileChange},
        Account,
    },
    repository::Repository,
};

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const WRONG_CURRENT_PASSWORD: &str = "Wrong current password";

#[derive(Clone)]
pub struct AccountsService {
    repository: Repository,
}

impl AccountsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Create an account; username and email must both be free
    pub async fn register(&self, account: NewAccount) -> AppResult<Account> {
        self.ensure_available(&account.username, &account.email, None).await?;

        let hash = hash_password(&account.password).await?;
        let created = self
            .repository
            .accounts
            .create(&account.username, &account.email, &hash)
            .await?;

        tracing::info!("Registered account {} ({})", created.id, created.username);
        Ok(created)
    }

    /// Resolve an account from a username and password. Unknown usernames and
    /// wrong passwords fail the same way.
    pub async fn verify_credentials(&self, credentials: &Credentials) -> AppResult<Account> {
        let account = self
            .repository
            .accounts
            .get_by_username(&credentials.username)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&account, &credentials.password).await? {
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        Ok(account)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Account> {
        self.repository
            .accounts
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found!", id)))
    }

    pub async fn update_password(&self, id: i32, change: PasswordChange) -> AppResult<Account> {
        let account = self.get_by_id(id).await?;
        if !verify_password(&account, &change.current_password).await? {
            return Err(AppError::Authentication(WRONG_CURRENT_PASSWORD.to_string()));
        }

        let hash = hash_password(&change.new_password).await?;
        let updated = self
            .repository
            .accounts
            .update_password(id, &hash)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found!", id)))?;

        tracing::info!("Password changed for account {}", id);
        Ok(updated)
    }

    /// Replace username and email; either may stay unchanged
    pub async fn update_profile(&self, id: i32, change: ProfileChange) -> AppResult<Account> {
        self.ensure_available(&change.username, &change.email, Some(id)).await?;

        let updated = self
            .repository
            .accounts
            .update_profile(id, &change.username, &change.email)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found!", id)))?;

        tracing::info!("Profile updated for account {}", id);
        Ok(updated)
    }

    async fn ensure_available(&self, username: &str, email: &str, exclude_id: Option<i32>) -> AppResult<()> {
        if self.repository.accounts.username_exists(username, exclude_id).await? {
            return Err(AppError::Conflict(format!("Username {} already exists!", username)));
        }
        if self.repository.accounts.email_exists(email, exclude_id).await? {
            return Err(AppError::Conflict(format!("Email {} already exists!", email)));
        }
        Ok(())
    }
}

/// Hash a password using Argon2 on the blocking pool
async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
}

async fn verify_password(account: &Account, password: &str) -> AppResult<bool> {
    let stored = account.password_hash.clone();
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || -> AppResult<bool> {
        let parsed_hash =
            PasswordHash::new(&stored).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    })
    .await
    .map_err(|e| AppError::Internal(format!("Password check task failed: {}", e)))?
}
