//! Account model, auth request schemas and the account view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::validation::{field_errors, Schema};
use crate::error::FieldErrors;

/// Full account record from the database
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub creation_date: DateTime<Utc>,
}

/// Public account representation; the password hash has no place here
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AccountView {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub creation_date: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            creation_date: account.creation_date,
        }
    }
}

/// Validated registration data
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Validated login data
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone)]
pub struct ProfileChange {
    pub username: String,
    pub email: String,
}

/// Registration request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 255, message = "Length must be between 1 and 255.")
    )]
    pub username: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        email(message = "Not a valid email address.")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 6, max = 255, message = "Length must be between 6 and 255.")
    )]
    pub password: Option<String>,
}

impl Schema for RegisterRequest {
    type Output = NewAccount;

    fn into_valid(self) -> Result<NewAccount, FieldErrors> {
        let errors = field_errors(&self);
        match (self.username, self.email, self.password) {
            (Some(username), Some(email), Some(password)) if errors.is_empty() => Ok(NewAccount {
                username,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }
}

/// Login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 255, message = "Length must be between 1 and 255.")
    )]
    pub username: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 6, max = 255, message = "Length must be between 6 and 255.")
    )]
    pub password: Option<String>,
}

impl Schema for LoginRequest {
    type Output = Credentials;

    fn into_valid(self) -> Result<Credentials, FieldErrors> {
        let errors = field_errors(&self);
        match (self.username, self.password) {
            (Some(username), Some(password)) if errors.is_empty() => Ok(Credentials { username, password }),
            _ => Err(errors),
        }
    }
}

/// Password change request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePasswordRequest {
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 6, max = 255, message = "Length must be between 6 and 255.")
    )]
    pub current_password: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 6, max = 255, message = "Length must be between 6 and 255.")
    )]
    pub new_password: Option<String>,
}

impl Schema for UpdatePasswordRequest {
    type Output = PasswordChange;

    fn into_valid(self) -> Result<PasswordChange, FieldErrors> {
        let errors = field_errors(&self);
        match (self.current_password, self.new_password) {
            (Some(current_password), Some(new_password)) if errors.is_empty() => Ok(PasswordChange {
                current_password,
                new_password,
            }),
            _ => Err(errors),
        }
    }
}

/// Username/email change request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(
        required(message = "Missing data for required field."),
        length(min = 1, max = 255, message = "Length must be between 1 and 255.")
    )]
    pub username: Option<String>,
    #[validate(
        required(message = "Missing data for required field."),
        email(message = "Not a valid email address.")
    )]
    pub email: Option<String>,
}

impl Schema for UpdateProfileRequest {
    type Output = ProfileChange;

    fn into_valid(self) -> Result<ProfileChange, FieldErrors> {
        let errors = field_errors(&self);
        match (self.username, self.email) {
            (Some(username), Some(email)) if errors.is_empty() => Ok(ProfileChange { username, email }),
            _ => Err(errors),
        }
    }
}
