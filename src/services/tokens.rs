//! Stateless bearer tokens bound to an account

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
};

pub const MISSING_TOKEN: &str = "Missing token. Please login or register";
pub const EXPIRED_TOKEN: &str = "Expired token. Please login to get new token";
pub const INVALID_TOKEN: &str = "Invalid token. Please login or register";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub user_id: i32,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::minutes(config.jwt_expiration_minutes),
        }
    }

    /// Issue a token for `account_id` valid from now
    pub fn issue(&self, account_id: i32) -> AppResult<String> {
        self.issue_at(account_id, Utc::now())
    }

    /// Issue a token as if it had been created at `issued_at`
    pub fn issue_at(&self, account_id: i32, issued_at: DateTime<Utc>) -> AppResult<String> {
        let claims = TokenClaims {
            user_id: account_id,
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))
    }

    /// Check signature and expiry, returning the embedded account id
    pub fn verify(&self, token: &str) -> AppResult<i32> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        match decode::<TokenClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Ok(data.claims.user_id),
            Err(e) => {
                tracing::warn!("Rejected token: {}", e);
                match e.kind() {
                    ErrorKind::ExpiredSignature => Err(AppError::Authentication(EXPIRED_TOKEN.to_string())),
                    _ => Err(AppError::Authentication(INVALID_TOKEN.to_string())),
                }
            }
        }
    }
}
