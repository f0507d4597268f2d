//! Business logic services

pub mod accounts;
pub mod catalog;
pub mod tokens;

use crate::{config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountsService,
    pub tokens: tokens::TokenService,
    pub catalog: catalog::CatalogService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: &AuthConfig) -> Self {
        Self {
            accounts: accounts::AccountsService::new(repository.clone()),
            tokens: tokens::TokenService::new(auth_config),
            catalog: catalog::CatalogService::new(repository),
        }
    }
}
