//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{auth, authors, books, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Booklib API",
        version = "1.0.0",
        description = "Library catalog REST API: authors, books and accounts"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::register,
        auth::login,
        auth::me,
        auth::update_password,
        auth::update_data,
        // Authors
        authors::list_authors,
        authors::get_author,
        authors::create_author,
        authors::update_author,
        authors::delete_author,
        authors::list_author_books,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
    ),
    components(
        schemas(
            // Auth
            crate::models::account::RegisterRequest,
            crate::models::account::LoginRequest,
            crate::models::account::UpdatePasswordRequest,
            crate::models::account::UpdateProfileRequest,
            crate::models::AccountView,
            // Catalog
            crate::models::author::AuthorRequest,
            crate::models::book::BookRequest,
            crate::models::AuthorSummaryView,
            crate::models::AuthorDetailView,
            crate::models::BookSummaryView,
            crate::models::BookView,
            authors::AuthorBooksResponse,
            // Envelopes
            crate::api::TokenResponse,
            crate::api::MessageResponse,
            crate::api::ListResponse,
            crate::query::Pagination,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login and account management"),
        (name = "authors", description = "Authors"),
        (name = "books", description = "Books")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
