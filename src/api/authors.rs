//! Author endpoints

use axum::{
    extract::{OriginalUri, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{author::{AuthorRequest, AUTHOR_FIELDS}, AuthorDetailView, BookSummaryView},
    query::QuerySpec,
    AppState,
};

use super::{AuthenticatedUser, DataResponse, IdPath, ListResponse, MessageResponse, ValidatedJson};

/// All books of one author
#[derive(Serialize, ToSchema)]
pub struct AuthorBooksResponse {
    pub success: bool,
    pub data: Vec<BookSummaryView>,
    pub number_of_records: usize,
}

/// List authors with filtering, ordering and pagination
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    params(
        ("order_by" = Option<String>, Query, description = "Comma separated fields, `-` prefix for descending"),
        ("fields" = Option<String>, Query, description = "Comma separated fields to render"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<u32>, Query, description = "Records per page"),
        ("first_name" = Option<String>, Query, description = "Filter; also first_name__like"),
        ("last_name" = Option<String>, Query, description = "Filter; also last_name__like"),
        ("birth_date" = Option<String>, Query, description = "Filter (DD-MM-YYYY); also __gt, __gte, __lt, __lte")
    ),
    responses(
        (status = 200, description = "One page of authors", body = ListResponse),
        (status = 400, description = "Unknown field or operator", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<ListResponse>> {
    let spec = QuerySpec::parse(&AUTHOR_FIELDS, &params, &state.config.pagination)?;
    let page = state.services.catalog.list_authors(&spec, uri.path()).await?;

    Ok(Json(ListResponse::new(page, spec.fields.as_deref(), &[])?))
}

/// Get an author with their books
#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author details", body = DataResponse<AuthorDetailView>),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<DataResponse<AuthorDetailView>>> {
    let author = state.services.catalog.get_author(id).await?;
    Ok(Json(DataResponse::new(author)))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    security(("bearer_auth" = [])),
    request_body = AuthorRequest,
    responses(
        (status = 201, description = "Author created", body = DataResponse<AuthorDetailView>),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    AuthenticatedUser(_account_id): AuthenticatedUser,
    ValidatedJson(author): ValidatedJson<AuthorRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AuthorDetailView>>)> {
    let created = state.services.catalog.create_author(author).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

/// Replace an author's fields
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = AuthorRequest,
    responses(
        (status = 200, description = "Author updated", body = DataResponse<AuthorDetailView>),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    AuthenticatedUser(_account_id): AuthenticatedUser,
    IdPath(id): IdPath,
    ValidatedJson(author): ValidatedJson<AuthorRequest>,
) -> AppResult<Json<DataResponse<AuthorDetailView>>> {
    let updated = state.services.catalog.update_author(id, author).await?;
    Ok(Json(DataResponse::new(updated)))
}

/// Delete an author and all their books
#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Author deleted", body = MessageResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    AuthenticatedUser(_account_id): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.delete_author(id).await?;
    Ok(Json(MessageResponse::new(format!("Author with id {} has been deleted", id))))
}

/// List every book of an author
#[utoipa::path(
    get,
    path = "/authors/{id}/books",
    tag = "authors",
    params(("id" = i32, Path, description = "Author ID")),
    responses(
        (status = 200, description = "The author's books", body = AuthorBooksResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_author_books(
    State(state): State<AppState>,
    IdPath(id): IdPath,
) -> AppResult<Json<AuthorBooksResponse>> {
    let books = state.services.catalog.author_books(id).await?;
    Ok(Json(AuthorBooksResponse {
        success: true,
        number_of_records: books.len(),
        data: books,
    }))
}
