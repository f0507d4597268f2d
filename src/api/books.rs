//! Book endpoints

use axum::{
    extract::{OriginalUri, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{book::{BookRequest, BOOK_FIELDS}, BookView},
    query::QuerySpec,
    AppState,
};

use super::{AuthenticatedUser, DataResponse, IdPath, ListResponse, MessageResponse, ValidatedJson};

/// `author_id` is rendered as the nested `author`
const BOOK_FIELD_RENAMES: &[(&str, &str)] = &[("author_id", "author")];

/// List books with filtering, ordering and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(
        ("order_by" = Option<String>, Query, description = "Comma separated fields, `-` prefix for descending"),
        ("fields" = Option<String>, Query, description = "Comma separated fields to render"),
        ("page" = Option<u32>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<u32>, Query, description = "Records per page"),
        ("title" = Option<String>, Query, description = "Filter; also title__like"),
        ("isbn" = Option<i64>, Query, description = "Filter; also __gt, __gte, __lt, __lte"),
        ("number_of_pages" = Option<i32>, Query, description = "Filter; also __gt, __gte, __lt, __lte"),
        ("author_id" = Option<i32>, Query, description = "Filter by author")
    ),
    responses(
        (status = 200, description = "One page of books", body = ListResponse),
        (status = 400, description = "Unknown field or operator", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<Vec<(String, String)>>,
) -> AppResult<Json<ListResponse>> {
    let spec = QuerySpec::parse(&BOOK_FIELDS, &params, &state.config.pagination)?;
    let page = state.services.catalog.list_books(&spec, uri.path()).await?;

    Ok(Json(ListResponse::new(page, spec.fields.as_deref(), BOOK_FIELD_RENAMES)?))
}

/// Get a book with its author
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = DataResponse<BookView>),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_book(State(state): State<AppState>, IdPath(id): IdPath) -> AppResult<Json<DataResponse<BookView>>> {
    let book = state.services.catalog.get_book(id).await?;
    Ok(Json(DataResponse::new(book)))
}

/// Add a book to an author
#[utoipa::path(
    post,
    path = "/authors/{id}/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Author ID")),
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = DataResponse<BookView>),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "ISBN already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    AuthenticatedUser(_account_id): AuthenticatedUser,
    IdPath(author_id): IdPath,
    ValidatedJson(book): ValidatedJson<BookRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<BookView>>)> {
    let created = state.services.catalog.create_book(author_id, book).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(created))))
}

/// Replace a book's fields
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = DataResponse<BookView>),
        (status = 404, description = "Book or author not found", body = crate::error::ErrorResponse),
        (status = 409, description = "ISBN already used", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    AuthenticatedUser(_account_id): AuthenticatedUser,
    IdPath(id): IdPath,
    ValidatedJson(book): ValidatedJson<BookRequest>,
) -> AppResult<Json<DataResponse<BookView>>> {
    let updated = state.services.catalog.update_book(id, book).await?;
    Ok(Json(DataResponse::new(updated)))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = i32, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book deleted", body = MessageResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthenticatedUser(_account_id): AuthenticatedUser,
    IdPath(id): IdPath,
) -> AppResult<Json<MessageResponse>> {
    state.services.catalog.delete_book(id).await?;
    Ok(Json(MessageResponse::new(format!("Book with id {} has been deleted", id))))
}
