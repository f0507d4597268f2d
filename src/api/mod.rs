//! API handlers for the library catalog REST endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        request::Parts,
        HeaderMap,
    },
    routing::{get, post, put},
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::Schema,
    query::{Page, Pagination},
    services::tokens::{INVALID_TOKEN, MISSING_TOKEN},
    AppState,
};

/// Extractor for the account id carried by a bearer token
pub struct AuthenticatedUser(pub i32);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication(MISSING_TOKEN.to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication(INVALID_TOKEN.to_string()))?
            .trim();
        if token.is_empty() {
            return Err(AppError::Authentication(MISSING_TOKEN.to_string()));
        }

        let account_id = state.services.tokens.verify(token)?;
        Ok(AuthenticatedUser(account_id))
    }
}

/// Numeric identifier from the `:id` path segment. Segments that are not an
/// `i32` answer the JSON 404, as no such record can exist.
pub struct IdPath(pub i32);

#[async_trait]
impl<S> FromRequestParts<S> for IdPath
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state).await?;
        Ok(IdPath(id))
    }
}

/// JSON body parsed into `R` and validated into `R::Output`.
///
/// Rejects non-JSON content types with 415, unparsable bodies with 400 under
/// the `json` key, and schema violations with every failing field.
pub struct ValidatedJson<R: Schema>(pub R::Output);

#[async_trait]
impl<S, R> FromRequest<S> for ValidatedJson<R>
where
    S: Send + Sync,
    R: Schema + DeserializeOwned + Send,
    R::Output: Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Err(AppError::UnsupportedMediaType(
                "Content type must be application/json".to_string(),
            ));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        let payload: R = serde_json::from_slice(&bytes).map_err(|e| AppError::field("json", e.to_string()))?;

        payload.into_valid().map(ValidatedJson).map_err(AppError::Validation)
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
        })
        .unwrap_or(false)
}

/// Success envelope around a single payload
#[derive(Serialize, ToSchema)]
pub struct DataResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    pub fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

/// Success envelope around a plain message
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub data: String,
}

impl MessageResponse {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            success: true,
            data: data.into(),
        }
    }
}

/// Returned by registration and login
#[derive(Serialize, ToSchema)]
pub struct TokenResponse {
    pub success: bool,
    pub token: String,
}

/// One page of a list endpoint
#[derive(Serialize, ToSchema)]
pub struct ListResponse {
    pub success: bool,
    /// Records, restricted to `fields` when requested
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<Value>,
    /// Records on this page
    pub number_of_records: usize,
    pub pagination: Pagination,
}

impl ListResponse {
    /// Render `page`, keeping only `fields` of each record when set.
    /// `renames` maps a field name to the key it is rendered under.
    pub fn new<T: Serialize>(page: Page<T>, fields: Option<&[&str]>, renames: &[(&str, &str)]) -> AppResult<Self> {
        let data = page
            .records
            .iter()
            .map(|record| {
                let value = serde_json::to_value(record)
                    .map_err(|e| AppError::Internal(format!("Failed to serialize record: {}", e)))?;
                Ok(match fields {
                    Some(fields) => project(value, fields, renames),
                    None => value,
                })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self {
            success: true,
            number_of_records: data.len(),
            data,
            pagination: page.pagination,
        })
    }
}

fn project(value: Value, fields: &[&str], renames: &[(&str, &str)]) -> Value {
    let keys: Vec<&str> = fields
        .iter()
        .map(|field| {
            renames
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, key)| *key)
                .unwrap_or(*field)
        })
        .collect();

    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| keys.contains(&key.as_str()))
                .collect(),
        ),
        other => other,
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("Resource not found".to_string())
}

/// Create the application router with all routes
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/update/password", put(auth::update_password))
        .route("/auth/update/data", put(auth::update_data))
        // Authors
        .route("/authors", get(authors::list_authors).post(authors::create_author))
        .route(
            "/authors/:id",
            get(authors::get_author)
                .put(authors::update_author)
                .delete(authors::delete_author),
        )
        .route(
            "/authors/:id/books",
            get(authors::list_author_books).post(books::create_book),
        )
        // Books
        .route("/books", get(books::list_books))
        .route(
            "/books/:id",
            get(books::get_book).put(books::update_book).delete(books::delete_book),
        )
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi::create_openapi_router())
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
