//! Registration, login and account endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        account::{LoginRequest, RegisterRequest, UpdatePasswordRequest, UpdateProfileRequest},
        AccountView,
    },
    AppState,
};

use super::{AuthenticatedUser, DataResponse, TokenResponse, ValidatedJson};

/// Register a new account and receive a token
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = TokenResponse),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 409, description = "Username or email already exists", body = crate::error::ErrorResponse),
        (status = 415, description = "Body is not JSON", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(account): ValidatedJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenResponse>)> {
    let account = state.services.accounts.register(account).await?;
    let token = state.services.tokens.issue(account.id)?;

    Ok((StatusCode::CREATED, Json(TokenResponse { success: true, token })))
}

/// Exchange username and password for a token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(credentials): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let account = state.services.accounts.verify_credentials(&credentials).await?;
    let token = state.services.tokens.issue(account.id)?;

    tracing::debug!("Account {} logged in", account.id);
    Ok(Json(TokenResponse { success: true, token }))
}

/// Get the account behind the bearer token
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current account", body = DataResponse<AccountView>),
        (status = 401, description = "Missing, invalid or expired token", body = crate::error::ErrorResponse)
    )
)]
pub async fn me(
    State(state): State<AppState>,
    AuthenticatedUser(account_id): AuthenticatedUser,
) -> AppResult<Json<DataResponse<AccountView>>> {
    let account = state.services.accounts.get_by_id(account_id).await?;
    Ok(Json(DataResponse::new(AccountView::from(account))))
}

/// Change the current account's password
#[utoipa::path(
    put,
    path = "/auth/update/password",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdatePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = DataResponse<AccountView>),
        (status = 401, description = "Wrong current password or bad token", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_password(
    State(state): State<AppState>,
    AuthenticatedUser(account_id): AuthenticatedUser,
    ValidatedJson(change): ValidatedJson<UpdatePasswordRequest>,
) -> AppResult<Json<DataResponse<AccountView>>> {
    let account = state.services.accounts.update_password(account_id, change).await?;
    Ok(Json(DataResponse::new(AccountView::from(account))))
}

/// Change the current account's username and email
#[utoipa::path(
    put,
    path = "/auth/update/data",
    tag = "auth",
    security(("bearer_auth" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = DataResponse<AccountView>),
        (status = 409, description = "Username or email taken by another account", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_data(
    State(state): State<AppState>,
    AuthenticatedUser(account_id): AuthenticatedUser,
    ValidatedJson(change): ValidatedJson<UpdateProfileRequest>,
) -> AppResult<Json<DataResponse<AccountView>>> {
    let account = state.services.accounts.update_profile(account_id, change).await?;
    Ok(Json(DataResponse::new(AccountView::from(account))))
}
