use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use validator::Validate;

use crate::{
    AppState,
    auth::{AuthUser, TokenType, decode_token, issue_token},
    error::{AppError, AppResult, ErrorBody},
    models::{
        AccessToken, MessageResponse, NewUser, RefreshRequest, RegisterRequest, TokenPair,
        TokenRequest, User,
    },
    password::{hash_password, verify_password},
};

/// register_user
///
/// [Public Route] Creates an account. The password must be repeated in `confirm_password`;
/// only its Argon2id hash is stored and neither value is ever echoed back.
#[utoipa::path(
    post,
    path = "/register",
    tag = "accounts",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = MessageResponse),
        (status = 400, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MessageResponse>)> {
    let Json(payload) = payload?;
    payload.validate()?;
    if payload.password != payload.confirm_password {
        return Err(AppError::Validation(
            "password: Password fields didn't match.".to_string(),
        ));
    }

    let user = state
        .repo
        .create_user(NewUser {
            username: payload.username,
            email: payload.email,
            password_hash: hash_password(&payload.password)?,
        })
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User created successfully".to_string(),
        }),
    ))
}

/// obtain_token
///
/// [Public Route] Exchanges username and password for an access/refresh token pair.
#[utoipa::path(
    post,
    path = "/token",
    tag = "accounts",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token pair", body = TokenPair),
        (status = 401, description = "Bad credentials", body = ErrorBody)
    )
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    payload: Result<Json<TokenRequest>, JsonRejection>,
) -> AppResult<Json<TokenPair>> {
    let Json(payload) = payload?;
    payload.validate()?;
    let rejected =
        || AppError::Unauthorized("No active account found with the given credentials".to_string());

    let credentials = state
        .repo
        .find_credentials(&payload.username)
        .await?
        .ok_or_else(rejected)?;
    if !verify_password(&payload.password, &credentials.password_hash)? {
        tracing::warn!(username = %payload.username, "login rejected");
        return Err(rejected());
    }

    Ok(Json(TokenPair {
        access: issue_token(credentials.id, TokenType::Access, &state.config)?,
        refresh: issue_token(credentials.id, TokenType::Refresh, &state.config)?,
    }))
}

/// refresh_token
///
/// [Public Route] Issues a new access token for a valid refresh token.
#[utoipa::path(
    post,
    path = "/token/refresh",
    tag = "accounts",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token", body = AccessToken),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorBody)
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> AppResult<Json<AccessToken>> {
    let Json(payload) = payload?;
    let claims = decode_token(&payload.refresh, TokenType::Refresh, &state.config)?;
    let user = state
        .repo
        .get_user(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    Ok(Json(AccessToken {
        access: issue_token(user.id, TokenType::Access, &state.config)?,
    }))
}

/// get_me
///
/// [Authenticated Route] Returns the profile of the caller.
#[utoipa::path(
    get,
    path = "/me",
    tag = "accounts",
    responses(
        (status = 200, description = "Profile", body = User),
        (status = 401, description = "Not authenticated", body = ErrorBody)
    )
)]
pub async fn get_me(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<User>> {
    let user = state
        .repo
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;
    Ok(Json(user))
}
