use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::AppError,
    repository::RepositoryState,
};

/// TokenType
///
/// Distinguishes short-lived access tokens from refresh tokens so one can never stand in for
/// the other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// Claims
///
/// The payload signed into every token issued by `/token` and `/token/refresh`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID.
    pub sub: Uuid,
    /// Expiration Time (exp).
    pub exp: usize,
    /// Issued At (iat).
    pub iat: usize,
    pub token_type: TokenType,
}

/// issue_token
///
/// Signs an HS256 token of the given type for `user_id`, with the lifetime configured for
/// that type.
pub fn issue_token(
    user_id: Uuid,
    token_type: TokenType,
    config: &AppConfig,
) -> Result<String, AppError> {
    let now = Utc::now();
    let ttl = match token_type {
        TokenType::Access => Duration::minutes(config.access_token_ttl_minutes),
        TokenType::Refresh => Duration::days(config.refresh_token_ttl_days),
    };
    let claims = Claims {
        sub: user_id,
        exp: (now + ttl).timestamp() as usize,
        iat: now.timestamp() as usize,
        token_type,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

/// decode_token
///
/// Validates signature and expiry, then checks the token is of the `expected` type.
pub fn decode_token(
    token: &str,
    expected: TokenType,
    config: &AppConfig,
) -> Result<Claims, AppError> {
    let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::Unauthorized("Token is expired".to_string()),
            _ => AppError::Unauthorized("Token is invalid".to_string()),
        })?
        .claims;

    if claims.token_type != expected {
        return Err(AppError::Unauthorized("Token has wrong type".to_string()));
    }
    Ok(claims)
}

/// AuthUser Extractor Result
///
/// The resolved identity of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
}

/// AuthUser Extractor Implementation
///
/// Resolves the caller from the request:
/// 1. Local bypass: in `Env::Local` an `x-user-id` header naming an existing user is accepted.
/// 2. Bearer token: an access token signed with the configured secret.
/// 3. DB lookup: the user must still exist.
///
/// Rejection: `AppError::Unauthorized` (401) on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|raw| Uuid::parse_str(raw).ok());
            if let Some(user_id) = bypass_id {
                if let Some(user) = repo.get_user(user_id).await? {
                    return Ok(AuthUser {
                        id: user.id,
                        username: user.username,
                    });
                }
            }
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Unauthorized("Authentication credentials were not provided".to_string())
            })?;

        let claims = decode_token(token, TokenType::Access, &config)?;

        // The token may outlive the account.
        let user = repo
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
        })
    }
}
