//! Authentication extractors.
//!
//! Handlers take an explicit [`AuthUser`] (or [`RequireAdmin`]) argument
//! instead of reading any ambient request-scoped identity. The bearer
//! token is verified and the account is loaded fresh from the database on
//! every request, so a deleted account is rejected immediately.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use voltshop_core::UserId;

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::user::User;
use crate::services::auth::decode_token;
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(AuthUser(user): AuthUser) -> impl IntoResponse {
///     format!("Hello, {}!", user.name)
/// }
/// ```
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Unauthorized("Not authorized. No token provided.".to_string())
            })?;

        let claims = decode_token(token, &state.config().jwt_secret)
            .map_err(|_| AppError::Unauthorized("Invalid or expired token.".to_string()))?;

        let user = UserRepository::new(state.pool())
            .get_by_id(UserId::new(claims.sub))
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found.".to_string()))?;

        Ok(Self(user))
    }
}

/// Extractor that requires a valid bearer token for an admin account.
pub struct RequireAdmin(pub User);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if !user.role.is_admin() {
            return Err(AppError::Forbidden(
                "Access denied: insufficient permissions.".to_string(),
            ));
        }

        Ok(Self(user))
    }
}
