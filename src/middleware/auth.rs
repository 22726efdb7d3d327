use axum::{
    extract::{FromRef, FromRequestParts},
    http::header,
};
use sea_orm::EntityTrait;

use crate::{
    entity::users::Entity as Users,
    error::AppError,
    models::Role,
    state::AppState,
    token::TokenError,
};

/// The authenticated caller, resolved from the bearer token against the
/// users table on every request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Single authorization guard for manager-only operations.
pub fn ensure_manager(user: &AuthUser) -> Result<(), AppError> {
    if user.role != Role::Manager {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Unauthorized("Invalid Authorization scheme".into()));
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let verified = state.tokens.verify(token).map_err(|err| match err {
            TokenError::Expired => AppError::Unauthorized("Token expired".into()),
            TokenError::Invalid => AppError::Unauthorized("Invalid token".into()),
        })?;

        // The subject must still exist; a deleted user keeps a valid
        // signature but no identity.
        let user = Users::find_by_id(verified.user_id)
            .one(&state.orm)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown subject".into()))?;

        let role: Role = user
            .role
            .parse()
            .map_err(|err: String| AppError::Internal(anyhow::anyhow!(err)))?;

        Ok(AuthUser {
            id: user.id,
            username: user.username,
            email: user.email,
            role,
        })
    }
}
