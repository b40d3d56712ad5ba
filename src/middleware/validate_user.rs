use axum::{extract::Request, middleware::Next, response::Response};
use sqlx::FromRow;

use super::auth::AuthUser;
use crate::database::{DatabaseError, DatabaseManager};
use crate::error::ApiError;
use crate::types::Role;

/// Account state as currently stored, which may differ from the token claims
#[derive(Debug, Clone, FromRow)]
struct StoredAccount {
    username: String,
    role: String,
}

/// Middleware that checks the JWT subject against the users table.
///
/// Runs after `jwt_auth_middleware`. Tokens for deleted accounts are rejected,
/// and the stored username and role replace the ones carried in the token so
/// that demotions and renames take effect before the token expires.
pub async fn validate_user_middleware(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let pool = DatabaseManager::pool()?;
    let stored = sqlx::query_as::<_, StoredAccount>("SELECT username, role FROM users WHERE uuid = $1")
        .bind(auth_user.user_id)
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::from)?;

    let validated = apply_stored(auth_user, stored)?;
    tracing::debug!("Validated '{}' ({}) as {}", validated.username, validated.user_id, validated.role);
    request.extensions_mut().insert(validated);

    Ok(next.run(request).await)
}

fn apply_stored(mut auth_user: AuthUser, stored: Option<StoredAccount>) -> Result<AuthUser, ApiError> {
    let Some(account) = stored else {
        tracing::warn!("Token for '{}' ({}) has no matching account", auth_user.username, auth_user.user_id);
        return Err(ApiError::unauthorized("Account no longer exists"));
    };

    // Unknown role strings fall back to the least privileged role
    let role: Role = account.role.parse().unwrap_or(Role::User);
    if role != auth_user.role {
        tracing::info!("Role of '{}' changed since login: {} -> {}", account.username, auth_user.role, role);
    }

    auth_user.username = account.username;
    auth_user.role = role;
    Ok(auth_user)
}
