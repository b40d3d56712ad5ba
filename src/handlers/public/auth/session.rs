use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{generate_jwt, Claims};
use crate::database::models::UserView;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserView,
}

/// POST /auth/login - Authenticate user and receive JWT token
///
/// Expected Input:
/// ```json
/// { "username": "leanne", "password": "..." }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "expires_in": 604800,
///     "user": { "id": "...", "username": "leanne", "role": "user", ... }
///   }
/// }
/// ```
pub async fn login(Json(payload): Json<LoginRequest>) -> ApiResult<LoginResponse> {
    let service = UserService::from_config()?;
    let user = service.authenticate(&payload.username, &payload.password).await?;

    let claims = Claims::new(user.username.clone(), user.uuid, user.role());
    let token = generate_jwt(&claims)?;

    tracing::info!("User '{}' logged in", user.username);
    Ok(ApiResponse::success(LoginResponse {
        token,
        expires_in: claims.expires_in(),
        user: user.view(),
    }))
}
