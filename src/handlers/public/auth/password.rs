use axum::Json;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::reset_key::{ResetKeyCodec, SystemClock};
use crate::config;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::UserService;

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ForgotPasswordResponse {
    pub reset_key: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub key: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct ResetPasswordResponse {
    pub reset: bool,
}

fn codec() -> ResetKeyCodec<SystemClock> {
    let hours = config::config().security.reset_key_validity_hours;
    ResetKeyCodec::system().with_validity(Duration::hours(hours))
}

/// POST /auth/forgot-password - Issue a reset key for a username/email pair
///
/// There is no mail delivery; the key is returned to the caller.
pub async fn forgot_password(Json(payload): Json<ForgotPasswordRequest>) -> ApiResult<ForgotPasswordResponse> {
    let service = UserService::from_config()?;
    let (reset_key, expires_at) = service
        .issue_reset_key(&codec(), &payload.username, &payload.email)
        .await?;

    Ok(ApiResponse::success(ForgotPasswordResponse { reset_key, expires_at }))
}

/// POST /auth/reset-password - Set a new password using a reset key
pub async fn reset_password(Json(payload): Json<ResetPasswordRequest>) -> ApiResult<ResetPasswordResponse> {
    let codec = codec();

    // Malformed keys are rejected before touching the database
    codec.parse(&payload.key).map_err(ApiError::from)?;

    UserService::from_config()?
        .reset_password(&codec, &payload.key, &payload.password)
        .await?;

    Ok(ApiResponse::success(ResetPasswordResponse { reset: true }))
}
