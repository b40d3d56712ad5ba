use axum::Json;

use crate::database::models::UserView;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{RegisterInput, UserService};

/// POST /auth/register - Create a new account with the `user` role
pub async fn register(Json(payload): Json<RegisterInput>) -> ApiResult<UserView> {
    let user = UserService::from_config()?.register(payload).await?;
    Ok(ApiResponse::created(user.view()))
}
