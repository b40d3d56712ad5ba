use axum::Extension;

use crate::database::models::UserView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::UserService;

/// GET /api/auth/whoami - Current user as stored, not as claimed in the token
pub async fn whoami(Extension(auth): Extension<AuthUser>) -> ApiResult<UserView> {
    let user = UserService::from_config()?.get(auth.user_id).await?;
    Ok(ApiResponse::success(user.view()))
}
