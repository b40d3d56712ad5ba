use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::UserView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{UserService, UserUpdate};
use crate::types::{Pagination, Role};

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Role,
}

/// GET /api/admin/users
pub async fn list(Query(page): Query<Pagination>) -> ApiResult<Vec<UserView>> {
    let users = UserService::from_config()?.list(&page).await?;
    Ok(ApiResponse::success(users.iter().map(|u| u.view()).collect()))
}

/// GET /api/users/:id
pub async fn get(Path(id): Path<Uuid>) -> ApiResult<UserView> {
    let user = UserService::from_config()?.get(id).await?;
    Ok(ApiResponse::success(user.view()))
}

/// PUT /api/users/:id - self or admin
///
/// Tag names are reconciled with the configured user policy, which rejects
/// unknown names by default.
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserUpdate>,
) -> ApiResult<UserView> {
    let user = UserService::from_config()?.update(&auth, id, payload).await?;
    Ok(ApiResponse::success(user.view()))
}

/// PUT /api/admin/users/:id/role
pub async fn set_role(Path(id): Path<Uuid>, Json(payload): Json<RoleRequest>) -> ApiResult<UserView> {
    let user = UserService::from_config()?.set_role(id, payload.role).await?;
    Ok(ApiResponse::success(user.view()))
}

/// DELETE /api/admin/users/:id - an admin cannot delete their own account
pub async fn delete(Extension(auth): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<()> {
    UserService::from_config()?.delete(&auth, id).await?;
    Ok(ApiResponse::no_content())
}
