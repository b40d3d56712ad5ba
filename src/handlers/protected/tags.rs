use axum::{
    extract::{Path, Query},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::{Tag, TagUsage};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::TagService;
use crate::types::Pagination;

#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub name: String,
}

/// GET /api/tags - tags with usage counts
pub async fn list(Query(page): Query<Pagination>) -> ApiResult<Vec<TagUsage>> {
    let tags = TagService::from_config()?.list(&page).await?;
    Ok(ApiResponse::success(tags))
}

/// POST /api/admin/tags
pub async fn create(Json(payload): Json<TagRequest>) -> ApiResult<Tag> {
    let tag = TagService::from_config()?.create(&payload.name).await?;
    Ok(ApiResponse::created(tag))
}

/// DELETE /api/admin/tags/:id - 409 while still attached to posts or users
pub async fn delete(Path(id): Path<Uuid>) -> ApiResult<()> {
    TagService::from_config()?.delete(id).await?;
    Ok(ApiResponse::no_content())
}
