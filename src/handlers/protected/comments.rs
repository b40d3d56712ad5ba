use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::CommentView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::CommentService;
use crate::types::Pagination;

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

/// GET /api/posts/:id/comments
pub async fn list(Path(post_id): Path<Uuid>, Query(page): Query<Pagination>) -> ApiResult<Vec<CommentView>> {
    let comments = CommentService::from_config()?.list_for_post(post_id, &page).await?;
    Ok(ApiResponse::success(comments.iter().map(|c| c.view()).collect()))
}

/// POST /api/posts/:id/comments
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<CommentRequest>,
) -> ApiResult<CommentView> {
    let comment = CommentService::from_config()?
        .create(&auth, post_id, &payload.content)
        .await?;
    Ok(ApiResponse::created(comment.view()))
}

/// DELETE /api/comments/:id - comment author or admin
pub async fn delete(Extension(auth): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<()> {
    CommentService::from_config()?.delete(&auth, id).await?;
    Ok(ApiResponse::no_content())
}
