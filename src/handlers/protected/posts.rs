use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::database::models::PostView;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{PostInput, PostService, PostUpdate};
use crate::types::Pagination;

#[derive(Debug, Deserialize)]
pub struct PostListQuery {
    pub tag: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /api/posts?tag=&limit=&offset=
pub async fn list(Query(query): Query<PostListQuery>) -> ApiResult<Vec<PostView>> {
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };
    let posts = PostService::from_config()?
        .list(query.tag.as_deref(), &page)
        .await?;
    Ok(ApiResponse::success(posts.iter().map(|p| p.view()).collect()))
}

/// GET /api/posts/:id
pub async fn get(Path(id): Path<Uuid>) -> ApiResult<PostView> {
    let post = PostService::from_config()?.get(id).await?;
    Ok(ApiResponse::success(post.view()))
}

/// POST /api/posts
///
/// Tag names are reconciled with the configured post policy: unknown names are
/// created by default, or rejected with 404 under the strict policy.
pub async fn create(
    Extension(auth): Extension<AuthUser>,
    Json(payload): Json<PostInput>,
) -> ApiResult<PostView> {
    let post = PostService::from_config()?.create(&auth, payload).await?;
    Ok(ApiResponse::created(post.view()))
}

/// PUT /api/posts/:id - author or admin
pub async fn update(
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PostUpdate>,
) -> ApiResult<PostView> {
    let post = PostService::from_config()?.update(&auth, id, payload).await?;
    Ok(ApiResponse::success(post.view()))
}

/// DELETE /api/posts/:id - author or admin
pub async fn delete(Extension(auth): Extension<AuthUser>, Path(id): Path<Uuid>) -> ApiResult<()> {
    PostService::from_config()?.delete(&auth, id).await?;
    Ok(ApiResponse::no_content())
}
