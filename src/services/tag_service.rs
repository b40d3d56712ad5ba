use sqlx::PgPool;
use uuid::Uuid;

use super::validation::FieldErrors;
use super::{ServiceError, ServiceResult};
use crate::database::models::{Tag, TagUsage};
use crate::database::DatabaseManager;
use crate::tags::{PgTagStore, TagStore, TagStoreError};
use crate::types::Pagination;

/// Direct tag administration. Attaching tags to posts and users goes
/// through the reconciler instead.
pub struct TagService {
    pool: PgPool,
}

impl TagService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn from_config() -> ServiceResult<Self> {
        Ok(Self::new(DatabaseManager::pool()?))
    }

    pub async fn list(&self, page: &Pagination) -> ServiceResult<Vec<TagUsage>> {
        let tags = sqlx::query_as::<_, TagUsage>(
            "SELECT t.uuid, t.name, \
                 (SELECT COUNT(*) FROM post_tags pt WHERE pt.tag_id = t.id) AS post_count, \
                 (SELECT COUNT(*) FROM user_tags ut WHERE ut.tag_id = t.id) AS user_count \
             FROM tags t ORDER BY t.name LIMIT $1 OFFSET $2",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok(tags)
    }

    pub async fn create(&self, name: &str) -> ServiceResult<Tag> {
        FieldErrors::new().tag_name(name).finish()?;

        let mut conn = self.pool.acquire().await?;
        let tag = PgTagStore::new(&mut conn).create(name).await.map_err(|e| match e {
            TagStoreError::Conflict(name) => ServiceError::Conflict(format!("Tag '{}' already exists", name)),
            TagStoreError::Database(e) => e.into(),
        })?;

        tracing::info!("Created tag '{}' ({})", tag.name, tag.uuid);
        Ok(tag)
    }

    /// Delete a tag that no post or user references
    pub async fn delete(&self, uuid: Uuid) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        let tag = sqlx::query_as::<_, Tag>("SELECT id, uuid, name FROM tags WHERE uuid = $1 FOR UPDATE")
            .bind(uuid)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Tag {} not found", uuid)))?;

        let in_use: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM post_tags WHERE tag_id = $1) \
                 OR EXISTS (SELECT 1 FROM user_tags WHERE tag_id = $1)",
        )
        .bind(tag.id)
        .fetch_one(&mut *tx)
        .await?;

        if in_use {
            return Err(ServiceError::Conflict(format!("Tag '{}' is still in use", tag.name)));
        }

        sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(tag.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("Deleted tag '{}'", tag.name);
        Ok(())
    }
}
