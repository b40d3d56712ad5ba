use sqlx::PgPool;
use uuid::Uuid;

use super::post_service::fetch_post;
use super::user_service::actor_id;
use super::validation::FieldErrors;
use super::{ServiceError, ServiceResult};
use crate::database::models::Comment;
use crate::database::DatabaseManager;
use crate::middleware::AuthUser;
use crate::types::Pagination;

const COMMENT_SELECT: &str = "SELECT c.id, c.uuid, c.post_id, p.uuid AS post_uuid, c.author_id, \
     u.username AS author, c.content, c.created_at \
     FROM post_comments c \
     JOIN posts p ON p.id = c.post_id \
     JOIN users u ON u.id = c.author_id";

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn from_config() -> ServiceResult<Self> {
        Ok(Self::new(DatabaseManager::pool()?))
    }

    /// Oldest first
    pub async fn list_for_post(&self, post_uuid: Uuid, page: &Pagination) -> ServiceResult<Vec<Comment>> {
        let mut conn = self.pool.acquire().await?;
        let post = fetch_post(&mut conn, post_uuid, false).await?;

        let query = format!("{COMMENT_SELECT} WHERE c.post_id = $1 ORDER BY c.created_at, c.id LIMIT $2 OFFSET $3");
        let comments = sqlx::query_as::<_, Comment>(&query)
            .bind(post.id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *conn)
            .await?;
        Ok(comments)
    }

    pub async fn create(&self, actor: &AuthUser, post_uuid: Uuid, content: &str) -> ServiceResult<Comment> {
        FieldErrors::new().content("content", content).finish()?;

        let mut tx = self.pool.begin().await?;
        let post = fetch_post(&mut tx, post_uuid, false).await?;
        let author_id = actor_id(&mut tx, actor).await?;

        let comment = sqlx::query_as::<_, Comment>(
            "WITH inserted AS (\
                 INSERT INTO post_comments (uuid, post_id, author_id, content) VALUES ($1, $2, $3, $4) RETURNING *\
             ) \
             SELECT i.id, i.uuid, i.post_id, p.uuid AS post_uuid, i.author_id, u.username AS author, \
                 i.content, i.created_at \
             FROM inserted i \
             JOIN posts p ON p.id = i.post_id \
             JOIN users u ON u.id = i.author_id",
        )
        .bind(Uuid::new_v4())
        .bind(post.id)
        .bind(author_id)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!("Comment {} added to post {} by '{}'", comment.uuid, post.uuid, comment.author);
        Ok(comment)
    }

    /// Comment authors may delete their own comments; admins may delete any
    pub async fn delete(&self, actor: &AuthUser, uuid: Uuid) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;

        let query = format!("{COMMENT_SELECT} WHERE c.uuid = $1 FOR UPDATE OF c");
        let comment = sqlx::query_as::<_, Comment>(&query)
            .bind(uuid)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Comment {} not found", uuid)))?;

        if !actor.is_admin() && actor_id(&mut tx, actor).await? != comment.author_id {
            return Err(ServiceError::Forbidden(
                "Only the author or an admin can delete this comment".to_string(),
            ));
        }

        sqlx::query("DELETE FROM post_comments WHERE id = $1")
            .bind(comment.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("Deleted comment {} (by '{}')", uuid, actor.username);
        Ok(())
    }
}
