use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::tag_links::{load_tags, replace_tags, TagLink};
use super::user_service::actor_id;
use super::validation::FieldErrors;
use super::{ServiceError, ServiceResult};
use crate::database::models::Post;
use crate::database::DatabaseManager;
use crate::middleware::AuthUser;
use crate::tags::{PgTagStore, TagReconciler};
use crate::types::Pagination;

const POST_SELECT: &str = "SELECT p.id, p.uuid, p.author_id, u.username AS author, p.title, p.content, \
     p.created_at, p.updated_at FROM posts p JOIN users u ON u.id = p.author_id";

#[derive(Debug, Clone, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub struct PostService {
    pool: PgPool,
    reconciler: TagReconciler,
}

impl PostService {
    pub fn new(pool: PgPool, reconciler: TagReconciler) -> Self {
        Self { pool, reconciler }
    }

    /// Service bound to the shared pool and the configured post tag policy
    pub fn from_config() -> ServiceResult<Self> {
        let policy = crate::config::config().tags.post_policy;
        Ok(Self::new(DatabaseManager::pool()?, TagReconciler::new(policy)))
    }

    /// Newest first, optionally restricted to posts carrying `tag`
    pub async fn list(&self, tag: Option<&str>, page: &Pagination) -> ServiceResult<Vec<Post>> {
        let mut conn = self.pool.acquire().await?;
        let query = format!(
            "{POST_SELECT} WHERE $1::TEXT IS NULL OR EXISTS (\
                 SELECT 1 FROM post_tags pt JOIN tags t ON t.id = pt.tag_id \
                 WHERE pt.post_id = p.id AND t.name = $1) \
             ORDER BY p.created_at DESC, p.id DESC LIMIT $2 OFFSET $3"
        );
        let mut posts = sqlx::query_as::<_, Post>(&query)
            .bind(tag)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *conn)
            .await?;

        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        let mut tags = load_tags(&mut conn, TagLink::Post, &ids).await?;
        for post in &mut posts {
            post.tags = tags.remove(&post.id).unwrap_or_default();
        }
        Ok(posts)
    }

    pub async fn get(&self, uuid: Uuid) -> ServiceResult<Post> {
        let mut conn = self.pool.acquire().await?;
        let post = fetch_post(&mut conn, uuid, false).await?;
        with_tags(&mut conn, post).await
    }

    /// Insert a post and attach its reconciled tags in one transaction
    pub async fn create(&self, actor: &AuthUser, input: PostInput) -> ServiceResult<Post> {
        FieldErrors::new()
            .title(&input.title)
            .content("content", &input.content)
            .tag_names(&input.tags)
            .finish()?;

        let mut tx = self.pool.begin().await?;
        let author_id = actor_id(&mut tx, actor).await?;

        let mut post = sqlx::query_as::<_, Post>(
            "WITH inserted AS (\
                 INSERT INTO posts (uuid, author_id, title, content) VALUES ($1, $2, $3, $4) RETURNING *\
             ) \
             SELECT i.id, i.uuid, i.author_id, u.username AS author, i.title, i.content, \
                 i.created_at, i.updated_at \
             FROM inserted i JOIN users u ON u.id = i.author_id",
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(&input.title)
        .bind(&input.content)
        .fetch_one(&mut *tx)
        .await?;

        self.attach_tags(&mut tx, &mut post, &input.tags).await?;
        tx.commit().await?;

        tracing::info!("Created post {} by '{}'", post.uuid, post.author);
        Ok(post)
    }

    pub async fn update(&self, actor: &AuthUser, uuid: Uuid, update: PostUpdate) -> ServiceResult<Post> {
        let mut errors = FieldErrors::new();
        if let Some(title) = &update.title {
            errors.title(title);
        }
        if let Some(content) = &update.content {
            errors.content("content", content);
        }
        if let Some(tags) = &update.tags {
            errors.tag_names(tags);
        }
        errors.finish()?;

        let mut tx = self.pool.begin().await?;
        let mut post = fetch_post(&mut tx, uuid, true).await?;
        ensure_can_modify(&mut tx, actor, post.author_id).await?;

        if update.title.is_some() || update.content.is_some() {
            let title = update.title.unwrap_or(post.title);
            let content = update.content.unwrap_or(post.content);
            let (updated_at,): (chrono::DateTime<chrono::Utc>,) = sqlx::query_as(
                "UPDATE posts SET title = $1, content = $2, updated_at = now() WHERE id = $3 RETURNING updated_at",
            )
            .bind(&title)
            .bind(&content)
            .bind(post.id)
            .fetch_one(&mut *tx)
            .await?;

            post.title = title;
            post.content = content;
            post.updated_at = updated_at;
        }

        match update.tags {
            Some(names) => self.attach_tags(&mut tx, &mut post, &names).await?,
            None => post = with_tags(&mut tx, post).await?,
        }

        tx.commit().await?;
        tracing::info!("Updated post {} (by '{}')", post.uuid, actor.username);
        Ok(post)
    }

    pub async fn delete(&self, actor: &AuthUser, uuid: Uuid) -> ServiceResult<()> {
        let mut tx = self.pool.begin().await?;
        let post = fetch_post(&mut tx, uuid, true).await?;
        ensure_can_modify(&mut tx, actor, post.author_id).await?;

        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post.id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("Deleted post {} (by '{}')", uuid, actor.username);
        Ok(())
    }

    async fn attach_tags(&self, conn: &mut PgConnection, post: &mut Post, names: &[String]) -> ServiceResult<()> {
        {
            let mut store = PgTagStore::new(&mut *conn);
            self.reconciler.reconcile(&mut store, &mut *post, names).await?;
        }
        replace_tags(conn, TagLink::Post, post.id, &post.tags).await?;
        Ok(())
    }
}

/// Authors may modify their own posts; admins may modify any post
async fn ensure_can_modify(conn: &mut PgConnection, actor: &AuthUser, author_id: i64) -> ServiceResult<()> {
    if actor.is_admin() || actor_id(conn, actor).await? == author_id {
        return Ok(());
    }
    Err(ServiceError::Forbidden("Only the author or an admin can modify this post".to_string()))
}

pub(crate) async fn fetch_post(conn: &mut PgConnection, uuid: Uuid, for_update: bool) -> ServiceResult<Post> {
    let lock = if for_update { " FOR UPDATE OF p" } else { "" };
    let query = format!("{POST_SELECT} WHERE p.uuid = $1{lock}");
    sqlx::query_as::<_, Post>(&query)
        .bind(uuid)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Post {} not found", uuid)))
}

async fn with_tags(conn: &mut PgConnection, mut post: Post) -> ServiceResult<Post> {
    let mut tags = load_tags(conn, TagLink::Post, &[post.id]).await?;
    post.tags = tags.remove(&post.id).unwrap_or_default();
    Ok(post)
}
