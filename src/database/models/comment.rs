use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Comment row joined with the post's external id and the author's username
#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: i64,
    pub uuid: Uuid,
    pub post_id: i64,
    pub post_uuid: Uuid,
    pub author_id: i64,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn view(&self) -> CommentView {
        CommentView {
            id: self.uuid,
            post_id: self.post_uuid,
            author: self.author.clone(),
            content: self.content.clone(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
