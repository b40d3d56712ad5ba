use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::tags::{HasTags, Tag};

/// Post row joined with its author's username
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub uuid: Uuid,
    pub author_id: i64,
    pub author: String,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub tags: Vec<Tag>,
}

impl Post {
    pub fn view(&self) -> PostView {
        PostView {
            id: self.uuid,
            author: self.author.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.iter().map(|t| t.name.clone()).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl HasTags for Post {
    fn set_tags(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub author: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
