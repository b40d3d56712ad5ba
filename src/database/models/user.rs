use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::tags::{HasTags, Tag};
use crate::types::Role;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub uuid: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub tags: Vec<Tag>,
}

impl User {
    /// Unknown role strings degrade to the least privileged role
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::User)
    }

    pub fn view(&self) -> UserView {
        UserView {
            id: self.uuid,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role(),
            tags: self.tags.iter().map(|t| t.name.clone()).collect(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl HasTags for User {
    fn set_tags(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
    }
}

/// Public representation of a user; never carries the password hash
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
