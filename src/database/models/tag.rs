use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A named label shared by posts and users. `name` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Tag {
    #[serde(skip)]
    pub id: i64,
    #[serde(rename = "id")]
    pub uuid: Uuid,
    pub name: String,
}

/// Tag listing row with the number of posts and users referencing it
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct TagUsage {
    #[serde(rename = "id")]
    pub uuid: Uuid,
    pub name: String,
    pub post_count: i64,
    pub user_count: i64,
}
