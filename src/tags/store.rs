use async_trait::async_trait;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{Tag, TagStore, TagStoreError};

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// Postgres-backed tag store bound to a single connection, normally the
/// connection of an open transaction.
pub struct PgTagStore<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgTagStore<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl<'c> TagStore for PgTagStore<'c> {
    async fn find_by_name(&mut self, name: &str) -> Result<Option<Tag>, TagStoreError> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, uuid, name FROM tags WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(tag)
    }

    async fn create(&mut self, name: &str) -> Result<Tag, TagStoreError> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (uuid, name) VALUES ($1, $2) RETURNING id, uuid, name",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                TagStoreError::Conflict(name.to_string())
            } else {
                TagStoreError::Database(e)
            }
        })
    }
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map_or(false, |code| code == UNIQUE_VIOLATION)
}
