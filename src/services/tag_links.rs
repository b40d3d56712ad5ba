//! Join-table persistence for post and user tag sets.

use sqlx::{FromRow, PgConnection};
use std::collections::HashMap;
use uuid::Uuid;

use crate::tags::Tag;

/// Which join table links an owner to its tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagLink {
    Post,
    User,
}

impl TagLink {
    fn table(&self) -> &'static str {
        match self {
            TagLink::Post => "post_tags",
            TagLink::User => "user_tags",
        }
    }

    fn owner_column(&self) -> &'static str {
        match self {
            TagLink::Post => "post_id",
            TagLink::User => "user_id",
        }
    }
}

#[derive(FromRow)]
struct LinkedTag {
    owner_id: i64,
    id: i64,
    uuid: Uuid,
    name: String,
}

/// Load the tags of every owner in `owner_ids`, sorted by name
pub async fn load_tags(
    conn: &mut PgConnection,
    link: TagLink,
    owner_ids: &[i64],
) -> Result<HashMap<i64, Vec<Tag>>, sqlx::Error> {
    if owner_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let query = format!(
        "SELECT l.{owner} AS owner_id, t.id, t.uuid, t.name \
         FROM {table} l JOIN tags t ON t.id = l.tag_id \
         WHERE l.{owner} = ANY($1) \
         ORDER BY t.name",
        owner = link.owner_column(),
        table = link.table(),
    );

    let rows = sqlx::query_as::<_, LinkedTag>(&query)
        .bind(owner_ids)
        .fetch_all(&mut *conn)
        .await?;

    let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
    for row in rows {
        tags.entry(row.owner_id).or_default().push(Tag {
            id: row.id,
            uuid: row.uuid,
            name: row.name,
        });
    }
    Ok(tags)
}

/// Replace the stored tag set of one owner with `tags`
pub async fn replace_tags(
    conn: &mut PgConnection,
    link: TagLink,
    owner_id: i64,
    tags: &[Tag],
) -> Result<(), sqlx::Error> {
    let delete = format!("DELETE FROM {} WHERE {} = $1", link.table(), link.owner_column());
    sqlx::query(&delete).bind(owner_id).execute(&mut *conn).await?;

    if tags.is_empty() {
        return Ok(());
    }

    let tag_ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
    let insert = format!(
        "INSERT INTO {} ({}, tag_id) SELECT $1, UNNEST($2::BIGINT[]) ON CONFLICT DO NOTHING",
        link.table(),
        link.owner_column(),
    );
    sqlx::query(&insert)
        .bind(owner_id)
        .bind(&tag_ids)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
