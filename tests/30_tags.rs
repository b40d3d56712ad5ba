mod common;

use anyhow::{Context, Result};
use blog_api_rust::auth::Claims;
use blog_api_rust::tags::{HasTags, PgTagStore, Tag, TagPolicy, TagReconciler, TagStore, TagStoreError};
use blog_api_rust::types::Role;
use reqwest::StatusCode;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

// These tests need Postgres and return early when DATABASE_URL is unset.

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

async fn connect(url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(2)
        .connect(url)
        .await
        .context("failed to connect to DATABASE_URL")
}

struct Account {
    id: Uuid,
    token: String,
}

async fn register_and_login(client: &reqwest::Client, base_url: &str) -> Result<Account> {
    let username = unique("writer");
    let password = "a-long-enough-password";

    let res = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "username": username, "email": format!("{}@example.com", username), "password": password }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED, "register gave {}", res.status());

    let res = client
        .post(format!("{}/auth/login", base_url))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK, "login gave {}", res.status());

    let body = res.json::<Value>().await?;
    let id = body["data"]["user"]["id"].as_str().context("missing user id")?.parse()?;
    let token = body["data"]["token"].as_str().context("missing token")?.to_string();
    Ok(Account { id, token })
}

async fn create_post(client: &reqwest::Client, base_url: &str, token: &str, tags: &[&str]) -> Result<Value> {
    let res = client
        .post(format!("{}/api/posts", base_url))
        .bearer_auth(token)
        .json(&json!({ "title": "Tagged", "content": "Body text", "tags": tags }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED, "create post gave {}", res.status());
    Ok(res.json::<Value>().await?["data"].clone())
}

fn tag_names(view: &Value) -> Vec<String> {
    let mut names: Vec<String> = view["tags"]
        .as_array()
        .map(|tags| tags.iter().filter_map(|t| t.as_str().map(str::to_string)).collect())
        .unwrap_or_default();
    names.sort();
    names
}

async fn set_role(pool: &PgPool, id: Uuid, role: Role) -> Result<()> {
    sqlx::query("UPDATE users SET role = $1 WHERE uuid = $2")
        .bind(role.as_str())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

fn mint_token(username: &str, id: Uuid, role: Role) -> Result<String> {
    let claims = Claims::new(username.to_string(), id, role);
    let key = jsonwebtoken::EncodingKey::from_secret(common::JWT_SECRET.as_bytes());
    Ok(jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &key)?)
}

#[tokio::test]
async fn post_create_links_existing_and_new_tags() -> Result<()> {
    let Some(url) = common::database_url() else { return Ok(()) };
    let server = common::ensure_db_server(&url).await?;
    let pool = connect(&url).await?;
    let client = reqwest::Client::new();

    let author = register_and_login(&client, &server.base_url).await?;
    let fresh = unique("fresh");

    let post = create_post(&client, &server.base_url, &author.token, &["tag1", fresh.as_str(), "tag1"]).await?;
    let mut expected = vec!["tag1".to_string(), fresh.clone()];
    expected.sort();
    assert_eq!(tag_names(&post), expected);

    let post_id: Uuid = post["id"].as_str().context("missing post id")?.parse()?;
    let linked: Vec<String> = sqlx::query_scalar(
        "SELECT t.name FROM post_tags pt \
         JOIN posts p ON p.id = pt.post_id JOIN tags t ON t.id = pt.tag_id \
         WHERE p.uuid = $1 ORDER BY t.name",
    )
    .bind(post_id)
    .fetch_all(&pool)
    .await?;
    assert_eq!(linked, expected);

    // A tag update replaces the link rows rather than adding to them
    let res = client
        .put(format!("{}/api/posts/{}", server.base_url, post_id))
        .bearer_auth(&author.token)
        .json(&json!({ "tags": [fresh] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM post_tags pt JOIN posts p ON p.id = pt.post_id WHERE p.uuid = $1",
    )
    .bind(post_id)
    .fetch_one(&pool)
    .await?;
    assert_eq!(count, 1);
    Ok(())
}

#[tokio::test]
async fn strict_user_tags_leave_the_stored_set_untouched() -> Result<()> {
    let Some(url) = common::database_url() else { return Ok(()) };
    let server = common::ensure_db_server(&url).await?;
    let pool = connect(&url).await?;
    let client = reqwest::Client::new();

    let user = register_and_login(&client, &server.base_url).await?;
    // Posts create missing tags, so this guarantees "tag1" exists
    create_post(&client, &server.base_url, &user.token, &["tag1"]).await?;

    let user_url = format!("{}/api/users/{}", server.base_url, user.id);
    let res = client.put(&user_url).bearer_auth(&user.token).json(&json!({ "tags": ["tag1"] })).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .put(&user_url)
        .bearer_auth(&user.token)
        .json(&json!({ "tags": ["tag1", "missingtag"] }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body = res.json::<Value>().await?;
    assert_eq!(body["error"], "Tag not found: missingtag");

    let res = client.get(&user_url).bearer_auth(&user.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(tag_names(&res.json::<Value>().await?["data"]), vec!["tag1".to_string()]);

    let missing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE name = 'missingtag'")
        .fetch_one(&pool)
        .await?;
    assert_eq!(missing, 0);
    Ok(())
}

#[tokio::test]
async fn tags_in_use_cannot_be_deleted() -> Result<()> {
    let Some(url) = common::database_url() else { return Ok(()) };
    let server = common::ensure_db_server(&url).await?;
    let pool = connect(&url).await?;
    let client = reqwest::Client::new();

    let admin = register_and_login(&client, &server.base_url).await?;
    // The token still says "user"; the stored role is what counts
    set_role(&pool, admin.id, Role::Admin).await?;

    let in_use = unique("inuse");
    create_post(&client, &server.base_url, &admin.token, &[in_use.as_str()]).await?;
    let tag_id: Uuid = sqlx::query_scalar("SELECT uuid FROM tags WHERE name = $1")
        .bind(&in_use)
        .fetch_one(&pool)
        .await?;

    let res = client
        .delete(format!("{}/api/admin/tags/{}", server.base_url, tag_id))
        .bearer_auth(&admin.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = client
        .post(format!("{}/api/admin/tags", server.base_url))
        .bearer_auth(&admin.token)
        .json(&json!({ "name": unique("unused") }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let unused_id = res.json::<Value>().await?["data"]["id"].as_str().context("missing tag id")?.to_string();

    let res = client
        .delete(format!("{}/api/admin/tags/{}", server.base_url, unused_id))
        .bearer_auth(&admin.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn admin_routes_use_the_stored_account() -> Result<()> {
    let Some(url) = common::database_url() else { return Ok(()) };
    let server = common::ensure_db_server(&url).await?;
    let pool = connect(&url).await?;
    let client = reqwest::Client::new();
    let target = format!("{}/api/admin/tags/{}", server.base_url, Uuid::new_v4());

    // Admin claims for an account that does not exist
    let ghost = mint_token("ghost", Uuid::new_v4(), Role::Admin)?;
    let res = client.delete(&target).bearer_auth(&ghost).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Admin claims for an account that has since been demoted
    let demoted = register_and_login(&client, &server.base_url).await?;
    let admin_claims = mint_token("demoted", demoted.id, Role::Admin)?;
    set_role(&pool, demoted.id, Role::User).await?;
    let res = client.delete(&target).bearer_auth(&admin_claims).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Deleted accounts lose access to the regular API too
    sqlx::query("DELETE FROM users WHERE uuid = $1").bind(demoted.id).execute(&pool).await?;
    let res = client
        .get(format!("{}/api/posts", server.base_url))
        .bearer_auth(&demoted.token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn pg_tag_store_reports_duplicate_names_as_conflict() -> Result<()> {
    let Some(url) = common::database_url() else { return Ok(()) };
    common::ensure_db_server(&url).await?;
    let pool = connect(&url).await?;
    let mut conn = pool.acquire().await?;
    let name = unique("dup");

    let mut store = PgTagStore::new(&mut *conn);
    let created = store.create(&name).await?;
    assert_eq!(created.name, name);

    match store.create(&name).await {
        Err(TagStoreError::Conflict(conflicting)) => assert_eq!(conflicting, name),
        other => panic!("expected a conflict, got {:?}", other),
    }

    let found = store.find_by_name(&name).await?.context("tag should exist")?;
    assert_eq!(found.uuid, created.uuid);
    Ok(())
}

#[derive(Default)]
struct Owner {
    tags: Vec<Tag>,
}

impl HasTags for Owner {
    fn set_tags(&mut self, tags: Vec<Tag>) {
        self.tags = tags;
    }
}

#[tokio::test]
async fn rolled_back_transaction_discards_created_tags() -> Result<()> {
    let Some(url) = common::database_url() else { return Ok(()) };
    common::ensure_db_server(&url).await?;
    let pool = connect(&url).await?;
    let name = unique("orphan");

    let mut tx = pool.begin().await?;
    let mut owner = Owner::default();
    {
        let mut store = PgTagStore::new(&mut *tx);
        TagReconciler::new(TagPolicy::CreateMissing)
            .reconcile(&mut store, &mut owner, &[name.clone()])
            .await?;
    }
    assert_eq!(owner.tags.len(), 1);
    tx.rollback().await?;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tags WHERE name = $1")
        .bind(&name)
        .fetch_one(&pool)
        .await?;
    assert_eq!(count, 0);
    Ok(())
}
