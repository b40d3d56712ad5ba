use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::tag_links::{load_tags, replace_tags, TagLink};
use super::validation::FieldErrors;
use super::{ServiceError, ServiceResult};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::reset_key::{Clock, ResetKeyCodec};
use crate::database::models::User;
use crate::database::DatabaseManager;
use crate::middleware::AuthUser;
use crate::tags::store::is_unique_violation;
use crate::tags::{PgTagStore, TagReconciler};
use crate::types::{Pagination, Role};

const USER_COLUMNS: &str = "id, uuid, username, email, password_hash, role, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub tags: Option<Vec<String>>,
}

pub struct UserService {
    pool: PgPool,
    reconciler: TagReconciler,
}

impl UserService {
    pub fn new(pool: PgPool, reconciler: TagReconciler) -> Self {
        Self { pool, reconciler }
    }

    /// Service bound to the shared pool and the configured user tag policy
    pub fn from_config() -> ServiceResult<Self> {
        let policy = crate::config::config().tags.user_policy;
        Ok(Self::new(DatabaseManager::pool()?, TagReconciler::new(policy)))
    }

    pub async fn register(&self, input: RegisterInput) -> ServiceResult<User> {
        FieldErrors::new()
            .username(&input.username)
            .email(&input.email)
            .password(&input.password)
            .finish()?;

        let password_hash = hash_password(&input.password)?;

        let query = format!(
            "INSERT INTO users (uuid, username, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.username)
            .bind(&input.email)
            .bind(&password_hash)
            .bind(Role::User.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    ServiceError::Conflict("Username or email is already registered".to_string())
                } else {
                    e.into()
                }
            })?;

        tracing::info!("Registered user '{}' ({})", user.username, user.uuid);
        Ok(user)
    }

    /// Check credentials; unknown user and wrong password are indistinguishable
    pub async fn authenticate(&self, username: &str, password: &str) -> ServiceResult<User> {
        let rejected = || ServiceError::Unauthorized("Invalid username or password".to_string());

        let Some(user) = self.find_by_username(username).await? else {
            tracing::warn!("Login rejected: unknown user '{}'", username);
            return Err(rejected());
        };

        if !verify_password(password, &user.password_hash)? {
            tracing::warn!("Login rejected: wrong password for '{}'", username);
            return Err(rejected());
        }

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> ServiceResult<Option<User>> {
        let mut conn = self.pool.acquire().await?;
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&mut *conn)
            .await?;

        match user {
            Some(user) => Ok(Some(with_tags(&mut conn, user).await?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, uuid: Uuid) -> ServiceResult<User> {
        let mut conn = self.pool.acquire().await?;
        let user = fetch_user(&mut conn, uuid, false).await?;
        with_tags(&mut conn, user).await
    }

    pub async fn list(&self, page: &Pagination) -> ServiceResult<Vec<User>> {
        let mut conn = self.pool.acquire().await?;
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username LIMIT $1 OFFSET $2");
        let mut users = sqlx::query_as::<_, User>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&mut *conn)
            .await?;

        let ids: Vec<i64> = users.iter().map(|u| u.id).collect();
        let mut tags = load_tags(&mut conn, TagLink::User, &ids).await?;
        for user in &mut users {
            user.tags = tags.remove(&user.id).unwrap_or_default();
        }
        Ok(users)
    }

    /// Update a user's email and/or tags. Users may edit themselves; admins anyone.
    pub async fn update(&self, actor: &AuthUser, uuid: Uuid, update: UserUpdate) -> ServiceResult<User> {
        if actor.user_id != uuid && !actor.is_admin() {
            return Err(ServiceError::Forbidden("You can only update your own account".to_string()));
        }

        let mut errors = FieldErrors::new();
        if let Some(email) = &update.email {
            errors.email(email);
        }
        if let Some(tags) = &update.tags {
            errors.tag_names(tags);
        }
        errors.finish()?;

        let mut tx = self.pool.begin().await?;
        let mut user = fetch_user(&mut tx, uuid, true).await?;

        if let Some(email) = update.email {
            let query = format!(
                "UPDATE users SET email = $1, updated_at = now() WHERE id = $2 RETURNING {USER_COLUMNS}"
            );
            user = sqlx::query_as::<_, User>(&query)
                .bind(&email)
                .bind(user.id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| {
                    if is_unique_violation(&e) {
                        ServiceError::Conflict("Email is already registered".to_string())
                    } else {
                        e.into()
                    }
                })?;
        }

        match update.tags {
            Some(names) => {
                {
                    let mut store = PgTagStore::new(&mut tx);
                    self.reconciler.reconcile(&mut store, &mut user, &names).await?;
                }
                replace_tags(&mut tx, TagLink::User, user.id, &user.tags).await?;
            }
            None => user = with_tags(&mut tx, user).await?,
        }

        tx.commit().await?;
        tracing::info!("Updated user '{}'", user.username);
        Ok(user)
    }

    pub async fn set_role(&self, uuid: Uuid, role: Role) -> ServiceResult<User> {
        let mut conn = self.pool.acquire().await?;
        let query = format!(
            "UPDATE users SET role = $1, updated_at = now() WHERE uuid = $2 RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(role.as_str())
            .bind(uuid)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| user_not_found(uuid))?;

        tracing::info!("User '{}' is now {}", user.username, role);
        with_tags(&mut conn, user).await
    }

    pub async fn delete(&self, actor: &AuthUser, uuid: Uuid) -> ServiceResult<()> {
        if actor.user_id == uuid {
            return Err(ServiceError::Conflict("You cannot delete your own account".to_string()));
        }

        let result = sqlx::query("DELETE FROM users WHERE uuid = $1")
            .bind(uuid)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(user_not_found(uuid));
        }

        tracing::info!("Deleted user {} (by '{}')", uuid, actor.username);
        Ok(())
    }

    /// Issue a reset key for the user matching both `username` and `email`
    pub async fn issue_reset_key<C: Clock>(
        &self,
        codec: &ResetKeyCodec<C>,
        username: &str,
        email: &str,
    ) -> ServiceResult<(String, DateTime<Utc>)> {
        let user = self
            .find_by_username(username)
            .await?
            .filter(|u| u.email == email)
            .ok_or_else(|| ServiceError::NotFound("No user matches that username and email".to_string()))?;

        let key = codec.generate(&user.username, &user.email)?;
        let request = codec.parse(&key)?;

        tracing::info!("Issued password reset key for '{}'", user.username);
        Ok((key, request.expiry))
    }

    /// Replace the password of the user named in a reset key
    pub async fn reset_password<C: Clock>(
        &self,
        codec: &ResetKeyCodec<C>,
        key: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let request = codec.parse(key)?;

        if request.is_expired_at(codec.now()) {
            tracing::warn!("Expired reset key presented for '{}'", request.username);
            return Err(ServiceError::Unauthorized("The reset key has expired".to_string()));
        }

        FieldErrors::new().password(new_password).finish()?;

        let user = self
            .find_by_username(&request.username)
            .await?
            .filter(|u| u.email == request.email)
            .ok_or_else(|| {
                tracing::warn!("Reset key does not match a user: '{}'", request.username);
                ServiceError::from(crate::auth::reset_key::ResetKeyError::InvalidRequest)
            })?;

        let password_hash = hash_password(new_password)?;
        sqlx::query("UPDATE users SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(&password_hash)
            .bind(user.id)
            .execute(&self.pool)
            .await?;

        tracing::info!("Password reset for '{}'", user.username);
        Ok(())
    }
}

/// Resolve the internal row id of an authenticated user
pub(crate) async fn actor_id(conn: &mut PgConnection, actor: &AuthUser) -> ServiceResult<i64> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE uuid = $1")
        .bind(actor.user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized("Account no longer exists".to_string()))
}

async fn fetch_user(conn: &mut PgConnection, uuid: Uuid, for_update: bool) -> ServiceResult<User> {
    let lock = if for_update { " FOR UPDATE" } else { "" };
    let query = format!("SELECT {USER_COLUMNS} FROM users WHERE uuid = $1{lock}");
    sqlx::query_as::<_, User>(&query)
        .bind(uuid)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| user_not_found(uuid))
}

async fn with_tags(conn: &mut PgConnection, mut user: User) -> ServiceResult<User> {
    let mut tags = load_tags(conn, TagLink::User, &[user.id]).await?;
    user.tags = tags.remove(&user.id).unwrap_or_default();
    Ok(user)
}

fn user_not_found(uuid: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("User {} not found", uuid))
}
