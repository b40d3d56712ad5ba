//! Tag reconciliation for taggable entities (posts and users).
//!
//! A request carries tag *names*; the reconciler resolves each distinct name
//! to a [`Tag`] record through a [`TagStore`] and hands the resolved set to the
//! owner in a single [`HasTags::set_tags`] call. Unknown names are either
//! created or rejected depending on the [`TagPolicy`].

pub mod store;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use thiserror::Error;

pub use crate::database::models::Tag;
pub use store::PgTagStore;

/// How names without a matching tag are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagPolicy {
    /// Persist a new tag for every unknown name
    CreateMissing,
    /// Fail with `TagNotFound` on the first unknown name
    Strict,
}

impl FromStr for TagPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" | "create_missing" => Ok(TagPolicy::CreateMissing),
            "strict" => Ok(TagPolicy::Strict),
            other => Err(format!("unknown tag policy '{}'", other)),
        }
    }
}

/// Errors raised by a tag store implementation
#[derive(Debug, Error)]
pub enum TagStoreError {
    /// The name-uniqueness constraint rejected a create
    #[error("Tag '{0}' already exists")]
    Conflict(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Tag not found: {0}")]
    TagNotFound(String),

    #[error("Tag '{0}' was created concurrently")]
    TagConflict(String),

    #[error(transparent)]
    Store(#[from] sqlx::Error),
}

impl From<TagStoreError> for ReconcileError {
    fn from(err: TagStoreError) -> Self {
        match err {
            TagStoreError::Conflict(name) => ReconcileError::TagConflict(name),
            TagStoreError::Database(e) => ReconcileError::Store(e),
        }
    }
}

/// Lookup and creation of tags by name
#[async_trait]
pub trait TagStore: Send {
    /// Exact, case-sensitive match on `name`
    async fn find_by_name(&mut self, name: &str) -> Result<Option<Tag>, TagStoreError>;

    /// Persist a new tag; returns `Conflict` when the name is already taken
    async fn create(&mut self, name: &str) -> Result<Tag, TagStoreError>;
}

/// Anything that owns a set of tags
pub trait HasTags {
    fn set_tags(&mut self, tags: Vec<Tag>);
}

#[derive(Debug, Clone, Copy)]
pub struct TagReconciler {
    policy: TagPolicy,
}

impl TagReconciler {
    pub fn new(policy: TagPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> TagPolicy {
        self.policy
    }

    /// Resolve `names` and assign the result to `owner`.
    ///
    /// The owner is only touched once every name has been resolved, so a
    /// failure leaves its current tag set as it was. Tags created before a
    /// later failure stay in the store; callers that need all-or-nothing
    /// persistence run this inside a transaction.
    pub async fn reconcile<S, O>(
        &self,
        store: &mut S,
        owner: &mut O,
        names: &[String],
    ) -> Result<(), ReconcileError>
    where
        S: TagStore + ?Sized,
        O: HasTags + ?Sized,
    {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(names.len());

        for name in names {
            if !seen.insert(name.as_str()) {
                continue;
            }

            let tag = match store.find_by_name(name).await? {
                Some(tag) => tag,
                None => match self.policy {
                    TagPolicy::CreateMissing => {
                        let tag = store.create(name).await?;
                        tracing::info!("Created tag '{}' ({})", tag.name, tag.uuid);
                        tag
                    }
                    TagPolicy::Strict => {
                        tracing::debug!("Rejecting unknown tag '{}'", name);
                        return Err(ReconcileError::TagNotFound(name.clone()));
                    }
                },
            };

            resolved.push(tag);
        }

        owner.set_tags(resolved);
        Ok(())
    }
}
