//! In-memory collaborators for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::tags::{HasTags, Tag, TagStore, TagStoreError};

/// Tag store backed by a map, counting creates and optionally simulating
/// a lost creation race for one name
#[derive(Debug, Default)]
pub struct MemoryTagStore {
    tags: HashMap<String, Tag>,
    next_id: i64,
    pub create_calls: usize,
    pub conflict_on: Option<String>,
}

impl MemoryTagStore {
    pub fn with_tags(names: &[&str]) -> Self {
        let mut store = Self::default();
        for name in names {
            store.insert(name);
        }
        store
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tags.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    fn insert(&mut self, name: &str) -> Tag {
        self.next_id += 1;
        let tag = Tag {
            id: self.next_id,
            uuid: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.tags.insert(name.to_string(), tag.clone());
        tag
    }
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn find_by_name(&mut self, name: &str) -> Result<Option<Tag>, TagStoreError> {
        Ok(self.tags.get(name).cloned())
    }

    async fn create(&mut self, name: &str) -> Result<Tag, TagStoreError> {
        self.create_calls += 1;
        if self.conflict_on.as_deref() == Some(name) || self.tags.contains_key(name) {
            return Err(TagStoreError::Conflict(name.to_string()));
        }
        Ok(self.insert(name))
    }
}

/// Taggable owner that records how often its tag set was replaced
#[derive(Debug, Default)]
pub struct RecordingOwner {
    pub tags: Vec<Tag>,
    pub set_calls: usize,
}

impl RecordingOwner {
    pub fn tag_names(&self) -> Vec<String> {
        self.tags.iter().map(|t| t.name.clone()).collect()
    }
}

impl HasTags for RecordingOwner {
    fn set_tags(&mut self, tags: Vec<Tag>) {
        self.set_calls += 1;
        self.tags = tags;
    }
}
