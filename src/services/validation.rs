use std::collections::HashMap;

use super::{ServiceError, ServiceResult};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 8;
const TITLE_MAX: usize = 200;
const TAG_NAME_MAX: usize = 50;

/// Collects per-field messages and turns them into one validation error
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: HashMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn username(&mut self, value: &str) -> &mut Self {
        let len = value.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
            self.add("username", format!("Must be {}-{} characters", USERNAME_MIN, USERNAME_MAX));
        } else if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            self.add("username", "Only letters, numbers, hyphens and underscores are allowed");
        }
        self
    }

    pub fn email(&mut self, value: &str) -> &mut Self {
        let valid = match value.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
            None => false,
        };
        if !valid {
            self.add("email", "Must be a valid email address");
        }
        self
    }

    pub fn password(&mut self, value: &str) -> &mut Self {
        if value.chars().count() < PASSWORD_MIN {
            self.add("password", format!("Must be at least {} characters", PASSWORD_MIN));
        }
        self
    }

    pub fn title(&mut self, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add("title", "This field is required");
        } else if value.chars().count() > TITLE_MAX {
            self.add("title", format!("Must be at most {} characters", TITLE_MAX));
        }
        self
    }

    pub fn content(&mut self, field: &str, value: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.add(field, "This field is required");
        }
        self
    }

    pub fn tag_names(&mut self, names: &[String]) -> &mut Self {
        for name in names {
            self.tag_name(name);
        }
        self
    }

    pub fn tag_name(&mut self, name: &str) -> &mut Self {
        if name.is_empty() {
            self.add("tags", "Tag names cannot be empty");
        } else if name.chars().count() > TAG_NAME_MAX {
            self.add("tags", format!("Tag names must be at most {} characters", TAG_NAME_MAX));
        }
        self
    }

    pub fn finish(&mut self) -> ServiceResult<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(ServiceError::Validation {
            message: "Validation failed".to_string(),
            field_errors: std::mem::take(&mut self.errors),
        })
    }
}
