pub mod comment_service;
pub mod post_service;
pub mod tag_links;
pub mod tag_service;
pub mod user_service;
pub mod validation;

pub use comment_service::CommentService;
pub use post_service::{PostInput, PostService, PostUpdate};
pub use tag_service::TagService;
pub use user_service::{RegisterInput, UserService, UserUpdate};

use std::collections::HashMap;

use crate::auth::password::PasswordError;
use crate::auth::reset_key::ResetKeyError;
use crate::database::DatabaseError;
use crate::tags::ReconcileError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    ResetKey(#[from] ResetKeyError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        ServiceError::Database(DatabaseError::Sqlx(err))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
