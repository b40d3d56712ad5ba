pub mod comment;
pub mod post;
pub mod tag;
pub mod user;

pub use comment::{Comment, CommentView};
pub use post::{Post, PostView};
pub use tag::{Tag, TagUsage};
pub use user::{User, UserView};
