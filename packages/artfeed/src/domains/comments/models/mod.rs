pub mod comment;

pub use comment::{Comment, NewComment, COMMENT_WITH_PROFILE};
