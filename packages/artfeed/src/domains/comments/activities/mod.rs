pub mod comments;

pub use comments::{add_comment, delete_comment, fetch_comments, update_comment};
