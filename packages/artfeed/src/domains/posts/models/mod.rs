pub mod post;

pub use post::{NewPost, Post, POST_WITH_PROFILE};
