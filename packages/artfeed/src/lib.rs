// Artfeed - core library
//
// Domain layer for a social feed of AI-generated images: sessions, image
// generation, the post-creation workflow, likes, comments and feed queries.
// Hosted services sit behind the traits in kernel/ so every domain activity
// can run against in-memory doubles.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;

pub use config::*;
