// Business domains
pub mod auth;
pub mod comments;
pub mod images;
pub mod likes;
pub mod posts;
pub mod profiles;
pub mod storage;
