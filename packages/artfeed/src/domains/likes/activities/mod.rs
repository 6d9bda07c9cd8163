pub mod toggle_like;

pub use toggle_like::{check_like_status, toggle_like};
