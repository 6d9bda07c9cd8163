pub mod create_post;
pub mod dashboard;
pub mod feed;

pub use create_post::{generate_and_save_post, save_image_post};
pub use dashboard::{fetch_dashboard, Dashboard, DashboardStats};
pub use feed::{fetch_global_feed, fetch_news, fetch_post, fetch_user_posts, NEWS_LIMIT};
