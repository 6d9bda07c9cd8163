//! Read-only post listings.

use tracing::debug;

use crate::common::{AppError, AppResult, PostId, UserId};
use crate::domains::posts::models::Post;
use crate::kernel::AppDeps;

/// Size of the "news" list.
pub const NEWS_LIMIT: usize = 10;

/// The ten newest posts.
pub async fn fetch_news(deps: &AppDeps) -> AppResult<Vec<Post>> {
    fetch_global_feed(NEWS_LIMIT, deps).await
}

/// Newest posts from everyone.
pub async fn fetch_global_feed(limit: usize, deps: &AppDeps) -> AppResult<Vec<Post>> {
    let posts = Post::find_recent(limit, deps.records.as_ref()).await?;
    debug!(limit, count = posts.len(), "Fetched global feed");
    Ok(posts)
}

/// A user's posts, newest first; all of them when `limit` is `None`.
pub async fn fetch_user_posts(
    user_id: UserId,
    limit: Option<usize>,
    deps: &AppDeps,
) -> AppResult<Vec<Post>> {
    let posts = Post::find_by_user(user_id, limit, deps.records.as_ref()).await?;
    debug!(user_id = %user_id, count = posts.len(), "Fetched user posts");
    Ok(posts)
}

pub async fn fetch_post(post_id: PostId, deps: &AppDeps) -> AppResult<Post> {
    Post::find_by_id(post_id, deps.records.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {}", post_id)))
}
