//! Home page summary for the signed-in user.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::common::{AppResult, UserId};
use crate::domains::auth::AuthContext;
use crate::domains::posts::models::Post;
use crate::domains::profiles::Profile;
use crate::kernel::AppDeps;

/// How many of the user's own posts the dashboard shows.
pub const DASHBOARD_POSTS: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_posts: usize,
    pub total_likes: i64,
    pub total_comments: i64,
    /// Posts created after this time last week
    pub recent_posts: usize,
}

impl DashboardStats {
    /// Stats over the given posts as of `now`.
    pub fn from_posts(posts: &[Post], now: DateTime<Utc>) -> Self {
        let week_ago = now - Duration::days(7);
        Self {
            total_posts: posts.len(),
            total_likes: posts.iter().map(|p| p.likes_count).sum(),
            total_comments: posts.iter().map(|p| p.comments_count).sum(),
            recent_posts: posts.iter().filter(|p| p.created_at > week_ago).count(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// `None` until the first post creates the profile
    pub profile: Option<Profile>,
    pub recent_posts: Vec<Post>,
    pub stats: DashboardStats,
}

/// Profile, latest own posts and stats computed over those posts.
pub async fn fetch_dashboard(auth: &AuthContext, deps: &AppDeps) -> AppResult<Dashboard> {
    let user_id: UserId = auth.require_user_id()?;

    let profile = Profile::find_by_id(user_id, deps.records.as_ref()).await?;
    let recent_posts =
        Post::find_by_user(user_id, Some(DASHBOARD_POSTS), deps.records.as_ref()).await?;
    let stats = DashboardStats::from_posts(&recent_posts, Utc::now());

    Ok(Dashboard {
        profile,
        recent_posts,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::PostId;

    fn post(days_ago: i64, likes: i64, comments: i64, now: DateTime<Utc>) -> Post {
        let created_at = now - Duration::days(days_ago);
        Post {
            id: PostId::new(),
            user_id: UserId::new(),
            image_url: "u".into(),
            prompt: "p".into(),
            caption: None,
            likes_count: likes,
            comments_count: comments,
            created_at,
            updated_at: created_at,
            profile: None,
        }
    }

    #[test]
    fn test_stats_over_posts() {
        let now = Utc::now();
        let posts = vec![post(1, 3, 1, now), post(6, 2, 0, now), post(30, 5, 4, now)];

        let stats = DashboardStats::from_posts(&posts, now);

        assert_eq!(
            stats,
            DashboardStats {
                total_posts: 3,
                total_likes: 10,
                total_comments: 5,
                recent_posts: 2,
            }
        );
    }

    #[test]
    fn test_post_exactly_a_week_old_is_not_recent() {
        let now = Utc::now();
        let posts = vec![post(7, 0, 0, now), post(0, 0, 0, now)];

        assert_eq!(DashboardStats::from_posts(&posts, now).recent_posts, 1);
    }

    #[test]
    fn test_empty_stats() {
        assert_eq!(DashboardStats::from_posts(&[], Utc::now()), DashboardStats::default());
    }
}
