//! Row fixtures shaped like the backend's tables.

use artfeed_core::common::{CommentId, PostId, UserId};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};

pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A point `minutes` before now.
pub fn minutes_ago(minutes: i64) -> DateTime<Utc> {
    Utc::now() - Duration::minutes(minutes)
}

pub fn profile_row(id: UserId, username: &str) -> Value {
    let at = timestamp(minutes_ago(60 * 24 * 30));
    json!({
        "id": id.to_string(),
        "username": username,
        "avatar_url": null,
        "bio": null,
        "created_at": at,
        "updated_at": at,
    })
}

pub fn post_row(id: PostId, user_id: UserId, created_at: DateTime<Utc>) -> Value {
    post_row_with_counts(id, user_id, created_at, 0, 0)
}

pub fn post_row_with_counts(
    id: PostId,
    user_id: UserId,
    created_at: DateTime<Utc>,
    likes: i64,
    comments: i64,
) -> Value {
    let at = timestamp(created_at);
    json!({
        "id": id.to_string(),
        "user_id": user_id.to_string(),
        "image_url": format!("https://mock.supabase.co/storage/v1/object/public/images/{}/{}.png", user_id, id),
        "prompt": format!("prompt {}", id.short(4)),
        "caption": null,
        "likes_count": likes,
        "comments_count": comments,
        "created_at": at,
        "updated_at": at,
    })
}

pub fn comment_row(
    id: CommentId,
    user_id: UserId,
    post_id: PostId,
    content: &str,
    created_at: DateTime<Utc>,
) -> Value {
    let at = timestamp(created_at);
    json!({
        "id": id.to_string(),
        "user_id": user_id.to_string(),
        "post_id": post_id.to_string(),
        "content": content,
        "created_at": at,
        "updated_at": at,
    })
}
