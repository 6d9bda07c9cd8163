use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use supabase_client::Query;

use crate::common::{PostId, UserId};
use crate::domains::profiles::Profile;
use crate::kernel::BaseRecordStore;

/// Select list that returns a post with its author embedded.
pub const POST_WITH_PROFILE: &str = "*, profile:profiles!posts_user_id_fkey(*)";

/// A published image. Counters are maintained by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub image_url: String,
    pub prompt: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub likes_count: i64,
    #[serde(default)]
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewPost {
    pub user_id: UserId,
    pub image_url: String,
    pub prompt: String,
    pub caption: Option<String>,
}

fn decode(rows: Vec<Value>) -> Result<Vec<Post>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).context("Malformed post row"))
        .collect()
}

// =============================================================================
// Post Queries
// =============================================================================

impl Post {
    pub const TABLE: &'static str = "posts";

    pub async fn find_by_id(id: PostId, store: &dyn BaseRecordStore) -> Result<Option<Self>> {
        let row = store
            .select_one(
                &Query::from(Self::TABLE)
                    .select(POST_WITH_PROFILE)
                    .eq("id", id)
                    .single(),
            )
            .await?;
        row.map(|row| serde_json::from_value(row).context("Malformed post row"))
            .transpose()
    }

    /// Newest first across all users.
    pub async fn find_recent(limit: usize, store: &dyn BaseRecordStore) -> Result<Vec<Self>> {
        let rows = store
            .select(
                &Query::from(Self::TABLE)
                    .select(POST_WITH_PROFILE)
                    .order("created_at", false)
                    .limit(limit),
            )
            .await?;
        decode(rows)
    }

    /// Newest first for one author.
    pub async fn find_by_user(
        user_id: UserId,
        limit: Option<usize>,
        store: &dyn BaseRecordStore,
    ) -> Result<Vec<Self>> {
        let mut query = Query::from(Self::TABLE)
            .select(POST_WITH_PROFILE)
            .eq("user_id", user_id)
            .order("created_at", false);
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        decode(store.select(&query).await?)
    }

    /// Insert and return the row with its author embedded.
    pub async fn create(post: &NewPost, store: &dyn BaseRecordStore) -> Result<Self> {
        let row = store
            .insert(Self::TABLE, serde_json::to_value(post)?, POST_WITH_PROFILE)
            .await?;
        serde_json::from_value(row).context("Malformed post row")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decodes_embedded_profile_and_null_caption() {
        let post: Post = serde_json::from_value(json!({
            "id": "0b7c1f1e-0a2b-4d3c-9e8f-1a2b3c4d5e6f",
            "user_id": "5b7c1f1e-0a2b-4d3c-9e8f-1a2b3c4d5e6f",
            "image_url": "https://x.supabase.co/storage/v1/object/public/images/a.png",
            "prompt": "A red balloon",
            "caption": null,
            "likes_count": 2,
            "comments_count": 0,
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
            "profile": {
                "id": "5b7c1f1e-0a2b-4d3c-9e8f-1a2b3c4d5e6f",
                "username": "ada",
                "avatar_url": null,
                "bio": null,
                "created_at": "2024-04-01T10:00:00Z",
                "updated_at": "2024-04-01T10:00:00Z"
            }
        }))
        .unwrap();

        assert_eq!(post.caption, None);
        assert_eq!(post.profile.unwrap().username, "ada");
    }

    #[test]
    fn test_new_post_sends_null_caption() {
        let body = serde_json::to_value(NewPost {
            user_id: UserId::new(),
            image_url: "u".into(),
            prompt: "p".into(),
            caption: None,
        })
        .unwrap();
        assert!(body["caption"].is_null());
        assert!(body.get("likes_count").is_none());
    }
}
