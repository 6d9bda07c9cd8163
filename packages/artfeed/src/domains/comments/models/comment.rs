use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use supabase_client::Query;

use crate::common::{CommentId, PostId, UserId};
use crate::domains::profiles::Profile;
use crate::kernel::BaseRecordStore;

pub const COMMENT_WITH_PROFILE: &str = "*, profile:profiles(*)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub user_id: UserId,
    pub post_id: PostId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub user_id: UserId,
    pub post_id: PostId,
    pub content: String,
}

fn decode(row: Value) -> Result<Comment> {
    serde_json::from_value(row).context("Malformed comment row")
}

// =============================================================================
// Comment Queries
// =============================================================================

impl Comment {
    pub const TABLE: &'static str = "comments";

    /// Rows the author may change: matched on both id and author.
    fn owned(id: CommentId, user_id: UserId) -> Query {
        Query::from(Self::TABLE)
            .select(COMMENT_WITH_PROFILE)
            .eq("id", id)
            .eq("user_id", user_id)
    }

    /// Oldest first, each with its author.
    pub async fn find_by_post(post_id: PostId, store: &dyn BaseRecordStore) -> Result<Vec<Self>> {
        let rows = store
            .select(
                &Query::from(Self::TABLE)
                    .select(COMMENT_WITH_PROFILE)
                    .eq("post_id", post_id)
                    .order("created_at", true),
            )
            .await?;
        rows.into_iter().map(decode).collect()
    }

    pub async fn create(comment: &NewComment, store: &dyn BaseRecordStore) -> Result<Self> {
        let row = store
            .insert(
                Self::TABLE,
                serde_json::to_value(comment)?,
                COMMENT_WITH_PROFILE,
            )
            .await?;
        decode(row)
    }

    /// `None` when no comment with this id belongs to `user_id`.
    pub async fn update_content(
        id: CommentId,
        user_id: UserId,
        content: &str,
        store: &dyn BaseRecordStore,
    ) -> Result<Option<Self>> {
        let rows = store
            .update(&Self::owned(id, user_id), json!({ "content": content }))
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    /// Returns how many rows were removed.
    pub async fn delete(id: CommentId, user_id: UserId, store: &dyn BaseRecordStore) -> Result<usize> {
        Ok(store.delete(&Self::owned(id, user_id)).await?.len())
    }
}
