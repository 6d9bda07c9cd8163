use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use supabase_client::Query;

use crate::common::{LikeId, PostId, UserId};
use crate::kernel::BaseRecordStore;

/// One user's like of one post; unique per (user, post).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub id: LikeId,
    pub user_id: UserId,
    pub post_id: PostId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewLike {
    pub user_id: UserId,
    pub post_id: PostId,
}

impl Like {
    pub const TABLE: &'static str = "likes";

    fn pair(user_id: UserId, post_id: PostId) -> Query {
        Query::from(Self::TABLE)
            .eq("user_id", user_id)
            .eq("post_id", post_id)
    }

    pub async fn find(
        user_id: UserId,
        post_id: PostId,
        store: &dyn BaseRecordStore,
    ) -> Result<Option<Self>> {
        let rows = store.select(&Self::pair(user_id, post_id).limit(1)).await?;
        rows.into_iter()
            .next()
            .map(|row| serde_json::from_value(row).context("Malformed like row"))
            .transpose()
    }

    pub async fn create(like: &NewLike, store: &dyn BaseRecordStore) -> Result<Self> {
        let row = store
            .insert(Self::TABLE, serde_json::to_value(like)?, "*")
            .await?;
        serde_json::from_value(row).context("Malformed like row")
    }

    /// Returns how many rows were removed.
    pub async fn delete(
        user_id: UserId,
        post_id: PostId,
        store: &dyn BaseRecordStore,
    ) -> Result<usize> {
        Ok(store.delete(&Self::pair(user_id, post_id)).await?.len())
    }
}
