use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use supabase_client::{Query, User};

use crate::common::UserId;
use crate::kernel::BaseRecordStore;

/// Public face of an auth identity; shares its primary key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload; the backend fills in the rest.
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: UserId,
    pub username: String,
}

impl NewProfile {
    /// Default profile for a user seen for the first time.
    pub fn for_user(user: &User) -> Self {
        Self {
            id: UserId::from_uuid(user.id),
            username: default_username(user),
        }
    }
}

/// Email local-part, or `user_` plus the first eight hex digits of the id.
pub fn default_username(user: &User) -> String {
    user.email
        .as_deref()
        .and_then(|email| email.split('@').next())
        .filter(|local| !local.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("user_{}", UserId::from_uuid(user.id).short(8)))
}

// =============================================================================
// Profile Queries
// =============================================================================

impl Profile {
    pub const TABLE: &'static str = "profiles";

    pub async fn find_by_id(id: UserId, store: &dyn BaseRecordStore) -> Result<Option<Self>> {
        let row = store
            .select_one(&Query::from(Self::TABLE).eq("id", id).single())
            .await?;
        row.map(|row| serde_json::from_value(row).context("Malformed profile row"))
            .transpose()
    }

    pub async fn create(profile: &NewProfile, store: &dyn BaseRecordStore) -> Result<Self> {
        let row = store
            .insert(Self::TABLE, serde_json::to_value(profile)?, "*")
            .await?;
        serde_json::from_value(row).context("Malformed profile row")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(email: Option<&str>) -> User {
        User {
            id: Uuid::parse_str("5b7c1f1e-0a2b-4d3c-9e8f-1a2b3c4d5e6f").unwrap(),
            email: email.map(str::to_string),
            role: None,
            created_at: None,
        }
    }

    #[test]
    fn test_username_from_email_local_part() {
        assert_eq!(default_username(&user(Some("ada.l@example.com"))), "ada.l");
    }

    #[test]
    fn test_username_falls_back_to_id_prefix() {
        assert_eq!(default_username(&user(None)), "user_5b7c1f1e");
        assert_eq!(default_username(&user(Some("@example.com"))), "user_5b7c1f1e");
    }
}
