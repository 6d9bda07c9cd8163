//! Profile activities

use supabase_client::User;
use tracing::{info, warn};

use crate::common::errors::reason;
use crate::common::{AppError, AppResult, UserId};
use crate::domains::profiles::models::{NewProfile, Profile};
use crate::kernel::AppDeps;

/// Look up the user's profile, creating a default one if there is none.
///
/// Any failure, lookup or insert, is `ProfileInit`.
pub async fn ensure_profile(user: &User, deps: &AppDeps) -> AppResult<Profile> {
    let id = UserId::from_uuid(user.id);

    let existing = Profile::find_by_id(id, deps.records.as_ref())
        .await
        .map_err(|e| {
            warn!(user_id = %id, error = %e, "Profile lookup failed");
            AppError::ProfileInit(reason(&e))
        })?;
    if let Some(profile) = existing {
        return Ok(profile);
    }

    let new_profile = NewProfile::for_user(user);
    info!(user_id = %id, username = %new_profile.username, "Creating profile");

    Profile::create(&new_profile, deps.records.as_ref())
        .await
        .map_err(|e| {
            warn!(user_id = %id, error = %e, "Profile creation failed");
            AppError::ProfileInit(reason(&e))
        })
}

/// A user's profile; `NotFound` when the row does not exist.
pub async fn fetch_profile(user_id: UserId, deps: &AppDeps) -> AppResult<Profile> {
    Profile::find_by_id(user_id, deps.records.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile {}", user_id)))
}
