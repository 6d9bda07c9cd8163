use tracing::{info, warn};

use crate::common::{AppResult, PostId};
use crate::domains::auth::AuthContext;
use crate::domains::likes::models::{Like, NewLike};
use crate::kernel::AppDeps;

/// Flip the caller's like on a post, given what the caller believes the
/// current state is. Returns the new state.
///
/// One backend call; concurrent toggles are left to the backend's
/// uniqueness constraint.
pub async fn toggle_like(
    post_id: PostId,
    currently_liked: bool,
    auth: &AuthContext,
    deps: &AppDeps,
) -> AppResult<bool> {
    let user_id = auth.require_user_id()?;

    if currently_liked {
        let removed = Like::delete(user_id, post_id, deps.records.as_ref()).await?;
        info!(user_id = %user_id, post_id = %post_id, removed, "Unliked post");
        Ok(false)
    } else {
        Like::create(&NewLike { user_id, post_id }, deps.records.as_ref()).await?;
        info!(user_id = %user_id, post_id = %post_id, "Liked post");
        Ok(true)
    }
}

/// Whether the caller has liked a post. Lookup failures read as "not liked".
pub async fn check_like_status(post_id: PostId, auth: &AuthContext, deps: &AppDeps) -> bool {
    let Ok(user_id) = auth.require_user_id() else {
        return false;
    };

    match Like::find(user_id, post_id, deps.records.as_ref()).await {
        Ok(like) => like.is_some(),
        Err(e) => {
            warn!(user_id = %user_id, post_id = %post_id, error = %e, "Like status lookup failed");
            false
        }
    }
}
