//! Comment activities. Mutations are matched on id and author, so a user
//! can only change their own comments.

use tracing::{info, warn};

use crate::common::{AppError, AppResult, CommentId, PostId};
use crate::domains::auth::AuthContext;
use crate::domains::comments::models::{Comment, NewComment};
use crate::kernel::AppDeps;

fn validate_content(content: &str) -> AppResult<&str> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidInput(
            "Comment must not be empty".to_string(),
        ));
    }
    Ok(content)
}

/// A post's comments, oldest first. Failures are logged and read as no
/// comments.
pub async fn fetch_comments(post_id: PostId, deps: &AppDeps) -> Vec<Comment> {
    match Comment::find_by_post(post_id, deps.records.as_ref()).await {
        Ok(comments) => comments,
        Err(e) => {
            warn!(post_id = %post_id, error = %e, "Error fetching comments");
            Vec::new()
        }
    }
}

pub async fn add_comment(
    post_id: PostId,
    content: &str,
    auth: &AuthContext,
    deps: &AppDeps,
) -> AppResult<Comment> {
    let user_id = auth.require_user_id()?;
    let content = validate_content(content)?;

    let comment = Comment::create(
        &NewComment {
            user_id,
            post_id,
            content: content.to_string(),
        },
        deps.records.as_ref(),
    )
    .await?;

    info!(user_id = %user_id, post_id = %post_id, comment_id = %comment.id, "Comment added");
    Ok(comment)
}

/// Change the text of one of the caller's comments.
pub async fn update_comment(
    comment_id: CommentId,
    content: &str,
    auth: &AuthContext,
    deps: &AppDeps,
) -> AppResult<Comment> {
    let user_id = auth.require_user_id()?;
    let content = validate_content(content)?;

    let comment = Comment::update_content(comment_id, user_id, content, deps.records.as_ref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))?;

    info!(user_id = %user_id, comment_id = %comment_id, "Comment updated");
    Ok(comment)
}

/// Delete one of the caller's comments; returns rows affected. Someone
/// else's comment is left alone and yields zero.
pub async fn delete_comment(
    comment_id: CommentId,
    auth: &AuthContext,
    deps: &AppDeps,
) -> AppResult<usize> {
    let user_id = auth.require_user_id()?;

    let removed = Comment::delete(comment_id, user_id, deps.records.as_ref()).await?;
    info!(user_id = %user_id, comment_id = %comment_id, removed, "Comment delete");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::MockIdentityProvider;
    use crate::kernel::TestDependencies;

    #[tokio::test]
    async fn test_blank_comment_rejected_before_any_write() {
        let test = TestDependencies::new()
            .mock_identity(MockIdentityProvider::new().with_account("ada@example.com", "secret"));
        let auth = AuthContext::init(test.identity.clone());
        auth.sign_in("ada@example.com", "secret").await.unwrap();

        let err = add_comment(PostId::new(), "  \n", &auth, &test.deps())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(test.records.writes().is_empty());
    }

    #[tokio::test]
    async fn test_update_of_unknown_comment_is_not_found() {
        let test = TestDependencies::new()
            .mock_identity(MockIdentityProvider::new().with_account("ada@example.com", "secret"));
        let auth = AuthContext::init(test.identity.clone());
        auth.sign_in("ada@example.com", "secret").await.unwrap();

        let err = update_comment(CommentId::new(), "edited", &auth, &test.deps())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
    }
}
