//! Typed ids for every persisted entity.

pub use super::id::Id;

/// Marker for auth identities (and their 1:1 profiles).
pub struct User;

/// Marker for posts.
pub struct Post;

/// Marker for comments.
pub struct Comment;

/// Marker for likes.
pub struct Like;

/// Identity id; also the primary key of the user's profile row.
pub type UserId = Id<User>;

pub type PostId = Id<Post>;

pub type CommentId = Id<Comment>;

pub type LikeId = Id<Like>;
