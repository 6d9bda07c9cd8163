// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Domain code (profiles, posts, likes, comments) is written against these so
// tests can swap the hosted services for in-memory doubles.
//
// Naming convention: Base* for trait names (e.g., BaseRecordStore, BaseBlobStore)

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use supabase_client::{Bucket, BucketOptions, FileObject, FileOptions, Query, Session, User};

// =============================================================================
// Record Store Trait (Infrastructure - relational rows)
// =============================================================================

#[async_trait]
pub trait BaseRecordStore: Send + Sync {
    /// Rows matching the query, with embeds resolved
    async fn select(&self, query: &Query) -> Result<Vec<Value>>;

    /// Exactly one row, or `None` when nothing matches
    async fn select_one(&self, query: &Query) -> Result<Option<Value>>;

    /// Insert a row; returns it shaped by `columns`
    async fn insert(&self, table: &str, row: Value, columns: &str) -> Result<Value>;

    /// Patch matching rows; returns the rows that changed
    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>>;

    /// Delete matching rows; returns the rows that were removed
    async fn delete(&self, query: &Query) -> Result<Vec<Value>>;
}

// =============================================================================
// Blob Store Trait (Infrastructure - object storage)
// =============================================================================

#[async_trait]
pub trait BaseBlobStore: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<Bucket>>;

    async fn create_bucket(&self, id: &str, options: &BucketOptions) -> Result<()>;

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<FileObject>>;

    /// Store `data` at `path`; returns the object key
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        options: &FileOptions,
    ) -> Result<String>;

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()>;

    /// Public retrieval URL; no network call
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

// =============================================================================
// Image Generator Trait (Infrastructure - text-to-image)
// =============================================================================

#[async_trait]
pub trait BaseImageGenerator: Send + Sync {
    /// Generate one image and return it base64-encoded
    async fn generate(&self, prompt: &str, size: &str) -> Result<String>;
}

// =============================================================================
// Identity Provider Trait (Infrastructure - auth sessions)
// =============================================================================

#[async_trait]
pub trait BaseIdentityProvider: Send + Sync {
    /// Register; `None` when the account still needs email confirmation
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session>;

    /// Resolve the user behind an access token
    async fn get_user(&self, access_token: &str) -> Result<User>;

    /// Exchange a refresh token for a new session
    async fn refresh(&self, refresh_token: &str) -> Result<Session>;

    async fn sign_out(&self, access_token: &str) -> Result<()>;

    /// Make subsequent backend calls act as this session (or anonymously)
    fn use_session(&self, session: Option<&Session>);
}
