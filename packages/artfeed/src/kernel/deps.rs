//! Application dependencies (using traits for testability)
//!
//! This module provides the central dependency container used by every
//! domain activity, plus the adapters that put the Supabase and OpenAI
//! clients behind the kernel traits.

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use openai_client::{ImageRequest, OpenAIClient};
use serde_json::Value;
use std::sync::Arc;
use supabase_client::{
    auth::SignUp, Bucket, BucketOptions, FileObject, FileOptions, Query, Session, SupabaseClient,
    User,
};

use crate::config::Config;
use crate::kernel::{BaseBlobStore, BaseIdentityProvider, BaseImageGenerator, BaseRecordStore};

// =============================================================================
// Supabase Adapters (implement the record, blob and identity traits)
// =============================================================================

/// PostgREST rows behind `BaseRecordStore`.
pub struct SupabaseRecordStore(pub SupabaseClient);

#[async_trait]
impl BaseRecordStore for SupabaseRecordStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>> {
        Ok(self.0.select(query).await?)
    }

    async fn select_one(&self, query: &Query) -> Result<Option<Value>> {
        match self.0.select_single(query).await {
            Ok(row) => Ok(Some(row)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn insert(&self, table: &str, row: Value, columns: &str) -> Result<Value> {
        Ok(self.0.insert(table, &row, columns).await?)
    }

    async fn update(&self, query: &Query, patch: Value) -> Result<Vec<Value>> {
        Ok(self.0.update(query, &patch).await?)
    }

    async fn delete(&self, query: &Query) -> Result<Vec<Value>> {
        Ok(self.0.delete(query).await?)
    }
}

/// Storage buckets behind `BaseBlobStore`.
pub struct SupabaseBlobStore(pub SupabaseClient);

#[async_trait]
impl BaseBlobStore for SupabaseBlobStore {
    async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        Ok(self.0.list_buckets().await?)
    }

    async fn create_bucket(&self, id: &str, options: &BucketOptions) -> Result<()> {
        Ok(self.0.create_bucket(id, options).await?)
    }

    async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<FileObject>> {
        Ok(self.0.list(bucket, prefix).await?)
    }

    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: Bytes,
        options: &FileOptions,
    ) -> Result<String> {
        Ok(self.0.upload(bucket, path, data, options).await?)
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<()> {
        self.0.remove(bucket, paths).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        self.0.public_url(bucket, path)
    }
}

/// GoTrue behind `BaseIdentityProvider`.
pub struct SupabaseIdentity(pub SupabaseClient);

#[async_trait]
impl BaseIdentityProvider for SupabaseIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Option<Session>> {
        match self.0.sign_up(email, password).await? {
            SignUp::Session(session) => Ok(Some(session)),
            SignUp::PendingConfirmation(_) => Ok(None),
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        Ok(self.0.sign_in_with_password(email, password).await?)
    }

    async fn get_user(&self, access_token: &str) -> Result<User> {
        Ok(self.0.get_user(access_token).await?)
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Session> {
        Ok(self.0.refresh_session(refresh_token).await?)
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        Ok(self.0.sign_out(access_token).await?)
    }

    fn use_session(&self, session: Option<&Session>) {
        self.0
            .set_access_token(session.map(|s| s.access_token.clone()));
    }
}

// =============================================================================
// OpenAI Adapter (implements BaseImageGenerator)
// =============================================================================

/// Wrapper around OpenAIClient that implements BaseImageGenerator
pub struct OpenAIImageGenerator {
    client: OpenAIClient,
    model: String,
}

impl OpenAIImageGenerator {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseImageGenerator for OpenAIImageGenerator {
    async fn generate(&self, prompt: &str, size: &str) -> Result<String> {
        let image = self
            .client
            .generate_image(ImageRequest::new(&self.model, prompt).size(size))
            .await?;
        Ok(image.b64_json)
    }
}

// =============================================================================
// AppDeps
// =============================================================================

/// Dependencies accessible to activities (using traits for testability)
#[derive(Clone)]
pub struct AppDeps {
    pub records: Arc<dyn BaseRecordStore>,
    pub blobs: Arc<dyn BaseBlobStore>,
    /// Image generator (optional: absent when no API key is configured)
    pub images: Option<Arc<dyn BaseImageGenerator>>,
    pub identity: Arc<dyn BaseIdentityProvider>,
    /// Bucket generated images are written to
    pub bucket: String,
}

impl AppDeps {
    pub fn new(
        records: Arc<dyn BaseRecordStore>,
        blobs: Arc<dyn BaseBlobStore>,
        images: Option<Arc<dyn BaseImageGenerator>>,
        identity: Arc<dyn BaseIdentityProvider>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            records,
            blobs,
            images,
            identity,
            bucket: bucket.into(),
        }
    }

    /// Wire the hosted services from configuration.
    ///
    /// All Supabase adapters share one client so a sign in applies to
    /// row, storage and auth calls alike.
    pub fn from_config(config: &Config) -> Self {
        let supabase = SupabaseClient::new(&config.supabase_url, &config.supabase_anon_key);

        let images = config.openai_api_key.as_ref().map(|key| {
            Arc::new(OpenAIImageGenerator::new(
                OpenAIClient::new(key.clone()),
                config.image_model.clone(),
            )) as Arc<dyn BaseImageGenerator>
        });

        Self::new(
            Arc::new(SupabaseRecordStore(supabase.clone())),
            Arc::new(SupabaseBlobStore(supabase.clone())),
            images,
            Arc::new(SupabaseIdentity(supabase)),
            config.storage_bucket.clone(),
        )
    }
}
