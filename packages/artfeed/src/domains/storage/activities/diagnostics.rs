//! Storage diagnostics.
//!
//! Administrative checks kept off the post-creation path: inspect the
//! buckets, create the images bucket, and prove a signed-in user can write
//! to it.

use serde::Serialize;
use supabase_client::{Bucket, BucketOptions, FileOptions};
use tracing::{error, info, warn};

use crate::common::errors::reason;
use crate::common::{AppError, AppResult, UserId};
use crate::domains::auth::AuthContext;
use crate::domains::images::types::decode_base64_image;
use crate::kernel::AppDeps;

/// Upper bound on files in the images bucket (5 MiB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// A 1x1 transparent PNG.
const TEST_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

#[derive(Debug, Clone, Serialize)]
pub struct StorageReport {
    pub bucket: String,
    pub buckets: Vec<Bucket>,
    pub bucket_found: bool,
    /// The bucket exists and its contents can be listed
    pub accessible: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BucketAccessTest {
    pub path: String,
    pub public_url: String,
    /// The test object was removed again
    pub cleaned_up: bool,
}

/// Inspect storage. Problems are reported in the result, not returned as
/// errors.
pub async fn check_storage(deps: &AppDeps) -> StorageReport {
    let mut report = StorageReport {
        bucket: deps.bucket.clone(),
        buckets: Vec::new(),
        bucket_found: false,
        accessible: false,
        error: None,
    };

    report.buckets = match deps.blobs.list_buckets().await {
        Ok(buckets) => buckets,
        Err(e) => {
            error!(error = %e, "Storage access error");
            report.error = Some(format!("Storage access error: {}", reason(&e)));
            return report;
        }
    };
    info!(count = report.buckets.len(), "Found buckets");

    report.bucket_found = report.buckets.iter().any(|b| b.id == deps.bucket);
    if !report.bucket_found {
        warn!(bucket = %deps.bucket, "Images bucket not found");
        report.error = Some(format!(
            "Bucket '{}' not found in available buckets",
            deps.bucket
        ));
        return report;
    }

    match deps.blobs.list(&deps.bucket, "").await {
        Ok(files) => {
            info!(bucket = %deps.bucket, files = files.len(), "Listed bucket contents");
            report.accessible = true;
        }
        Err(e) => {
            error!(bucket = %deps.bucket, error = %e, "Cannot list bucket");
            report.error = Some(format!("Cannot access bucket: {}", reason(&e)));
        }
    }
    report
}

/// Create the images bucket: public, PNG and JPEG only, 5 MiB per file.
/// Returns a fresh report afterwards.
pub async fn create_images_bucket(deps: &AppDeps) -> AppResult<StorageReport> {
    let options = BucketOptions {
        public: true,
        allowed_mime_types: Some(vec!["image/png".to_string(), "image/jpeg".to_string()]),
        file_size_limit: Some(MAX_IMAGE_BYTES),
    };

    info!(bucket = %deps.bucket, "Creating bucket");
    deps.blobs
        .create_bucket(&deps.bucket, &options)
        .await
        .map_err(|e| {
            error!(bucket = %deps.bucket, error = %e, "Bucket creation failed");
            AppError::StorageUnavailable(format!("Failed to create bucket: {}", reason(&e)))
        })?;

    Ok(check_storage(deps).await)
}

/// Upload a tiny PNG under the caller's folder, then remove it.
pub async fn test_bucket_access(auth: &AuthContext, deps: &AppDeps) -> AppResult<BucketAccessTest> {
    let user_id: UserId = auth.require_user_id()?;
    let path = format!("{}/test.png", user_id);
    let bytes = decode_base64_image(TEST_PNG_BASE64)?;

    deps.blobs
        .upload(
            &deps.bucket,
            &path,
            bytes,
            &FileOptions {
                content_type: "image/png".to_string(),
                upsert: true,
                ..Default::default()
            },
        )
        .await
        .map_err(|e| {
            error!(bucket = %deps.bucket, path = %path, error = %e, "Test upload failed");
            AppError::Upload(reason(&e))
        })?;
    let public_url = deps.blobs.public_url(&deps.bucket, &path);
    info!(bucket = %deps.bucket, path = %path, "Test upload succeeded");

    let cleaned_up = match deps.blobs.remove(&deps.bucket, &[path.clone()]).await {
        Ok(()) => true,
        Err(e) => {
            warn!(bucket = %deps.bucket, path = %path, error = %e, "Test file cleanup failed");
            false
        }
    };

    Ok(BucketAccessTest {
        path,
        public_url,
        cleaned_up,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::test_dependencies::{BlobOp, MockBlobStore};
    use crate::kernel::TestDependencies;

    #[tokio::test]
    async fn test_reports_missing_bucket() {
        let test = TestDependencies::new().mock_blobs(MockBlobStore::new().with_bucket("avatars"));

        let report = check_storage(&test.deps()).await;

        assert_eq!(report.buckets.len(), 1);
        assert!(!report.bucket_found);
        assert!(!report.accessible);
        assert!(report.error.unwrap().contains("'images' not found"));
    }

    #[tokio::test]
    async fn test_reports_listing_failure() {
        let test = TestDependencies::new()
            .mock_blobs(MockBlobStore::new().failing(BlobOp::ListBuckets));

        let report = check_storage(&test.deps()).await;

        assert!(report.error.unwrap().starts_with("Storage access error"));
    }

    #[tokio::test]
    async fn test_create_bucket_settings() {
        let test = TestDependencies::new().mock_blobs(MockBlobStore::new());

        let report = create_images_bucket(&test.deps()).await.unwrap();

        assert!(report.accessible);
        let (id, options) = &test.blobs.created_buckets()[0];
        assert_eq!(id, "images");
        assert!(options.public);
        assert_eq!(options.file_size_limit, Some(5_242_880));
        assert_eq!(
            options.allowed_mime_types.as_deref(),
            Some(&["image/png".to_string(), "image/jpeg".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_create_existing_bucket_fails() {
        let test = TestDependencies::new();
        let err = create_images_bucket(&test.deps()).await.unwrap_err();
        assert!(matches!(err, AppError::StorageUnavailable(_)));
    }
}
