//! Storage buckets and objects.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::{Result, SupabaseClient};

/// A storage bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub file_size_limit: Option<u64>,
    #[serde(default)]
    pub allowed_mime_types: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Settings for a new bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketOptions {
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mime_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size_limit: Option<u64>,
}

/// An object (or folder placeholder) inside a bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileObject {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Upload settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FileOptions {
    pub content_type: String,
    /// Seconds, sent as `max-age`
    pub cache_control: u32,
    /// Overwrite an existing object at the same path
    pub upsert: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            content_type: "application/octet-stream".to_string(),
            cache_control: 3600,
            upsert: false,
        }
    }
}

#[derive(Serialize)]
struct CreateBucket<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(flatten)]
    options: &'a BucketOptions,
}

#[derive(Serialize)]
struct ListObjects<'a> {
    prefix: &'a str,
    limit: u32,
    offset: u32,
    #[serde(rename = "sortBy")]
    sort_by: SortBy,
}

#[derive(Serialize)]
struct SortBy {
    column: &'static str,
    order: &'static str,
}

#[derive(Serialize)]
struct RemoveObjects<'a> {
    prefixes: &'a [String],
}

#[derive(Deserialize)]
struct UploadResponse {
    #[serde(rename = "Key")]
    key: String,
}

impl SupabaseClient {
    /// All buckets visible to the caller.
    pub async fn list_buckets(&self) -> Result<Vec<Bucket>> {
        let request = self.request(Method::GET, "/storage/v1/bucket");
        self.send_json(request).await
    }

    /// Create a bucket. Needs a role allowed to manage storage.
    pub async fn create_bucket(&self, id: &str, options: &BucketOptions) -> Result<()> {
        let request = self
            .request(Method::POST, "/storage/v1/bucket")
            .json(&CreateBucket {
                id,
                name: id,
                options,
            });

        self.send(request).await?;
        tracing::info!(bucket = id, public = options.public, "Created storage bucket");
        Ok(())
    }

    /// List objects under `prefix` (first 100, by name).
    pub async fn list(&self, bucket: &str, prefix: &str) -> Result<Vec<FileObject>> {
        let request = self
            .request(Method::POST, &format!("/storage/v1/object/list/{}", bucket))
            .json(&ListObjects {
                prefix,
                limit: 100,
                offset: 0,
                sort_by: SortBy {
                    column: "name",
                    order: "asc",
                },
            });

        self.send_json(request).await
    }

    /// Upload `data` to `path`; returns the object key (`bucket/path`).
    pub async fn upload(
        &self,
        bucket: &str,
        path: &str,
        data: impl Into<Bytes>,
        options: &FileOptions,
    ) -> Result<String> {
        let data: Bytes = data.into();
        let size = data.len();

        let request = self
            .request(Method::POST, &format!("/storage/v1/object/{}/{}", bucket, path))
            .header("Content-Type", &options.content_type)
            .header("cache-control", format!("max-age={}", options.cache_control))
            .header("x-upsert", options.upsert.to_string())
            .body(data);

        let response: UploadResponse = self.send_json(request).await?;
        tracing::debug!(bucket, path, size, "Uploaded object");
        Ok(response.key)
    }

    /// Delete objects by path.
    pub async fn remove(&self, bucket: &str, paths: &[String]) -> Result<Vec<FileObject>> {
        let request = self
            .request(Method::DELETE, &format!("/storage/v1/object/{}", bucket))
            .json(&RemoveObjects { prefixes: paths });

        self.send_json(request).await
    }

    /// Public URL for an object in a public bucket. Pure string building.
    pub fn public_url(&self, bucket: &str, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.url(),
            bucket,
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url() {
        let client = SupabaseClient::new("https://abc.supabase.co", "anon");

        assert_eq!(
            client.public_url("images", "u1/1700000000000-x1y2z.png"),
            "https://abc.supabase.co/storage/v1/object/public/images/u1/1700000000000-x1y2z.png"
        );
    }

    #[test]
    fn test_create_bucket_body() {
        let options = BucketOptions {
            public: true,
            allowed_mime_types: Some(vec!["image/png".into(), "image/jpeg".into()]),
            file_size_limit: Some(5 * 1024 * 1024),
        };
        let body = serde_json::to_value(CreateBucket {
            id: "images",
            name: "images",
            options: &options,
        })
        .unwrap();

        assert_eq!(body["id"], "images");
        assert_eq!(body["public"], true);
        assert_eq!(body["file_size_limit"], 5_242_880);
        assert_eq!(body["allowed_mime_types"][1], "image/jpeg");
    }

    #[test]
    fn test_bucket_parses_minimal_payload() {
        let bucket: Bucket =
            serde_json::from_str(r#"{"id":"images","name":"images","public":true}"#).unwrap();

        assert!(bucket.public);
        assert!(bucket.file_size_limit.is_none());
    }
}
