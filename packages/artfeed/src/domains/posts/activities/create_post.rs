//! Post creation: generated image to stored blob to published row.

use chrono::Utc;
use rand::Rng;
use supabase_client::FileOptions;
use tracing::{debug, error, info, warn};

use crate::common::errors::reason;
use crate::common::{AppError, AppResult, UserId};
use crate::domains::auth::AuthContext;
use crate::domains::images::activities::generate_image;
use crate::domains::images::types::{decode_base64_image, GenerationOptions};
use crate::domains::posts::models::{NewPost, Post};
use crate::domains::profiles::activities::ensure_profile;
use crate::kernel::AppDeps;

const CONTENT_TYPE: &str = "image/png";
const CACHE_CONTROL_SECS: u32 = 3600;
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate an image and publish it.
///
/// Generation runs before anything is written, so a generation failure
/// leaves no trace in storage or the database.
pub async fn generate_and_save_post(
    prompt: &str,
    options: GenerationOptions,
    caption: Option<&str>,
    auth: &AuthContext,
    deps: &AppDeps,
) -> AppResult<Post> {
    let image = generate_image(prompt, options, auth, deps).await?;
    save_image_post(&image.b64_json, &image.prompt, caption, auth, deps).await
}

/// Publish an already generated image.
///
/// Stages run strictly in order and the first failure is returned:
/// profile, storage preflight, decode, upload, public URL, row insert.
/// The row insert is last, so no post is ever visible without its image.
/// An insert failure leaves the uploaded blob in place.
pub async fn save_image_post(
    image_data: &str,
    prompt: &str,
    caption: Option<&str>,
    auth: &AuthContext,
    deps: &AppDeps,
) -> AppResult<Post> {
    let user = auth.require_user()?;
    let user_id = UserId::from_uuid(user.id);

    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::InvalidPrompt);
    }

    // 1. Profile
    debug!(user_id = %user_id, stage = "profile", "Ensuring profile");
    ensure_profile(&user, deps).await?;

    // 2. Storage preflight
    debug!(user_id = %user_id, stage = "preflight", bucket = %deps.bucket, "Checking storage");
    check_bucket(deps).await?;

    // 3. Decode
    let bytes = decode_base64_image(image_data).map_err(|e| {
        warn!(user_id = %user_id, stage = "decode", error = %e, "Image decode failed");
        e
    })?;

    // 4. Upload
    let path = object_key(user_id);
    let size = bytes.len();
    info!(user_id = %user_id, stage = "upload", key = %path, size, "Uploading image");
    deps.blobs
        .upload(
            &deps.bucket,
            &path,
            bytes,
            &FileOptions {
                content_type: CONTENT_TYPE.to_string(),
                cache_control: CACHE_CONTROL_SECS,
                upsert: true,
            },
        )
        .await
        .map_err(|e| {
            warn!(user_id = %user_id, stage = "upload", key = %path, error = %e, "Upload failed");
            AppError::Upload(reason(&e))
        })?;

    // 5. Public URL
    let image_url = deps.blobs.public_url(&deps.bucket, &path);
    debug!(user_id = %user_id, stage = "url", url = %image_url, "Resolved public URL");

    // 6. Row insert
    let new_post = NewPost {
        user_id,
        image_url,
        prompt: prompt.to_string(),
        caption: normalize_caption(caption),
    };
    let post = Post::create(&new_post, deps.records.as_ref())
        .await
        .map_err(|e| {
            error!(
                user_id = %user_id,
                stage = "persist",
                orphaned_key = %path,
                error = %e,
                "Post insert failed; uploaded image left in storage"
            );
            AppError::Persist(reason(&e))
        })?;

    info!(user_id = %user_id, post_id = %post.id, key = %path, "Post published");
    Ok(post)
}

/// The bucket must exist and be listable. Creating it is an administrative
/// action, never done here.
async fn check_bucket(deps: &AppDeps) -> AppResult<()> {
    let buckets = deps.blobs.list_buckets().await.map_err(|e| {
        warn!(stage = "preflight", error = %e, "Bucket listing failed");
        AppError::StorageUnavailable(format!("Storage access error: {}", reason(&e)))
    })?;

    if !buckets.iter().any(|b| b.id == deps.bucket) {
        warn!(stage = "preflight", bucket = %deps.bucket, "Bucket missing");
        return Err(AppError::StorageUnavailable(format!(
            "Storage bucket '{}' not found",
            deps.bucket
        )));
    }

    deps.blobs.list(&deps.bucket, "").await.map_err(|e| {
        warn!(stage = "preflight", bucket = %deps.bucket, error = %e, "Bucket not listable");
        AppError::StorageUnavailable(format!("Cannot access storage bucket: {}", reason(&e)))
    })?;
    Ok(())
}

/// `{user_id}/{unix millis}-{random base36}.png`
fn object_key(user_id: UserId) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}/{}-{}.png", user_id, Utc::now().timestamp_millis(), suffix)
}

fn normalize_caption(caption: Option<&str>) -> Option<String> {
    caption
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_shape() {
        let user_id = UserId::new();
        let key = object_key(user_id);

        let (dir, file) = key.split_once('/').unwrap();
        let (millis, suffix) = file.trim_end_matches(".png").split_once('-').unwrap();

        assert_eq!(dir, user_id.to_string());
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        assert!(key.ends_with(".png"));
    }

    #[test]
    fn test_object_keys_differ() {
        let user_id = UserId::new();
        assert_ne!(object_key(user_id), object_key(user_id));
    }

    #[test]
    fn test_caption_normalization() {
        assert_eq!(normalize_caption(None), None);
        assert_eq!(normalize_caption(Some("   ")), None);
        assert_eq!(normalize_caption(Some(" hi ")), Some("hi".to_string()));
    }
}
