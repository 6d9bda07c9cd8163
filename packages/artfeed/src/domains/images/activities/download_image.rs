//! Saving a posted image locally.

use anyhow::{anyhow, Context};
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, warn};

use crate::common::{AppError, AppResult};

/// Download-friendly file name for a prompt: `a-red-balloon-<unix millis>.png`.
pub fn generate_filename(prompt: &str, ext: &str) -> String {
    filename_at(prompt, ext, Utc::now().timestamp_millis())
}

fn filename_at(prompt: &str, ext: &str, millis: i64) -> String {
    let mut slug = String::with_capacity(prompt.len());
    for c in prompt.to_lowercase().chars() {
        let c = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            c
        } else {
            '-'
        };
        if c == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(c);
    }
    let slug: String = slug.chars().take(50).collect();
    format!("{}-{}.{}", slug, millis, ext)
}

/// Fetch a public image URL.
pub async fn download_image(url: &str) -> AppResult<Bytes> {
    debug!(url = %url, "Downloading image");

    let response = reqwest::get(url)
        .await
        .with_context(|| format!("Failed to fetch {}", url))?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(url.to_string()));
    }
    if !status.is_success() {
        warn!(url = %url, status = %status, "Image download failed");
        return Err(anyhow!("Image download failed with status {}", status).into());
    }

    let bytes = response
        .bytes()
        .await
        .context("Failed to read image body")?;
    debug!(url = %url, size = bytes.len(), "Image downloaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Router};

    #[test]
    fn test_filename_slug() {
        assert_eq!(
            filename_at("A Red  Balloon!", "png", 1700000000000),
            "a-red-balloon--1700000000000.png"
        );
    }

    #[test]
    fn test_filename_truncates_slug() {
        let name = filename_at(&"x".repeat(80), "jpg", 1);
        assert_eq!(name, format!("{}-1.jpg", "x".repeat(50)));
    }

    #[tokio::test]
    async fn test_download_image() {
        let router = Router::new()
            .route("/img.png", get(|| async { b"\x89PNG".to_vec() }))
            .route("/gone.png", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let bytes = download_image(&format!("http://{}/img.png", addr))
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"\x89PNG");

        let err = download_image(&format!("http://{}/gone.png", addr))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
