//! Pure OpenAI REST API client
//!
//! A clean, minimal client for the OpenAI image generation API with no
//! domain-specific logic.
//!
//! # Example
//!
//! ```rust,ignore
//! use openai_client::{ImageRequest, OpenAIClient};
//!
//! let client = OpenAIClient::from_env()?;
//!
//! let image = client
//!     .generate_image(ImageRequest::new("dall-e-3", "A red balloon").size("1024x1024"))
//!     .await?;
//!
//! println!("{} base64 bytes", image.b64_json.len());
//! ```

pub mod error;
pub mod types;

pub use error::{OpenAIError, Result};
pub use types::*;

use reqwest::Client;
use tracing::{debug, warn};

/// Pure OpenAI API client.
#[derive(Clone)]
pub struct OpenAIClient {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| OpenAIError::Config("OPENAI_API_KEY not set".into()))?;
        if api_key.trim().is_empty() {
            return Err(OpenAIError::Config("OPENAI_API_KEY is empty".into()));
        }
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Image generation.
    ///
    /// One POST to `/images/generations`. A failed attempt is final; nothing
    /// here retries.
    pub async fn generate_image(&self, request: ImageRequest) -> Result<ImageResponse> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/images/generations", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "OpenAI image request failed");
                OpenAIError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI image API error");
            return Err(api_error(status.as_u16(), &error_text));
        }

        let image_response: types::ImageResponseRaw = response
            .json()
            .await
            .map_err(|e| OpenAIError::Parse(e.to_string()))?;

        let image = image_response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.b64_json.map(|b64| (b64, d.revised_prompt)))
            .filter(|(b64, _)| !b64.is_empty())
            .ok_or_else(|| {
                OpenAIError::Parse("Invalid response format from image generation API".into())
            })?;

        debug!(
            model = %request.model,
            size = %request.size,
            duration_ms = start.elapsed().as_millis(),
            "OpenAI image generation"
        );

        Ok(ImageResponse {
            b64_json: image.0,
            revised_prompt: image.1,
        })
    }
}

/// Build an API error from a non-2xx body, preferring the upstream message.
fn api_error(status: u16, body: &str) -> OpenAIError {
    let message = serde_json::from_str::<types::ErrorEnvelope>(body)
        .ok()
        .and_then(|env| env.error.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API error: {}", status));

    OpenAIError::Api { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = OpenAIClient::new("sk-test")
            .with_base_url("https://custom.api.com");

        assert_eq!(client.api_key, "sk-test");
        assert_eq!(client.base_url, "https://custom.api.com");
    }

    #[test]
    fn test_api_error_uses_upstream_message() {
        let err = api_error(400, r#"{"error":{"message":"Your request was rejected"}}"#);

        assert_eq!(err.status(), Some(400));
        assert_eq!(err.reason(), "Your request was rejected");
    }

    #[test]
    fn test_api_error_falls_back_to_status() {
        let err = api_error(502, "<html>Bad Gateway</html>");

        assert_eq!(err.reason(), "API error: 502");
    }
}
