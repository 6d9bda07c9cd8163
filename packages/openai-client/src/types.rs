//! OpenAI API request and response types.

use serde::{Deserialize, Serialize};

/// Default image model.
pub const DALL_E_3: &str = "dall-e-3";

// =============================================================================
// Image Generation
// =============================================================================

/// Image generation request.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRequest {
    /// Model to use (e.g., "dall-e-3")
    pub model: String,

    /// Text prompt describing the image
    pub prompt: String,

    /// Number of images to generate
    pub n: u32,

    /// Always "b64_json"; this client never asks for hosted URLs
    pub response_format: String,

    /// Resolution, e.g. "1024x1024"
    pub size: String,
}

impl Default for ImageRequest {
    fn default() -> Self {
        Self {
            model: DALL_E_3.to_string(),
            prompt: String::new(),
            n: 1,
            response_format: "b64_json".to_string(),
            size: "1024x1024".to_string(),
        }
    }
}

impl ImageRequest {
    /// Create a new single-image request with the given model and prompt.
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    /// Set the resolution.
    pub fn size(mut self, size: impl Into<String>) -> Self {
        self.size = size.into();
        self
    }
}

/// Image generation response.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    /// Base64-encoded image (PNG)
    pub b64_json: String,

    /// Prompt as rewritten by the model, when reported
    pub revised_prompt: Option<String>,
}

/// Raw image response from API (for internal parsing).
#[derive(Debug, Deserialize)]
pub(crate) struct ImageResponseRaw {
    #[serde(default)]
    pub data: Vec<ImageDataRaw>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImageDataRaw {
    pub b64_json: Option<String>,
    pub revised_prompt: Option<String>,
}

// =============================================================================
// Errors
// =============================================================================

/// Error envelope returned on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
