use openai_client::OpenAIError;
use tracing::{info, warn};

use crate::common::errors::reason;
use crate::common::{AppError, AppResult};
use crate::domains::auth::AuthContext;
use crate::domains::images::types::{GeneratedImage, GenerationOptions};
use crate::kernel::AppDeps;

const UNEXPECTED_FORMAT: &str = "unexpected response format";

/// Generate one image for a signed-in user.
///
/// A single upstream attempt; any failure is `Generation` and nothing is
/// written anywhere. Quality and style are validated by their types and
/// logged, but the upstream request only carries the size.
pub async fn generate_image(
    prompt: &str,
    options: GenerationOptions,
    auth: &AuthContext,
    deps: &AppDeps,
) -> AppResult<GeneratedImage> {
    let user = auth.require_user()?;

    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::InvalidPrompt);
    }

    let generator = deps
        .images
        .as_ref()
        .ok_or_else(|| AppError::Config("OpenAI API key is not configured".to_string()))?;

    info!(
        user_id = %user.id,
        size = %options.size,
        quality = %options.quality,
        style = %options.style,
        "Generating image"
    );

    let b64_json = generator
        .generate(prompt, options.size.as_str())
        .await
        .map_err(|e| {
            warn!(user_id = %user.id, error = %e, "Image generation failed");
            match e.downcast_ref::<OpenAIError>() {
                Some(OpenAIError::Parse(_)) => AppError::generation(UNEXPECTED_FORMAT),
                _ => AppError::generation(reason(&e)),
            }
        })?;

    if b64_json.trim().is_empty() {
        warn!(user_id = %user.id, "Image generation returned no payload");
        return Err(AppError::generation(UNEXPECTED_FORMAT));
    }

    info!(user_id = %user.id, encoded_len = b64_json.len(), "Image generated");

    Ok(GeneratedImage {
        prompt: prompt.to_string(),
        options,
        b64_json,
    })
}
