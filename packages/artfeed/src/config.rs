use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Only needed for image generation
    pub openai_api_key: Option<String>,
    pub image_model: String,
    pub storage_bucket: String,
    /// Where the CLI keeps the signed-in session between runs
    pub session_file: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            supabase_url: env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
            supabase_anon_key: env::var("SUPABASE_ANON_KEY")
                .context("SUPABASE_ANON_KEY must be set")?,
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            image_model: env::var("IMAGE_MODEL")
                .unwrap_or_else(|_| openai_client::DALL_E_3.to_string()),
            storage_bucket: env::var("STORAGE_BUCKET").unwrap_or_else(|_| "images".to_string()),
            session_file: env::var("ARTFEED_SESSION_FILE")
                .unwrap_or_else(|_| ".artfeed-session".to_string())
                .into(),
        })
    }
}
