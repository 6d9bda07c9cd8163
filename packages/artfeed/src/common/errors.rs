use thiserror::Error;

/// Result alias for domain operations.
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Every failure a caller can see.
///
/// The post-creation stages each have their own variant so a caller can
/// tell how far a failed attempt got.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not authenticated")]
    AuthRequired,

    #[error("Failed to initialize profile: {0}")]
    ProfileInit(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Failed to convert image data: {0}")]
    Decode(String),

    #[error("Failed to upload image: {0}")]
    Upload(String),

    #[error("Failed to save post to database: {0}")]
    Persist(String),

    #[error("Image generation failed: {reason}")]
    Generation { reason: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Prompt must not be empty")]
    InvalidPrompt,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl AppError {
    pub fn generation(reason: impl Into<String>) -> Self {
        Self::Generation {
            reason: reason.into(),
        }
    }

    /// Stable label for logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AuthRequired => "auth_required",
            Self::ProfileInit(_) => "profile_init_failure",
            Self::StorageUnavailable(_) => "storage_unavailable",
            Self::Decode(_) => "decode_failure",
            Self::Upload(_) => "upload_failure",
            Self::Persist(_) => "persist_failure",
            Self::Generation { .. } => "generation_failure",
            Self::NotFound(_) => "not_found",
            Self::InvalidPrompt => "invalid_prompt",
            Self::InvalidInput(_) => "invalid_input",
            Self::Config(_) => "config",
            Self::Backend(_) => "backend",
        }
    }
}

/// Render an infrastructure error as a single user-readable line.
///
/// Client errors already carry the upstream message; for anything else the
/// full `anyhow` context chain is used.
pub(crate) fn reason(err: &anyhow::Error) -> String {
    if let Some(e) = err.downcast_ref::<supabase_client::SupabaseError>() {
        return match e {
            supabase_client::SupabaseError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
    }
    if let Some(e) = err.downcast_ref::<openai_client::OpenAIError>() {
        return e.reason().to_string();
    }
    format!("{:#}", err)
}
