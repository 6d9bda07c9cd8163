//! Pure Supabase REST API client.
//!
//! A minimal client for the three Supabase services an application talks to
//! directly: GoTrue auth, PostgREST rows and Storage objects. No domain logic.
//!
//! # Example
//!
//! ```rust,ignore
//! use supabase_client::{Query, SupabaseClient};
//!
//! let client = SupabaseClient::from_env()?;
//! client.sign_in_with_password("ada@example.com", "hunter22").await?;
//!
//! let posts: Vec<serde_json::Value> = client
//!     .select(&Query::from("posts").select("*,profile:profiles(*)").limit(10))
//!     .await?;
//! ```

pub mod auth;
pub mod error;
pub mod postgrest;
pub mod storage;

pub use auth::{Session, SignUp, User};
pub use error::{Result, SupabaseError};
pub use postgrest::{Embed, Order, Query};
pub use storage::{Bucket, BucketOptions, FileObject, FileOptions};

use reqwest::{Client, Method, RequestBuilder, Response};
use std::sync::{Arc, RwLock};

/// Supabase API client.
///
/// Clones share the signed-in access token, so every clone issues requests
/// as the same user.
#[derive(Clone)]
pub struct SupabaseClient {
    http_client: Client,
    url: String,
    anon_key: String,
    access_token: Arc<RwLock<Option<String>>>,
}

impl SupabaseClient {
    /// Create a new client for the project at `url` using its anon key.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Create from environment variables `SUPABASE_URL` and `SUPABASE_ANON_KEY`.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("SUPABASE_URL")
            .map_err(|_| SupabaseError::Config("SUPABASE_URL not set".into()))?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY")
            .map_err(|_| SupabaseError::Config("SUPABASE_ANON_KEY not set".into()))?;
        Ok(Self::new(url, anon_key))
    }

    /// Project URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Anon (public) API key.
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// Current user access token, if signed in.
    pub fn access_token(&self) -> Option<String> {
        self.access_token
            .read()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// Replace the access token used for subsequent requests.
    pub fn set_access_token(&self, token: Option<String>) {
        if let Ok(mut guard) = self.access_token.write() {
            *guard = token;
        }
    }

    /// Start a request against `path` (relative to the project URL) with
    /// the API key and bearer token applied.
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let bearer = self
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());

        self.request_as(method, path, &bearer)
    }

    /// Like `request`, but authenticated with an explicit bearer token.
    pub(crate) fn request_as(&self, method: Method, path: &str, bearer: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.url, path))
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    /// Send a request, turning non-2xx responses into `SupabaseError::Api`.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(error = %e, "Supabase request failed");
            SupabaseError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(status = %status, body = %body, "Supabase API error");
            return Err(SupabaseError::from_body(status.as_u16(), &body));
        }

        Ok(response)
    }

    /// Send a request and decode the JSON response body.
    pub(crate) async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| SupabaseError::Parse(e.to_string()))
    }
}
