//! GoTrue (Supabase Auth) endpoints.

use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Result, SupabaseClient, SupabaseError};

/// An authenticated identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A signed-in session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub user: User,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Outcome of a sign up: a session when the project auto-confirms emails,
/// otherwise just the pending user.
#[derive(Debug, Clone)]
pub enum SignUp {
    Session(Session),
    PendingConfirmation(User),
}

impl SupabaseClient {
    /// Register a new email/password identity.
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp> {
        let request = self
            .request(Method::POST, "/auth/v1/signup")
            .json(&Credentials { email, password });

        let value: serde_json::Value = self.send_json(request).await?;

        if value.get("access_token").is_some() {
            let session: Session = serde_json::from_value(value)
                .map_err(|e| SupabaseError::Parse(e.to_string()))?;
            self.set_access_token(Some(session.access_token.clone()));
            tracing::info!(user_id = %session.user.id, "Signed up with session");
            Ok(SignUp::Session(session))
        } else {
            let user: User = serde_json::from_value(value.get("user").cloned().unwrap_or(value))
                .map_err(|e| SupabaseError::Parse(e.to_string()))?;
            tracing::info!(user_id = %user.id, "Signed up, awaiting email confirmation");
            Ok(SignUp::PendingConfirmation(user))
        }
    }

    /// Exchange email and password for a session.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        let request = self
            .request(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password });

        let session: Session = self.send_json(request).await?;
        self.set_access_token(Some(session.access_token.clone()));

        tracing::info!(user_id = %session.user.id, "Signed in");
        Ok(session)
    }

    /// Exchange a refresh token for a new session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let request = self
            .request(Method::POST, "/auth/v1/token")
            .query(&[("grant_type", "refresh_token")])
            .json(&RefreshGrant { refresh_token });

        let session: Session = self.send_json(request).await?;
        self.set_access_token(Some(session.access_token.clone()));
        Ok(session)
    }

    /// Resolve the user behind an access token.
    pub async fn get_user(&self, access_token: &str) -> Result<User> {
        let request = self
            .request_as(Method::GET, "/auth/v1/user", access_token);

        self.send_json(request).await
    }

    /// Revoke the session behind an access token and forget it locally.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        let request = self
            .request_as(Method::POST, "/auth/v1/logout", access_token);

        let result = self.send(request).await.map(|_| ());
        self.set_access_token(None);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_parses_gotrue_payload() {
        let raw = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh",
            "user": {
                "id": "5b7c1f1e-0a2b-4d3c-9e8f-1a2b3c4d5e6f",
                "aud": "authenticated",
                "role": "authenticated",
                "email": "ada@example.com",
                "created_at": "2024-03-01T12:00:00Z"
            }
        }"#;

        let session: Session = serde_json::from_str(raw).unwrap();

        assert_eq!(session.access_token, "jwt");
        assert_eq!(session.expires_in, Some(3600));
        assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
    }

    #[test]
    fn test_user_without_email() {
        let user: User =
            serde_json::from_str(r#"{"id":"5b7c1f1e-0a2b-4d3c-9e8f-1a2b3c4d5e6f"}"#).unwrap();

        assert!(user.email.is_none());
        assert!(user.created_at.is_none());
    }
}
