//! Error types for Supabase client.

use thiserror::Error;

/// Result type for Supabase client operations.
pub type Result<T> = std::result::Result<T, SupabaseError>;

/// PostgREST code for "single object requested, zero or many rows found".
pub const NO_SINGLE_ROW: &str = "PGRST116";

/// Postgres unique violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Supabase client errors.
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// Configuration error (missing URL or key)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// API error (non-2xx response)
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
        details: Option<String>,
    },

    /// Parse error (invalid JSON, unexpected response format)
    #[error("Parse error: {0}")]
    Parse(String),
}

impl SupabaseError {
    /// Build an API error from a non-2xx response body.
    ///
    /// PostgREST, GoTrue and Storage each shape their error bodies slightly
    /// differently; this accepts all three.
    pub fn from_body(status: u16, body: &str) -> Self {
        let value: serde_json::Value = serde_json::from_str(body).unwrap_or_default();

        let message = ["message", "msg", "error_description", "error"]
            .iter()
            .find_map(|key| value.get(*key).and_then(|v| v.as_str()))
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                }
            });

        let code = ["code", "error_code"].iter().find_map(|key| {
            value.get(*key).and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
        });

        let details = value
            .get("details")
            .and_then(|v| v.as_str())
            .map(str::to_string);

        Self::Api {
            status,
            code,
            message,
            details,
        }
    }

    /// Error code reported by the backend, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// HTTP status of an API error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// True when a single-object request matched no rows.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Api { code, details, .. } => {
                code.as_deref() == Some(NO_SINGLE_ROW)
                    && details.as_deref().map_or(true, |d| d.contains("0 rows"))
            }
            _ => false,
        }
    }

    /// True when an insert collided with a unique constraint.
    pub fn is_unique_violation(&self) -> bool {
        self.code() == Some(UNIQUE_VIOLATION)
    }

    /// True when auth refused the token or grant itself. Transport failures
    /// and server errors are not rejections.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Api { status: 400 | 401 | 403, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_postgrest_not_found() {
        let err = SupabaseError::from_body(
            406,
            r#"{"code":"PGRST116","details":"The result contains 0 rows","hint":null,"message":"JSON object requested, multiple (or no) rows returned"}"#,
        );

        assert!(err.is_not_found());
        assert_eq!(err.status(), Some(406));
    }

    #[test]
    fn test_many_rows_is_not_not_found() {
        let err = SupabaseError::from_body(
            406,
            r#"{"code":"PGRST116","details":"The result contains 2 rows","message":"JSON object requested, multiple (or no) rows returned"}"#,
        );

        assert!(!err.is_not_found());
    }

    #[test]
    fn test_gotrue_error_shape() {
        let err = SupabaseError::from_body(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );

        match err {
            SupabaseError::Api { message, .. } => assert_eq!(message, "Invalid login credentials"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_numeric_code_and_plain_body() {
        let err = SupabaseError::from_body(422, r#"{"code":422,"msg":"Password too short"}"#);
        assert_eq!(err.code(), Some("422"));

        let err = SupabaseError::from_body(500, "");
        assert_eq!(err.to_string(), "API error (500): HTTP 500");
    }

    #[test]
    fn test_unique_violation() {
        let err = SupabaseError::from_body(
            409,
            r#"{"code":"23505","message":"duplicate key value violates unique constraint \"likes_user_id_post_id_key\""}"#,
        );

        assert!(err.is_unique_violation());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_auth_rejection_excludes_server_errors() {
        assert!(SupabaseError::from_body(401, r#"{"msg":"invalid JWT"}"#).is_auth_rejection());
        assert!(SupabaseError::from_body(
            400,
            r#"{"error_code":"refresh_token_not_found","msg":"Invalid Refresh Token"}"#
        )
        .is_auth_rejection());

        assert!(!SupabaseError::from_body(503, "upstream connect error").is_auth_rejection());
        assert!(!SupabaseError::Parse("truncated body".into()).is_auth_rejection());
    }
}
