//! Session context shared by every activity.
//!
//! `AuthContext` owns the current `AuthState` in a `watch` channel. Callers
//! that render or react to auth changes hold an `AuthSubscription`; dropping
//! it unsubscribes. Activities only ever call `require_user`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use supabase_client::{Session, SupabaseError, User};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::common::{AppError, AppResult, UserId};
use crate::kernel::BaseIdentityProvider;

/// Where the session currently stands.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// Not resolved yet; nothing should render an app shell or a login form
    Loading,
    SignedOut,
    SignedIn(Session),
}

impl AuthState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// The tokens kept between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
        }
    }
}

/// A live view of the auth state. Dropping it is the teardown.
pub struct AuthSubscription {
    rx: watch::Receiver<AuthState>,
}

impl AuthSubscription {
    /// The state as of now.
    pub fn current(&self) -> AuthState {
        self.rx.borrow().clone()
    }

    /// Wait for the next change; `None` once the context is gone.
    pub async fn changed(&mut self) -> Option<AuthState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        debug!("Auth subscription released");
    }
}

/// Explicitly passed session state.
pub struct AuthContext {
    identity: Arc<dyn BaseIdentityProvider>,
    state: watch::Sender<AuthState>,
}

impl AuthContext {
    /// Start in `Loading`; call `restore` to resolve.
    pub fn init(identity: Arc<dyn BaseIdentityProvider>) -> Self {
        let (state, _) = watch::channel(AuthState::Loading);
        Self { identity, state }
    }

    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            rx: self.state.subscribe(),
        }
    }

    /// Live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.state.receiver_count()
    }

    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    pub fn user(&self) -> Option<User> {
        self.session().map(|s| s.user)
    }

    /// The signed-in user, or `AuthRequired`.
    pub fn require_user(&self) -> AppResult<User> {
        self.user().ok_or(AppError::AuthRequired)
    }

    /// Typed id of the signed-in user.
    pub fn require_user_id(&self) -> AppResult<UserId> {
        self.require_user().map(|u| UserId::from_uuid(u.id))
    }

    /// Resolve `Loading` from stored tokens.
    ///
    /// An access token the backend rejects is exchanged through the refresh
    /// token; when that is rejected too the state becomes `SignedOut`. Any
    /// other failure (unreachable host, server error) is returned and the
    /// state stays `Loading`, so the stored tokens remain usable.
    pub async fn restore(&self, stored: Option<&StoredSession>) -> AppResult<AuthState> {
        let Some(stored) = stored.filter(|s| !s.access_token.is_empty()) else {
            self.clear();
            return Ok(AuthState::SignedOut);
        };

        match self.identity.get_user(&stored.access_token).await {
            Ok(user) => {
                info!(user_id = %user.id, "Session restored");
                self.set(Session {
                    access_token: stored.access_token.clone(),
                    refresh_token: stored.refresh_token.clone(),
                    token_type: Some("bearer".to_string()),
                    expires_in: None,
                    user,
                });
                return Ok(self.state());
            }
            Err(e) if !is_rejection(&e) => {
                warn!(error = %e, "Could not verify stored session");
                return Err(AppError::Backend(e));
            }
            Err(e) => debug!(error = %e, "Stored access token rejected"),
        }

        if stored.refresh_token.is_empty() {
            self.clear();
            return Ok(AuthState::SignedOut);
        }

        match self.identity.refresh(&stored.refresh_token).await {
            Ok(session) => {
                info!(user_id = %session.user.id, "Session refreshed");
                self.set(session);
            }
            Err(e) if is_rejection(&e) => {
                warn!(error = %e, "Stored session rejected");
                self.clear();
            }
            Err(e) => {
                warn!(error = %e, "Could not refresh stored session");
                return Err(AppError::Backend(e));
            }
        }
        Ok(self.state())
    }

    /// Register; returns the session when the backend signs the user in
    /// right away, `None` while email confirmation is pending.
    pub async fn sign_up(&self, email: &str, password: &str) -> AppResult<Option<Session>> {
        validate_credentials(email, password)?;

        let session = self.identity.sign_up(email.trim(), password).await?;
        match &session {
            Some(session) => {
                info!(user_id = %session.user.id, "Signed up");
                self.set(session.clone());
            }
            None => info!(email = %email.trim(), "Sign up pending email confirmation"),
        }
        Ok(session)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        validate_credentials(email, password)?;

        let session = self.identity.sign_in(email.trim(), password).await?;
        info!(user_id = %session.user.id, "Signed in");
        self.set(session.clone());
        Ok(session)
    }

    /// Revoke the session upstream and clear it locally.
    ///
    /// The local state is cleared even when the revoke call fails.
    pub async fn sign_out(&self) -> AppResult<()> {
        if let Some(session) = self.session() {
            if let Err(e) = self.identity.sign_out(&session.access_token).await {
                warn!(error = %e, user_id = %session.user.id, "Sign out request failed");
            }
            info!(user_id = %session.user.id, "Signed out");
        }
        self.clear();
        Ok(())
    }

    fn set(&self, session: Session) {
        self.identity.use_session(Some(&session));
        self.state.send_replace(AuthState::SignedIn(session));
    }

    fn clear(&self) {
        self.identity.use_session(None);
        self.state.send_replace(AuthState::SignedOut);
    }
}

/// The backend refused the token itself, as opposed to not answering.
fn is_rejection(err: &anyhow::Error) -> bool {
    err.downcast_ref::<SupabaseError>()
        .map_or(false, SupabaseError::is_auth_rejection)
}

fn validate_credentials(email: &str, password: &str) -> AppResult<()> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(AppError::InvalidInput(
            "Email and password are required".to_string(),
        ));
    }
    Ok(())
}
