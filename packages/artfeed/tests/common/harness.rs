//! Test harness over the in-memory dependencies.
//!
//! Each test gets its own mocks and its own session; nothing is shared
//! between tests.

use artfeed_core::common::UserId;
use artfeed_core::domains::auth::AuthContext;
use artfeed_core::kernel::{AppDeps, TestDependencies};

pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "correct horse battery staple";

pub struct TestHarness {
    /// The mocks, for seeding and assertions
    pub test: TestDependencies,
    pub deps: AppDeps,
    pub auth: AuthContext,
}

impl TestHarness {
    /// Signed out harness over the given mocks.
    pub fn new(test: TestDependencies) -> Self {
        // Run tests with: RUST_LOG=debug cargo test -- --nocapture
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let deps = test.deps();
        let auth = AuthContext::init(test.identity.clone());
        Self { test, deps, auth }
    }

    /// Harness with a freshly registered, signed-in user and no profile row.
    pub async fn signed_in(test: TestDependencies) -> Self {
        let harness = Self::new(test);
        harness
            .auth
            .sign_up(EMAIL, PASSWORD)
            .await
            .expect("sign up")
            .expect("session");
        harness
    }

    pub fn user_id(&self) -> UserId {
        self.auth.require_user_id().expect("signed in")
    }
}
