pub mod context;
pub mod session_file;

pub use context::{AuthContext, AuthState, AuthSubscription, StoredSession};
