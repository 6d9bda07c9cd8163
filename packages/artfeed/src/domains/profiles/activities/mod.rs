pub mod ensure_profile;

pub use ensure_profile::{ensure_profile, fetch_profile};
