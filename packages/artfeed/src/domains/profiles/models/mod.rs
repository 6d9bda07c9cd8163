pub mod profile;

pub use profile::{default_username, NewProfile, Profile};
