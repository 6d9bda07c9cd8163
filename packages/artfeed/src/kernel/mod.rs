//! Kernel module - infrastructure traits and dependency wiring.

pub mod deps;
pub mod test_dependencies;
pub mod traits;

pub use deps::{
    AppDeps, OpenAIImageGenerator, SupabaseBlobStore, SupabaseIdentity, SupabaseRecordStore,
};
pub use test_dependencies::TestDependencies;
pub use traits::*;
