pub mod activities;

pub use activities::{BucketAccessTest, StorageReport};
