pub mod diagnostics;

pub use diagnostics::{
    check_storage, create_images_bucket, test_bucket_access, BucketAccessTest, StorageReport,
};
