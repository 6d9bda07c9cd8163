pub mod download_image;
pub mod generate_image;

pub use download_image::{download_image, generate_filename};
pub use generate_image::generate_image;
