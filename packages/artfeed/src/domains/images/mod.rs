pub mod activities;
pub mod types;

pub use types::{GeneratedImage, GenerationOptions, ImageQuality, ImageSize, ImageStyle};
