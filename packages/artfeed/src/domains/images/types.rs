//! Image generation options and results.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::common::{AppError, AppResult};

/// Supported output resolutions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSize {
    #[default]
    #[serde(rename = "1024x1024")]
    Square,
    #[serde(rename = "1792x1024")]
    Landscape,
    #[serde(rename = "1024x1792")]
    Portrait,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Square => "1024x1024",
            Self::Landscape => "1792x1024",
            Self::Portrait => "1024x1792",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    #[default]
    Standard,
    Hd,
}

impl ImageQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Hd => "hd",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageStyle {
    #[default]
    Vivid,
    Natural,
}

impl ImageStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Vivid => "vivid",
            Self::Natural => "natural",
        }
    }
}

macro_rules! wire_str {
    ($ty:ident, $what:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(AppError::InvalidInput(format!("Unsupported image {}: {}", $what, s)))
            }
        }
    };
}

wire_str!(ImageSize, "size", [Square, Landscape, Portrait]);
wire_str!(ImageQuality, "quality", [Standard, Hd]);
wire_str!(ImageStyle, "style", [Vivid, Natural]);

/// Options for one generation call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub size: ImageSize,
    pub quality: ImageQuality,
    pub style: ImageStyle,
}

/// A freshly generated image, not yet stored anywhere.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedImage {
    pub prompt: String,
    pub options: GenerationOptions,
    /// Base64 PNG as returned upstream
    pub b64_json: String,
}

impl GeneratedImage {
    /// Inline preview URL.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.b64_json)
    }

    /// Raw PNG bytes.
    pub fn decode(&self) -> AppResult<Bytes> {
        decode_base64_image(&self.b64_json)
    }
}

/// Decode a base64 image, with or without a `data:` URL prefix.
pub fn decode_base64_image(data: &str) -> AppResult<Bytes> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, payload)| payload)
            .ok_or_else(|| AppError::Decode("malformed data URL".to_string()))?,
        None => data,
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| AppError::Decode(e.to_string()))?;
    if bytes.is_empty() {
        return Err(AppError::Decode("empty image payload".to_string()));
    }
    Ok(Bytes::from(bytes))
}
