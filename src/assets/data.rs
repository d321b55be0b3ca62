//! Asset kinds, lifecycle states and decoded payloads

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Declared type of an asset, used to pick a load strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    /// Raster image, decoded to RGBA8
    Image,
    /// Sound or music
    Audio,
    /// UTF-8 text
    Text,
    /// Raw bytes
    Binary,
}

/// Load lifecycle of an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AssetState {
    /// No data for the current source
    #[default]
    NotLoaded,
    /// A load strategy is working on it
    Loading,
    /// Data is available
    Loaded,
}

/// Encoded audio together with the stream parameters found while probing it
#[derive(Clone)]
pub struct AudioClip {
    /// Encoded file contents, handed to the audio backend as-is
    pub bytes: Arc<[u8]>,
    /// Samples per second
    pub sample_rate: u32,
    /// Channel count
    pub channels: u16,
}

impl fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioClip")
            .field("bytes", &self.bytes.len())
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish()
    }
}

/// Decoded asset payload
#[derive(Debug, Clone)]
pub enum AssetData {
    /// RGBA8 pixels
    Image(image::RgbaImage),
    /// Probed audio
    Audio(AudioClip),
    /// Text contents
    Text(String),
    /// Raw bytes
    Binary(Vec<u8>),
}

impl AssetData {
    /// Pixel dimensions for image data
    #[must_use]
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match self {
            Self::Image(image) => Some(image.dimensions()),
            _ => None,
        }
    }

    /// Image pixels, if this is image data
    #[must_use]
    pub fn as_image(&self) -> Option<&image::RgbaImage> {
        match self {
            Self::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Audio clip, if this is audio data
    #[must_use]
    pub fn as_audio(&self) -> Option<&AudioClip> {
        match self {
            Self::Audio(clip) => Some(clip),
            _ => None,
        }
    }

    /// Text, if this is text data
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The type this payload satisfies
    #[must_use]
    pub const fn asset_type(&self) -> AssetType {
        match self {
            Self::Image(_) => AssetType::Image,
            Self::Audio(_) => AssetType::Audio,
            Self::Text(_) => AssetType::Text,
            Self::Binary(_) => AssetType::Binary,
        }
    }
}
