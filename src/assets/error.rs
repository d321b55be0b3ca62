use std::path::PathBuf;

use super::AssetType;

/// Errors that can occur while building or loading assets
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetError {
    /// `load()` was called on an asset without a strategy
    #[error("asset {id} ({locator}) has no load strategy")]
    MissingStrategy { id: u64, locator: String },
    /// The factory has no strategy for this type
    #[error("no load strategy registered for {0:?} assets")]
    NoStrategy(AssetType),
    /// Reading the source failed
    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },
    /// The bytes could not be decoded as the declared type
    #[error("failed to decode {locator} as {asset_type:?}: {message}")]
    Decode {
        locator: String,
        asset_type: AssetType,
        message: String,
    },
    /// The worker thread could not be started
    #[error("asset load worker failed: {0}")]
    Worker(String),
    /// An operation needed loaded image data
    #[error("asset {0} is not a loaded image")]
    NotAnImage(u64),
    /// A sprite region lies outside its image
    #[error("sprite '{name}' lies outside the {width}x{height} image")]
    RegionOutOfBounds { name: String, width: u32, height: u32 },
    /// A sprite sheet definition did not parse
    #[error("sprite sheet parse error: {0}")]
    Parse(String),
}
