//! Asset loading
//!
//! Provides the asset lifecycle with:
//! - Shared asset handles with a `NotLoaded -> Loading -> Loaded` state machine
//! - Pluggable load strategies, with a threaded file loader
//! - Sprite sheets and texture references for scene nodes

mod asset;
mod data;
mod error;
mod factory;
mod spritesheet;
mod strategy;
mod texture;

pub use asset::{Asset, WeakAsset};
pub use data::{AssetData, AssetState, AssetType, AudioClip};
pub use error::AssetError;
pub use factory::AssetFactory;
pub use spritesheet::Spritesheet;
pub use strategy::{FileLoadStrategy, LoadQueue, LoadStrategy, decode};
pub use texture::{SpriteRegion, Texture};
