//! Texture references held by scene nodes

use serde::{Deserialize, Serialize};

use super::Asset;

/// A rectangular region of an image, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Mirror horizontally when drawn
    #[serde(default, rename = "flipX", alias = "flip_x")]
    pub flip_x: bool,
}

impl SpriteRegion {
    /// Create an unflipped region
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            flip_x: false,
        }
    }

    /// Mirror horizontally
    #[must_use]
    pub const fn flipped(mut self) -> Self {
        self.flip_x = true;
        self
    }

    /// Whether the region fits inside an image of the given size
    #[must_use]
    pub fn fits(&self, width: u32, height: u32) -> bool {
        self.x.checked_add(self.width).is_some_and(|right| right <= width)
            && self.y.checked_add(self.height).is_some_and(|bottom| bottom <= height)
    }
}

/// What a node draws: an asset, optionally restricted to one region of it
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    /// Image asset supplying the pixels
    pub asset: Asset,
    /// Sub-rectangle to draw; the whole image when `None`
    pub region: Option<SpriteRegion>,
}

impl Texture {
    /// Draw the whole asset
    #[must_use]
    pub fn whole(asset: Asset) -> Self {
        Self {
            asset,
            region: None,
        }
    }

    /// Draw one region of the asset
    #[must_use]
    pub fn region(asset: Asset, region: SpriteRegion) -> Self {
        Self {
            asset,
            region: Some(region),
        }
    }

    /// True once the backing asset is loaded
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.asset.is_ready()
    }
}

impl From<Asset> for Texture {
    fn from(asset: Asset) -> Self {
        Self::whole(asset)
    }
}
