//! Named sprite regions over one image asset

use rustc_hash::FxHashMap;

use super::{Asset, AssetError, SpriteRegion, Texture};

/// An image asset cut into named regions.
///
/// Build it once the image is loaded, typically from the asset's state-change
/// listener.
#[derive(Debug, Clone)]
pub struct Spritesheet {
    asset: Asset,
    sprites: FxHashMap<String, SpriteRegion>,
}

impl Spritesheet {
    /// Create a sheet, checking every region against the image size.
    ///
    /// # Errors
    ///
    /// Returns an error if the asset holds no image data or a region does not
    /// fit inside the image
    pub fn new(
        asset: Asset,
        sprites: impl IntoIterator<Item = (String, SpriteRegion)>,
    ) -> Result<Self, AssetError> {
        let (width, height) = asset
            .data()
            .and_then(|data| data.dimensions())
            .ok_or(AssetError::NotAnImage(asset.id()))?;

        let sprites: FxHashMap<String, SpriteRegion> = sprites.into_iter().collect();
        if let Some((name, _)) = sprites.iter().find(|(_, region)| !region.fits(width, height)) {
            return Err(AssetError::RegionOutOfBounds {
                name: name.clone(),
                width,
                height,
            });
        }

        Ok(Self { asset, sprites })
    }

    /// Create a sheet from a RON map of name to region
    ///
    /// # Errors
    ///
    /// Returns an error if the text does not parse or a region is invalid
    pub fn from_ron(asset: Asset, text: &str) -> Result<Self, AssetError> {
        let sprites: FxHashMap<String, SpriteRegion> =
            ron::from_str(text).map_err(|e| AssetError::Parse(e.to_string()))?;
        Self::new(asset, sprites)
    }

    /// The backing image asset
    #[must_use]
    pub fn asset(&self) -> &Asset {
        &self.asset
    }

    /// Texture for a named sprite
    #[must_use]
    pub fn sprite(&self, name: &str) -> Option<Texture> {
        self.sprites
            .get(name)
            .map(|region| Texture::region(self.asset.clone(), *region))
    }

    /// Region for a named sprite
    #[must_use]
    pub fn region(&self, name: &str) -> Option<SpriteRegion> {
        self.sprites.get(name).copied()
    }

    /// Number of sprites
    #[must_use]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// Check if the sheet has no sprites
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}
