//! Builds assets with the strategy registered for their type

use std::path::Path;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::{Asset, AssetError, AssetType, FileLoadStrategy, LoadQueue, LoadStrategy};

/// Maps asset types to load strategies and builds assets wired to them.
#[derive(Default)]
pub struct AssetFactory {
    strategies: FxHashMap<AssetType, Rc<dyn LoadStrategy>>,
}

impl AssetFactory {
    /// Create a factory with no strategies
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory that loads every type from files under `root`
    #[must_use]
    pub fn with_file_strategies(root: impl AsRef<Path>, queue: LoadQueue) -> Self {
        let strategy: Rc<dyn LoadStrategy> =
            Rc::new(FileLoadStrategy::new(root.as_ref(), queue));

        let mut factory = Self::new();
        for asset_type in [
            AssetType::Image,
            AssetType::Audio,
            AssetType::Text,
            AssetType::Binary,
        ] {
            factory.register(asset_type, Rc::clone(&strategy));
        }
        factory
    }

    /// Register the strategy for a type, returning the one it replaced
    pub fn register(
        &mut self,
        asset_type: AssetType,
        strategy: Rc<dyn LoadStrategy>,
    ) -> Option<Rc<dyn LoadStrategy>> {
        self.strategies.insert(asset_type, strategy)
    }

    /// Strategy registered for a type
    #[must_use]
    pub fn strategy(&self, asset_type: AssetType) -> Option<Rc<dyn LoadStrategy>> {
        self.strategies.get(&asset_type).cloned()
    }

    /// Build an unloaded asset with its type's strategy assigned
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::NoStrategy`] if nothing is registered for the type
    pub fn build(&self, asset_type: AssetType, locator: impl Into<String>) -> Result<Asset, AssetError> {
        let strategy = self
            .strategy(asset_type)
            .ok_or(AssetError::NoStrategy(asset_type))?;

        let asset = Asset::new(asset_type, locator);
        asset.set_load_strategy(strategy);
        Ok(asset)
    }
}

impl std::fmt::Debug for AssetFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<_> = self.strategies.keys().collect();
        types.sort_by_key(|t| format!("{t:?}"));
        f.debug_struct("AssetFactory").field("types", &types).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetData, AssetState};

    #[test]
    fn test_build_unknown_type() {
        let factory = AssetFactory::new();
        let result = factory.build(AssetType::Image, "a.png");
        assert_eq!(result.unwrap_err(), AssetError::NoStrategy(AssetType::Image));
    }

    #[test]
    fn test_build_assigns_strategy() {
        let mut factory = AssetFactory::new();
        factory.register(
            AssetType::Text,
            Rc::new(|asset: &Asset| {
                asset.set_data(Some(AssetData::Text("inline".into())));
                asset.set_state(AssetState::Loaded);
            }),
        );

        let asset = factory.build(AssetType::Text, "anything").unwrap();
        assert_eq!(asset.state(), AssetState::NotLoaded);
        asset.load().unwrap();
        assert!(asset.is_ready());
    }

    #[test]
    fn test_file_strategies_cover_all_types() {
        let factory = AssetFactory::with_file_strategies("assets", LoadQueue::new());
        for asset_type in [
            AssetType::Image,
            AssetType::Audio,
            AssetType::Text,
            AssetType::Binary,
        ] {
            assert!(factory.build(asset_type, "x").is_ok());
        }
    }
}
