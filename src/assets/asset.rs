//! Asset handle and load state machine
//!
//! An [`Asset`] is a shared handle: cloning it shares the same underlying
//! record, and the record is dropped with the last strong handle. The record
//! tracks where the data comes from, which lifecycle state it is in, the
//! decoded payload, and free-form attributes.
//!
//! State and data are changed independently. A strategy may push data before
//! marking the asset `Loaded`, so callers waiting for readiness should watch
//! state changes, not data changes.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use serde_json::Value;

use super::{AssetData, AssetError, AssetState, AssetType, LoadStrategy};
use crate::core::{EventEmitter, ListenerId};

/// Global counter for generating unique asset IDs
static NEXT_ASSET_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ASSET_ID.fetch_add(1, Ordering::Relaxed)
}

struct AssetRecord {
    id: u64,
    asset_type: AssetType,
    locator: RefCell<String>,
    generation: Cell<u64>,
    state: Cell<AssetState>,
    data: RefCell<Option<Rc<AssetData>>>,
    strategy: RefCell<Option<Rc<dyn LoadStrategy>>>,
    attributes: RefCell<FxHashMap<String, Value>>,
    state_changes: EventEmitter<AssetState>,
    data_changes: EventEmitter<Option<Rc<AssetData>>>,
    errors: EventEmitter<AssetError>,
}

/// A shared handle to an external resource and its load state.
#[derive(Clone)]
pub struct Asset {
    inner: Rc<AssetRecord>,
}

impl Asset {
    /// Create an asset in the `NotLoaded` state with no strategy.
    #[must_use]
    pub fn new(asset_type: AssetType, locator: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(AssetRecord {
                id: next_id(),
                asset_type,
                locator: RefCell::new(locator.into()),
                generation: Cell::new(0),
                state: Cell::new(AssetState::NotLoaded),
                data: RefCell::new(None),
                strategy: RefCell::new(None),
                attributes: RefCell::new(FxHashMap::default()),
                state_changes: EventEmitter::new(),
                data_changes: EventEmitter::new(),
                errors: EventEmitter::new(),
            }),
        }
    }

    /// Unique ID of this asset
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Declared type
    #[must_use]
    pub fn asset_type(&self) -> AssetType {
        self.inner.asset_type
    }

    /// Source locator (path or URL)
    #[must_use]
    pub fn source(&self) -> String {
        self.inner.locator.borrow().clone()
    }

    /// Point the asset at a new source.
    ///
    /// Does nothing if `locator` equals the current source. Otherwise the data
    /// is cleared and the state returns to `NotLoaded`, firing a data change
    /// followed by a state change.
    pub fn set_source(&self, locator: impl Into<String>) {
        let locator = locator.into();
        if *self.inner.locator.borrow() == locator {
            return;
        }

        log::debug!("Asset {} source -> {locator}", self.inner.id);
        *self.inner.locator.borrow_mut() = locator;
        self.inner.generation.set(self.inner.generation.get() + 1);
        self.set_data(None);
        self.set_state(AssetState::NotLoaded);
    }

    /// Counter bumped on every source change
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.get()
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> AssetState {
        self.inner.state.get()
    }

    /// Set the lifecycle state and notify state listeners.
    ///
    /// Intended for load strategies.
    pub fn set_state(&self, state: AssetState) {
        let previous = self.inner.state.replace(state);
        if previous != state {
            log::trace!("Asset {} {previous:?} -> {state:?}", self.inner.id);
        }
        self.inner.state_changes.emit(&state);
    }

    /// Current payload, `None` until something sets it
    #[must_use]
    pub fn data(&self) -> Option<Rc<AssetData>> {
        self.inner.data.borrow().clone()
    }

    /// Replace the payload and notify data listeners.
    ///
    /// Never changes the state.
    pub fn set_data(&self, data: Option<AssetData>) {
        let data = data.map(Rc::new);
        self.inner.data.replace(data.clone());
        self.inner.data_changes.emit(&data);
    }

    /// True iff the state is `Loaded`
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == AssetState::Loaded
    }

    /// Assign the strategy used by [`Asset::load`]
    pub fn set_load_strategy(&self, strategy: Rc<dyn LoadStrategy>) {
        self.inner.strategy.replace(Some(strategy));
    }

    /// Currently assigned strategy
    #[must_use]
    pub fn load_strategy(&self) -> Option<Rc<dyn LoadStrategy>> {
        self.inner.strategy.borrow().clone()
    }

    /// Start loading through the assigned strategy.
    ///
    /// Completion is reported through state, data and error listeners.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::MissingStrategy`] if no strategy is assigned
    pub fn load(&self) -> Result<(), AssetError> {
        let strategy = self.load_strategy().ok_or_else(|| AssetError::MissingStrategy {
            id: self.inner.id,
            locator: self.source(),
        })?;
        strategy.load(self);
        Ok(())
    }

    /// Report a failed load.
    ///
    /// Error listeners run first, then the state resets to `NotLoaded` so a
    /// later `load()` starts from a clean slate.
    pub fn fail_load(&self, error: AssetError) {
        log::warn!("Asset {} failed to load: {error}", self.inner.id);
        self.inner.errors.emit(&error);
        if self.state() != AssetState::NotLoaded {
            self.set_state(AssetState::NotLoaded);
        }
    }

    /// Set an attribute
    pub fn set_attribute(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner
            .attributes
            .borrow_mut()
            .insert(key.into(), value.into());
    }

    /// Get an attribute
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<Value> {
        self.inner.attributes.borrow().get(key).cloned()
    }

    /// Check whether an attribute is present
    #[must_use]
    pub fn is_attribute(&self, key: &str) -> bool {
        self.inner.attributes.borrow().contains_key(key)
    }

    /// Remove an attribute, returning its value if it was present
    pub fn remove_attribute(&self, key: &str) -> Option<Value> {
        self.inner.attributes.borrow_mut().remove(key)
    }

    /// Listen for state changes
    pub fn on_state_change(&self, listener: impl Fn(&AssetState) + 'static) -> ListenerId {
        self.inner.state_changes.subscribe(listener)
    }

    /// Listen for data changes; the payload is `None` when data was cleared
    pub fn on_data_change(
        &self,
        listener: impl Fn(&Option<Rc<AssetData>>) + 'static,
    ) -> ListenerId {
        self.inner.data_changes.subscribe(listener)
    }

    /// Listen for load errors
    pub fn on_error(&self, listener: impl Fn(&AssetError) + 'static) -> ListenerId {
        self.inner.errors.subscribe(listener)
    }

    /// State change emitter, for unsubscribing
    #[must_use]
    pub fn state_changes(&self) -> &EventEmitter<AssetState> {
        &self.inner.state_changes
    }

    /// Data change emitter, for unsubscribing
    #[must_use]
    pub fn data_changes(&self) -> &EventEmitter<Option<Rc<AssetData>>> {
        &self.inner.data_changes
    }

    /// Error emitter, for unsubscribing
    #[must_use]
    pub fn errors(&self) -> &EventEmitter<AssetError> {
        &self.inner.errors
    }

    /// Create a weak handle that doesn't keep the asset alive
    #[must_use]
    pub fn downgrade(&self) -> WeakAsset {
        WeakAsset {
            id: self.inner.id,
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Number of strong handles
    #[must_use]
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Asset {}

impl Hash for Asset {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("id", &self.inner.id)
            .field("type", &self.inner.asset_type)
            .field("source", &*self.inner.locator.borrow())
            .field("state", &self.inner.state.get())
            .field("has_data", &self.inner.data.borrow().is_some())
            .finish()
    }
}

/// A weak handle to an asset that doesn't prevent cleanup.
#[derive(Clone)]
pub struct WeakAsset {
    id: u64,
    inner: Weak<AssetRecord>,
}

impl WeakAsset {
    /// Get the unique ID of this asset
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Attempt to upgrade to a strong handle.
    ///
    /// Returns `None` if the asset has been dropped.
    #[must_use]
    pub fn upgrade(&self) -> Option<Asset> {
        self.inner.upgrade().map(|inner| Asset { inner })
    }

    /// Check if the asset is still alive
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakAsset")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}
