//! A 2D tile game engine built in Rust
//!
//! This engine provides:
//! - A scene tree of positioned nodes with tile grid maps
//! - Cameras mapping scene space onto render targets with pan and zoom
//! - Named logic callbacks running at independent intervals
//! - Assets with a load state machine and threaded file loading
//! - Named audio tracks handed to a playback backend
//! - Keyboard, pointer and gamepad devices behind one polling contract

pub mod assets;
pub mod audio;
pub mod core;
pub mod input;
pub mod logic;
pub mod renderer;
pub mod scene;

// Re-exports for convenience
pub use glam;
pub use hecs;
pub use winit;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::assets::{Asset, AssetState, AssetType, SpriteRegion, Spritesheet, Texture};
    pub use crate::audio::{AudioCommand, AudioManager, AudioPlayer};
    pub use crate::core::{
        App, Engine, EngineConfig, EngineContext, EngineError, EventSource, Game, Rect,
    };
    pub use crate::input::{DeviceEvent, InputElement, InputEvent, WindowInput};
    pub use crate::logic::{Interval, TickReport};
    pub use crate::renderer::{Camera, CameraId, RenderFrame, Renderer};
    pub use crate::scene::{GridCoord, GridSize, Node, Scene, SceneEvent};
    pub use glam::Vec2;
    pub use hecs::Entity;
    pub use winit::keyboard::KeyCode;
}
