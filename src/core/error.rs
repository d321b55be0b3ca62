//! Engine-level error type

use std::any::Any;

use crate::assets::AssetError;
use crate::audio::AudioError;
use crate::core::ConfigError;
use crate::logic::LogicError;
use crate::renderer::CameraError;
use crate::scene::SceneError;

/// Any error the engine API can return
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Audio(#[from] AudioError),
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error(transparent)]
    Camera(#[from] CameraError),
    #[error(transparent)]
    Logic(#[from] LogicError),
    /// Game code failed
    #[error(transparent)]
    Game(#[from] anyhow::Error),
    /// The window event loop failed
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
