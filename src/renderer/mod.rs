//! Rendering collaborator surface
//!
//! Cameras map scene space onto render targets. Each frame the engine turns
//! the scene and the registered cameras into a [`RenderFrame`] of textured
//! rectangles for a [`Renderer`] backend to draw.

mod camera;
mod context;
mod frame;

pub use camera::{Camera, CameraError};
pub use context::{CameraId, RenderState, Renderer};
pub use frame::{CameraView, DrawCommand, RenderFrame};
