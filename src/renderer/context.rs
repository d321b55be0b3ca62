//! State shared with the drawing backend
//!
//! The engine does not rasterize anything itself. A [`Renderer`]
//! implementation receives a [`RenderFrame`] each frame and draws it.

use glam::Vec2;
use hecs::Entity;

use super::{Camera, RenderFrame};

/// Identifier of a camera registered with a [`RenderState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraId(u32);

/// Cameras, HUD overlay and canvas size handed to the renderer
#[derive(Debug, Clone)]
pub struct RenderState {
    /// Canvas size in pixels
    viewport: Vec2,
    /// Cameras in draw order
    cameras: Vec<(CameraId, Camera)>,
    /// Subtree drawn on top of every camera in canvas pixels
    hud: Option<Entity>,
    next_camera: u32,
}

impl RenderState {
    /// Create an empty state for a canvas size
    #[must_use]
    pub fn new(viewport: Vec2) -> Self {
        Self {
            viewport,
            cameras: Vec::new(),
            hud: None,
            next_camera: 0,
        }
    }

    /// Canvas size in pixels
    #[must_use]
    pub const fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Update the canvas size
    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    /// Register a camera; later cameras draw over earlier ones
    pub fn add_camera(&mut self, camera: Camera) -> CameraId {
        let id = CameraId(self.next_camera);
        self.next_camera += 1;
        self.cameras.push((id, camera));
        id
    }

    /// Unregister a camera
    pub fn remove_camera(&mut self, id: CameraId) -> Option<Camera> {
        let index = self.cameras.iter().position(|(cid, _)| *cid == id)?;
        Some(self.cameras.remove(index).1)
    }

    /// Look up a camera
    #[must_use]
    pub fn camera(&self, id: CameraId) -> Option<&Camera> {
        self.cameras.iter().find(|(cid, _)| *cid == id).map(|(_, c)| c)
    }

    /// Look up a camera mutably
    pub fn camera_mut(&mut self, id: CameraId) -> Option<&mut Camera> {
        self.cameras
            .iter_mut()
            .find(|(cid, _)| *cid == id)
            .map(|(_, c)| c)
    }

    /// Cameras in draw order
    pub fn cameras(&self) -> impl Iterator<Item = (CameraId, &Camera)> {
        self.cameras.iter().map(|(id, camera)| (*id, camera))
    }

    /// HUD subtree, if one is set
    #[must_use]
    pub const fn hud(&self) -> Option<Entity> {
        self.hud
    }

    /// Set the HUD subtree
    pub fn set_hud(&mut self, hud: Entity) {
        self.hud = Some(hud);
    }

    /// Remove the HUD overlay
    pub fn clear_hud(&mut self) -> Option<Entity> {
        self.hud.take()
    }
}

/// A drawing backend
pub trait Renderer {
    /// Draw one frame
    fn render(&mut self, frame: &RenderFrame);

    /// The canvas changed size
    fn resize(&mut self, _width: u32, _height: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_registry() {
        let mut world = hecs::World::new();
        let root = world.spawn(());
        let mut state = RenderState::new(Vec2::splat(500.0));

        let a = state.add_camera(Camera::unscaled(root, Vec2::splat(500.0)).unwrap());
        let b = state.add_camera(Camera::unscaled(root, Vec2::splat(100.0)).unwrap());
        assert_ne!(a, b);
        assert_eq!(state.cameras().map(|(id, _)| id).collect::<Vec<_>>(), vec![a, b]);

        state.camera_mut(b).unwrap().pan(Vec2::ONE).unwrap();
        assert_eq!(state.camera(b).unwrap().view_point(), Vec2::ONE);

        assert!(state.remove_camera(a).is_some());
        assert!(state.remove_camera(a).is_none());
        assert!(state.camera(a).is_none());
    }

    #[test]
    fn test_hud() {
        let mut world = hecs::World::new();
        let hud = world.spawn(());
        let mut state = RenderState::new(Vec2::splat(500.0));

        assert_eq!(state.hud(), None);
        state.set_hud(hud);
        assert_eq!(state.hud(), Some(hud));
        assert_eq!(state.clear_hud(), Some(hud));
        assert_eq!(state.hud(), None);
    }
}
