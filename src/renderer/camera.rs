//! Viewport over a scene subtree
//!
//! A camera shows the `fov` rectangle of scene space starting at `view_point`
//! on a render target of `render_dimension` pixels. The ratio of the two is
//! the scale used for every coordinate conversion, and is recomputed whenever
//! either side changes.
//!
//! The camera never clamps its view to the content; keeping it inside a map
//! is left to game logic.

use glam::Vec2;
use hecs::Entity;

use crate::core::Rect;

/// Errors from camera construction and updates
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CameraError {
    /// A size must be positive on both axes
    #[error("{what} must be positive, got {value}")]
    Degenerate { what: &'static str, value: Vec2 },
    /// A coordinate contained NaN or infinity
    #[error("{what} must be finite, got {value}")]
    NonFinite { what: &'static str, value: Vec2 },
}

/// 2D camera mapping scene space onto a render target
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Root of the subtree this camera shows
    target: Entity,
    /// Scene coordinate at the top-left of the view
    view_point: Vec2,
    /// Size of the visible scene rectangle
    fov: Vec2,
    /// Top-left of the render target on the canvas
    render_position: Vec2,
    /// Size of the render target in pixels
    render_dimension: Vec2,
    /// Scene units per render pixel
    scale: Vec2,
}

impl Camera {
    /// Create a camera.
    ///
    /// `view_point` and `render_position` default to the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if a size is not positive, a value is not finite, or
    /// the two sizes give a scale that cannot be inverted
    pub fn new(
        target: Entity,
        view_point: Option<Vec2>,
        fov: Vec2,
        render_position: Option<Vec2>,
        render_dimension: Vec2,
    ) -> Result<Self, CameraError> {
        let view_point = finite("view point", view_point.unwrap_or(Vec2::ZERO))?;
        let render_position = finite("render position", render_position.unwrap_or(Vec2::ZERO))?;
        let fov = positive("field of view", fov)?;
        let render_dimension = positive("render dimension", render_dimension)?;
        let scale = scale_for(fov, render_dimension)?;

        Ok(Self {
            target,
            view_point,
            fov,
            render_position,
            render_dimension,
            scale,
        })
    }

    /// Camera whose field of view matches its render target one to one
    ///
    /// # Errors
    ///
    /// Returns an error if the dimension is not positive
    pub fn unscaled(target: Entity, render_dimension: Vec2) -> Result<Self, CameraError> {
        Self::new(target, None, render_dimension, None, render_dimension)
    }

    /// Root of the rendered subtree
    #[must_use]
    pub const fn target(&self) -> Entity {
        self.target
    }

    /// Point the camera at another subtree
    pub fn set_target(&mut self, target: Entity) {
        self.target = target;
    }

    /// Scene coordinate at the top-left of the view
    #[must_use]
    pub const fn view_point(&self) -> Vec2 {
        self.view_point
    }

    /// Move the view
    ///
    /// # Errors
    ///
    /// Returns an error if the point is not finite
    pub fn set_view_point(&mut self, view_point: Vec2) -> Result<(), CameraError> {
        self.view_point = finite("view point", view_point)?;
        Ok(())
    }

    /// Size of the visible scene rectangle
    #[must_use]
    pub const fn fov(&self) -> Vec2 {
        self.fov
    }

    /// Resize the visible rectangle, keeping the view point fixed
    ///
    /// # Errors
    ///
    /// Returns an error if the size is not positive or the resulting scale
    /// is degenerate
    pub fn set_fov(&mut self, fov: Vec2) -> Result<(), CameraError> {
        let fov = positive("field of view", fov)?;
        self.scale = scale_for(fov, self.render_dimension)?;
        self.fov = fov;
        Ok(())
    }

    /// Top-left of the render target on the canvas
    #[must_use]
    pub const fn render_position(&self) -> Vec2 {
        self.render_position
    }

    /// Move the render target on the canvas
    ///
    /// # Errors
    ///
    /// Returns an error if the point is not finite
    pub fn set_render_position(&mut self, position: Vec2) -> Result<(), CameraError> {
        self.render_position = finite("render position", position)?;
        Ok(())
    }

    /// Size of the render target in pixels
    #[must_use]
    pub const fn render_dimension(&self) -> Vec2 {
        self.render_dimension
    }

    /// Resize the render target
    ///
    /// # Errors
    ///
    /// Returns an error if the size is not positive or the resulting scale
    /// is degenerate
    pub fn set_render_dimension(&mut self, dimension: Vec2) -> Result<(), CameraError> {
        let dimension = positive("render dimension", dimension)?;
        self.scale = scale_for(self.fov, dimension)?;
        self.render_dimension = dimension;
        Ok(())
    }

    /// Scene units per render pixel on each axis
    #[must_use]
    pub const fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Scene rectangle currently visible
    #[must_use]
    pub fn visible_rect(&self) -> Rect {
        Rect::from_position_size(self.view_point, self.fov)
    }

    /// Canvas rectangle covered by the render target
    #[must_use]
    pub fn render_rect(&self) -> Rect {
        Rect::from_position_size(self.render_position, self.render_dimension)
    }

    /// Map a point on the render target to scene coordinates
    #[must_use]
    pub fn render_to_scene(&self, point: Vec2) -> Vec2 {
        self.view_point + point * self.scale
    }

    /// Map a scene point to render-target pixels
    #[must_use]
    pub fn scene_to_render(&self, point: Vec2) -> Vec2 {
        (point - self.view_point) / self.scale
    }

    /// Map a canvas point, such as a pointer position, to scene coordinates
    #[must_use]
    pub fn canvas_to_scene(&self, point: Vec2) -> Vec2 {
        self.render_to_scene(point - self.render_position)
    }

    /// Map a scene point to canvas pixels
    #[must_use]
    pub fn scene_to_canvas(&self, point: Vec2) -> Vec2 {
        self.scene_to_render(point) + self.render_position
    }

    /// Size of a scene-space extent in render pixels
    #[must_use]
    pub fn scale_size(&self, size: Vec2) -> Vec2 {
        size / self.scale
    }

    /// Move the view by a scene-space delta
    ///
    /// # Errors
    ///
    /// Returns an error if the resulting point is not finite
    pub fn pan(&mut self, delta: Vec2) -> Result<(), CameraError> {
        self.set_view_point(self.view_point + delta)
    }

    /// Shrink the view by `amount` on both axes around its centre.
    ///
    /// Positive amounts zoom in, negative amounts zoom out. A zoom that would
    /// leave a non-positive field of view is rejected and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the new field of view would be degenerate
    pub fn zoom_by(&mut self, amount: f32) -> Result<(), CameraError> {
        let fov = positive("field of view", self.fov - Vec2::splat(amount))?;
        let view_point = finite("view point", self.view_point + Vec2::splat(amount * 0.5))?;
        self.scale = scale_for(fov, self.render_dimension)?;
        self.fov = fov;
        self.view_point = view_point;
        Ok(())
    }

    /// Place the view so its centre is the centre of `rect`
    ///
    /// # Errors
    ///
    /// Returns an error if the rectangle is not finite
    pub fn center_on(&mut self, rect: Rect) -> Result<(), CameraError> {
        self.set_view_point(rect.center() - self.fov * 0.5)
    }
}

fn finite(what: &'static str, value: Vec2) -> Result<Vec2, CameraError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CameraError::NonFinite { what, value })
    }
}

fn positive(what: &'static str, value: Vec2) -> Result<Vec2, CameraError> {
    let value = finite(what, value)?;
    if value.min_element() > 0.0 {
        Ok(value)
    } else {
        Err(CameraError::Degenerate { what, value })
    }
}

/// Scene units per pixel; must be invertible for scene-to-render mapping
fn scale_for(fov: Vec2, render_dimension: Vec2) -> Result<Vec2, CameraError> {
    let scale = positive("scale", fov / render_dimension)?;
    finite("inverse scale", scale.recip())?;
    Ok(scale)
}
