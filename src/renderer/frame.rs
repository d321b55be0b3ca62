//! Per-frame draw lists

use hecs::Entity;

use super::{CameraId, RenderState};
use crate::assets::Texture;
use crate::core::Rect;
use crate::scene::Scene;

/// One textured rectangle to draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    pub entity: Entity,
    /// Destination in canvas pixels
    pub dest: Rect,
    pub texture: Texture,
}

/// Draw commands seen through one camera
#[derive(Debug, Clone)]
pub struct CameraView {
    pub camera: CameraId,
    /// Canvas area the camera draws into; clip to it
    pub clip: Rect,
    pub commands: Vec<DrawCommand>,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Default)]
pub struct RenderFrame {
    /// Canvas size in pixels
    pub viewport: glam::Vec2,
    /// Camera views in draw order
    pub views: Vec<CameraView>,
    /// HUD commands, drawn last and never scaled
    pub hud: Vec<DrawCommand>,
}

impl RenderFrame {
    /// Collect draw commands for every camera and the HUD.
    ///
    /// Only nodes with a loaded texture are drawn. Camera nodes outside the
    /// visible rectangle are culled.
    #[must_use]
    pub fn build(scene: &Scene, state: &RenderState) -> Self {
        let views = state
            .cameras()
            .map(|(id, camera)| {
                let visible = camera.visible_rect();
                let commands = scene
                    .walk(camera.target())
                    .filter_map(|visit| {
                        let bounds = Rect::from_position_size(visit.world_position, visit.size);
                        if !bounds.intersects(&visible) {
                            return None;
                        }
                        let texture = ready_texture(scene, visit.entity)?;
                        Some(DrawCommand {
                            entity: visit.entity,
                            dest: Rect::from_position_size(
                                camera.scene_to_canvas(visit.world_position),
                                camera.scale_size(visit.size),
                            ),
                            texture,
                        })
                    })
                    .collect();

                CameraView {
                    camera: id,
                    clip: camera.render_rect(),
                    commands,
                }
            })
            .collect();

        let hud = state
            .hud()
            .map(|root| {
                scene
                    .walk(root)
                    .filter_map(|visit| {
                        let texture = ready_texture(scene, visit.entity)?;
                        Some(DrawCommand {
                            entity: visit.entity,
                            dest: Rect::from_position_size(visit.world_position, visit.size),
                            texture,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            viewport: state.viewport(),
            views,
            hud,
        }
    }

    /// Total number of draw commands
    #[must_use]
    pub fn command_count(&self) -> usize {
        self.views.iter().map(|v| v.commands.len()).sum::<usize>() + self.hud.len()
    }
}

fn ready_texture(scene: &Scene, entity: Entity) -> Option<Texture> {
    scene.texture(entity).filter(|t| t.is_ready()).cloned()
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::assets::{Asset, AssetData, AssetState, AssetType};
    use crate::renderer::Camera;
    use crate::scene::Node;

    fn loaded_asset() -> Asset {
        let asset = Asset::new(AssetType::Image, "tile.png");
        asset.set_data(Some(AssetData::Image(image::RgbaImage::new(4, 4))));
        asset.set_state(AssetState::Loaded);
        asset
    }

    #[test]
    fn test_culls_and_scales() {
        let mut scene = Scene::new();
        let root = scene.spawn(Node::default());
        let visible = scene
            .spawn_child(root, Node::from_xywh(50.0, 50.0, 10.0, 10.0))
            .unwrap();
        let hidden = scene
            .spawn_child(root, Node::from_xywh(500.0, 500.0, 10.0, 10.0))
            .unwrap();
        // In view but untextured
        scene
            .spawn_child(root, Node::from_xywh(0.0, 0.0, 10.0, 10.0))
            .unwrap();

        let asset = loaded_asset();
        scene.set_texture(visible, asset.clone()).unwrap();
        scene.set_texture(hidden, asset).unwrap();

        let mut state = RenderState::new(Vec2::splat(200.0));
        let camera = Camera::new(root, None, Vec2::splat(100.0), None, Vec2::splat(200.0)).unwrap();
        state.add_camera(camera);

        let frame = RenderFrame::build(&scene, &state);
        assert_eq!(frame.views.len(), 1);
        let commands = &frame.views[0].commands;
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].entity, visible);
        assert_eq!(commands[0].dest, Rect::new(100.0, 100.0, 20.0, 20.0));
    }

    #[test]
    fn test_unloaded_textures_skipped() {
        let mut scene = Scene::new();
        let root = scene.spawn(Node::from_xywh(0.0, 0.0, 10.0, 10.0));
        scene
            .set_texture(root, Asset::new(AssetType::Image, "later.png"))
            .unwrap();

        let mut state = RenderState::new(Vec2::splat(100.0));
        state.add_camera(Camera::unscaled(root, Vec2::splat(100.0)).unwrap());

        assert_eq!(RenderFrame::build(&scene, &state).command_count(), 0);
    }

    #[test]
    fn test_hud_is_unscaled() {
        let mut scene = Scene::new();
        let world = scene.spawn(Node::default());
        let hud = scene.spawn(Node::from_xywh(10.0, 10.0, 30.0, 8.0));
        scene.set_texture(hud, loaded_asset()).unwrap();

        let mut state = RenderState::new(Vec2::splat(100.0));
        state.add_camera(Camera::new(world, None, Vec2::splat(10.0), None, Vec2::splat(100.0)).unwrap());
        state.set_hud(hud);

        let frame = RenderFrame::build(&scene, &state);
        assert_eq!(frame.hud.len(), 1);
        assert_eq!(frame.hud[0].dest, Rect::new(10.0, 10.0, 30.0, 8.0));
    }
}
