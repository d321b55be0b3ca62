//! Demo: walk a character around a small town map

use std::cell::Cell;
use std::rc::Rc;

use tilegame::input::Axis2;
use tilegame::prelude::*;

const MAP_TILES: u32 = 16;
const TILE: f32 = 50.0;

#[cfg(feature = "gilrs")]
type Source = (WindowInput, tilegame::input::GilrsSource);
#[cfg(not(feature = "gilrs"))]
type Source = WindowInput;

/// Renderer that logs what it would draw
#[derive(Default)]
struct LogRenderer {
    frames: u64,
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &RenderFrame) {
        self.frames += 1;
        if self.frames % 300 == 1 {
            log::debug!(
                "Frame {}: {} draw commands over {} views",
                self.frames,
                frame.command_count(),
                frame.views.len()
            );
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        log::info!("Canvas resized to {width}x{height}");
    }
}

/// Shared between input listeners and logic callbacks
#[derive(Default)]
struct Controls {
    direction: Cell<Option<(i32, i32)>>,
    zoom: Cell<f32>,
    follow: Cell<Option<Rect>>,
    toggle_mute: Cell<bool>,
}

#[derive(Default)]
struct Pallet {
    controls: Rc<Controls>,
}

impl Pallet {
    fn build_map(scene: &mut Scene) -> anyhow::Result<(Entity, Entity)> {
        let size = GridSize::new(MAP_TILES, MAP_TILES);
        let map = scene.spawn_named("map", Node::default());
        let mut layers = Vec::new();
        for _ in 0..3 {
            let layer = scene.spawn_grid_map(Vec2::ZERO, size, Vec2::splat(TILE))?;
            scene.add_child(map, layer)?;
            layers.push(layer);
        }

        // House walls block movement
        let walls = layers[1];
        for row in 11..=13 {
            for col in 10..=12 {
                scene.set_collisionable(walls, GridCoord::new(col, row), true)?;
            }
        }
        Ok((map, walls))
    }

    fn texture_map(scene: &mut Scene, sheet: &Spritesheet, map: Entity) -> anyhow::Result<()> {
        let Some(grass) = sheet.sprite("grass") else {
            anyhow::bail!("map sheet has no grass sprite");
        };
        let ground = scene
            .child_at(map, 0)
            .ok_or_else(|| anyhow::anyhow!("map has no ground layer"))?;
        let tiles: Vec<Entity> = scene.leaves(ground).collect();
        for tile in tiles {
            scene.set_texture(tile, grass.clone())?;
        }
        log::info!("Map textured");
        Ok(())
    }
}

impl Game<Source> for Pallet {
    fn init(&mut self, engine: &mut Engine<Source>) -> anyhow::Result<()> {
        let ctx = engine.context_mut();
        let (map, walls) = Self::build_map(&mut ctx.scene)?;

        let start = ctx.scene.tile(walls, GridCoord::new(5, 5))?;
        let start = ctx
            .scene
            .position(start)
            .ok_or_else(|| anyhow::anyhow!("start tile vanished"))?;
        let player = ctx.scene.spawn_named("player", Node::new(start, Vec2::splat(TILE)));
        ctx.scene.add_child(walls, player)?;

        let mut camera = Camera::new(
            map,
            None,
            Vec2::splat(250.0),
            None,
            ctx.render.viewport(),
        )?;
        if let Some(rect) = ctx.scene.world_rect(player) {
            camera.center_on(rect)?;
        }
        let camera = ctx.render.add_camera(camera);

        // Keep the camera on the player
        let controls = Rc::clone(&self.controls);
        ctx.scene.events().subscribe(move |event| {
            if let SceneEvent::LocationUpdate {
                entity,
                world_position,
                ..
            } = *event
                && entity == player
            {
                controls
                    .follow
                    .set(Some(Rect::from_position_size(world_position, Vec2::splat(TILE))));
            }
        });

        let controls = Rc::clone(&self.controls);
        ctx.input.on_input(move |event| match event.event {
            InputEvent::KeyDown(KeyCode::KeyM) => controls.toggle_mute.set(true),
            InputEvent::KeyDown(key) => {
                if let Some(step) = arrow(key) {
                    controls.direction.set(Some(step));
                }
            }
            InputEvent::KeyUp(key) => {
                if arrow(key).is_some() && arrow(key) == controls.direction.get() {
                    controls.direction.set(None);
                }
            }
            InputEvent::ScrollWheelMove {
                axis: Axis2::Y,
                delta,
            } => controls.zoom.set(controls.zoom.get() + delta.signum() * 10.0),
            InputEvent::AxisValueChange { axis, value } if axis < 2 => {
                let step = if value.abs() < 0.5 {
                    None
                } else if axis == 0 {
                    Some((value.signum() as i32, 0))
                } else {
                    Some((0, value.signum() as i32))
                };
                controls.direction.set(step);
            }
            _ => {}
        });

        // Background music starts once the file has loaded
        let music = ctx.assets.build(AssetType::Audio, "music.mp3")?;
        music.on_error(|err| log::warn!("Background music unavailable: {err}"));
        music.load()?;
        ctx.audio.add("bg", music)?;
        ctx.audio.play_looped("bg")?;

        let sheet_asset = ctx.assets.build(AssetType::Image, "map.png")?;
        sheet_asset.on_error(|err| log::warn!("Map sheet unavailable: {err}"));
        sheet_asset.load()?;

        let mut textured = false;
        engine.add_logic("textureLogic", Interval::Millis(250), move |ctx| {
            if textured || !sheet_asset.is_ready() {
                return Ok(());
            }
            let sheet = Spritesheet::new(
                sheet_asset.clone(),
                [("grass".to_string(), SpriteRegion::new(0, 0, 16, 16))],
            )?;
            textured = true;
            Self::texture_map(&mut ctx.scene, &sheet, map)
        })?;

        let controls = Rc::clone(&self.controls);
        engine.add_logic("moveLogic", Interval::Millis(120), move |ctx| {
            let Some((dcol, drow)) = controls.direction.get() else {
                return Ok(());
            };
            let Some(here) = ctx.scene.world_position(player) else {
                return Ok(());
            };
            let Some(coord) = ctx.scene.coord_at(walls, here)? else {
                return Ok(());
            };
            let Some(target) = coord.offset(dcol, drow, ctx.scene.grid_size(walls)?) else {
                return Ok(());
            };
            if !ctx.scene.is_collisionable(walls, target)? {
                let delta = Vec2::new(dcol as f32, drow as f32) * TILE;
                ctx.scene.translate(player, delta)?;
            }
            Ok(())
        })?;

        let controls = Rc::clone(&self.controls);
        engine.add_logic("cameraLogic", Interval::EVERY_TICK, move |ctx| {
            let Some(camera) = ctx.render.camera_mut(camera) else {
                return Ok(());
            };
            let zoom = controls.zoom.replace(0.0);
            if zoom != 0.0 {
                if let Err(err) = camera.zoom_by(zoom) {
                    log::debug!("Ignoring zoom: {err}");
                }
            }
            if let Some(rect) = controls.follow.take() {
                camera.center_on(rect)?;
            }
            Ok(())
        })?;

        let controls = Rc::clone(&self.controls);
        engine.add_logic("audioLogic", Interval::EVERY_TICK, move |ctx| {
            if controls.toggle_mute.take() {
                if ctx.audio.is_muted() {
                    ctx.audio.unmute();
                } else {
                    ctx.audio.mute();
                }
            }
            Ok(())
        })?;

        engine.add_logic("quitLogic", Interval::EVERY_TICK, |ctx| {
            if ctx.input.keyboard().is_some_and(|k| k.is_key_down(KeyCode::Escape)) {
                ctx.quit();
            }
            Ok(())
        })?;

        log::info!("Pallet ready with {} nodes", engine.scene().len());
        Ok(())
    }

    fn on_resize(&mut self, engine: &mut Engine<Source>, width: u32, height: u32) {
        let dimension = Vec2::new(width as f32, height as f32);
        let render = &mut engine.context_mut().render;
        let ids: Vec<CameraId> = render.cameras().map(|(id, _)| id).collect();
        for id in ids {
            if let Some(camera) = render.camera_mut(id) {
                if let Err(err) = camera.set_render_dimension(dimension) {
                    log::warn!("Camera resize rejected: {err}");
                }
            }
        }
    }
}

fn arrow(key: KeyCode) -> Option<(i32, i32)> {
    match key {
        KeyCode::ArrowLeft | KeyCode::KeyA => Some((-1, 0)),
        KeyCode::ArrowRight | KeyCode::KeyD => Some((1, 0)),
        KeyCode::ArrowUp | KeyCode::KeyW => Some((0, -1)),
        KeyCode::ArrowDown | KeyCode::KeyS => Some((0, 1)),
        _ => None,
    }
}

fn source() -> anyhow::Result<Source> {
    #[cfg(feature = "gilrs")]
    {
        let pads = tilegame::input::GilrsSource::new()
            .map_err(|e| anyhow::anyhow!("gamepad backend unavailable: {e}"))?;
        Ok((WindowInput::new(), pads))
    }
    #[cfg(not(feature = "gilrs"))]
    {
        Ok(WindowInput::new())
    }
}

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default().with_title("Pallet"),
    };

    let engine = Engine::new(config, source()?)?;
    App::new(engine, Pallet::default(), LogRenderer::default()).run()?;
    Ok(())
}
