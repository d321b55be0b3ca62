//! Engine host: owns every subsystem and drives one tick at a time

use std::time::Duration;

use glam::Vec2;

use crate::assets::{AssetFactory, LoadQueue};
use crate::audio::{AudioManager, AudioPlayer};
use crate::core::{EngineConfig, EngineError};
use crate::input::{InputManager, InputSource};
use crate::logic::{Interval, LogicScheduler, TickReport};
use crate::renderer::{RenderFrame, RenderState, Renderer};
use crate::scene::Scene;

/// State handed to logic callbacks
pub struct EngineContext {
    /// Scene tree
    pub scene: Scene,
    /// Cameras, HUD and canvas size
    pub render: RenderState,
    /// Builds assets with the configured load strategies
    pub assets: AssetFactory,
    /// Delivers finished background loads
    pub loads: LoadQueue,
    /// Connected input devices
    pub input: InputManager,
    /// Named audio tracks and pending playback requests
    pub audio: AudioManager,
    /// Ticks completed so far
    tick: u64,
    /// Length of one tick
    tick_length: Duration,
    /// Should the engine stop
    should_quit: bool,
}

impl EngineContext {
    /// Number of the tick in progress, starting at 1
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Length of one tick
    #[must_use]
    pub const fn tick_length(&self) -> Duration {
        self.tick_length
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Check if shutdown was requested
    #[must_use]
    pub const fn should_quit(&self) -> bool {
        self.should_quit
    }
}

/// The engine: scene, cameras, assets, input and logic behind one tick
pub struct Engine<S: InputSource> {
    config: EngineConfig,
    context: EngineContext,
    logic: LogicScheduler<EngineContext>,
    source: S,
}

impl<S: InputSource> Engine<S> {
    /// Create an engine reading input from `source`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(config: EngineConfig, source: S) -> Result<Self, EngineError> {
        config.validate()?;

        let loads = LoadQueue::new();
        let context = EngineContext {
            scene: Scene::new(),
            render: RenderState::new(Vec2::new(config.width as f32, config.height as f32)),
            assets: AssetFactory::with_file_strategies(&config.asset_root, loads.clone()),
            loads,
            input: InputManager::from_config(&config)?,
            audio: AudioManager::new(),
            tick: 0,
            tick_length: config.tick(),
            should_quit: false,
        };

        log::info!(
            "Engine `{}` ready: {}x{}, {} ms ticks, assets from {}",
            config.title,
            config.width,
            config.height,
            config.tick_ms,
            config.asset_root.display()
        );

        Ok(Self {
            logic: LogicScheduler::new(config.tick()),
            config,
            context,
            source,
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut EngineContext {
        &mut self.context
    }

    #[must_use]
    pub fn scene(&self) -> &Scene {
        &self.context.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.context.scene
    }

    /// The platform input source
    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// The platform input source, for feeding window events or scripting
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    #[must_use]
    pub fn logic(&self) -> &LogicScheduler<EngineContext> {
        &self.logic
    }

    pub fn logic_mut(&mut self) -> &mut LogicScheduler<EngineContext> {
        &mut self.logic
    }

    /// Register a named logic callback
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the interval is invalid
    pub fn add_logic<F>(
        &mut self,
        name: impl Into<String>,
        interval: Interval,
        callback: F,
    ) -> Result<(), EngineError>
    where
        F: FnMut(&mut EngineContext) -> anyhow::Result<()> + 'static,
    {
        self.logic.add_logic(name, interval, callback)?;
        Ok(())
    }

    /// Unregister a logic callback; returns whether it existed
    pub fn remove_logic(&mut self, name: &str) -> bool {
        self.logic.remove_logic(name)
    }

    /// Run one tick: input, finished loads, then logic
    pub fn tick(&mut self) -> TickReport {
        self.source.refresh();
        self.context.input.tick(&self.source);
        self.context.loads.pump();

        self.context.tick += 1;
        self.logic.tick(&mut self.context)
    }

    /// Draw list for the current scene and cameras
    #[must_use]
    pub fn frame(&self) -> RenderFrame {
        RenderFrame::build(&self.context.scene, &self.context.render)
    }

    /// Build a frame and hand it to a renderer
    pub fn render(&self, renderer: &mut dyn Renderer) {
        renderer.render(&self.frame());
    }

    /// Hand queued audio requests to a player; returns how many were applied
    pub fn play_audio(&mut self, player: &mut dyn AudioPlayer) -> usize {
        self.context.audio.flush(player)
    }

    /// Update the canvas size
    pub fn resize(&mut self, width: u32, height: u32) {
        self.context
            .render
            .set_viewport(Vec2::new(width as f32, height as f32));
    }

    /// Check if shutdown was requested
    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.context.should_quit
    }
}

impl<S: InputSource> std::fmt::Debug for Engine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("title", &self.config.title)
            .field("tick", &self.context.tick)
            .field("scene", &self.context.scene)
            .field("logic", &self.logic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use hecs::Entity;
    use winit::keyboard::KeyCode;

    use super::*;
    use crate::assets::{AssetState, AssetType};
    use crate::input::{DeviceSlot, InputElement, Reading, ScriptedSource};
    use crate::renderer::Camera;
    use crate::scene::{GridCoord, GridSize, Node};

    const TILE: f32 = 50.0;

    fn engine() -> Engine<ScriptedSource> {
        let mut source = ScriptedSource::new();
        source.connect(DeviceSlot::KEYBOARD, Reading::new());
        Engine::new(EngineConfig::default(), source).unwrap()
    }

    /// Move the player one tile unless the target tile is collisionable
    fn try_move(ctx: &mut EngineContext, grid: Entity, player: Entity, dcol: i32, drow: i32) -> anyhow::Result<bool> {
        let scene = &mut ctx.scene;
        let here = scene
            .world_position(player)
            .and_then(|p| scene.coord_at(grid, p).ok().flatten())
            .ok_or_else(|| anyhow::anyhow!("player is off the map"))?;
        let Some(target) = here.offset(dcol, drow, scene.grid_size(grid)?) else {
            return Ok(false);
        };
        if scene.is_collisionable(grid, target)? {
            return Ok(false);
        }
        scene.translate(player, Vec2::new(dcol as f32, drow as f32) * TILE)?;
        Ok(true)
    }

    fn press(engine: &mut Engine<ScriptedSource>, key: KeyCode) -> TickReport {
        engine
            .source_mut()
            .set(DeviceSlot::KEYBOARD, InputElement::Key(key), 1.0);
        let report = engine.tick();
        engine
            .source_mut()
            .set(DeviceSlot::KEYBOARD, InputElement::Key(key), 0.0);
        engine.tick();
        report
    }

    #[test]
    fn test_collision_blocks_movement() {
        let mut engine = engine();
        let scene = engine.scene_mut();
        let root = scene.spawn(Node::default());
        let grid = scene
            .spawn_grid_map(Vec2::ZERO, GridSize::new(3, 3), Vec2::splat(TILE))
            .unwrap();
        scene.add_child(root, grid).unwrap();
        scene.set_collisionable(grid, GridCoord::new(1, 1), true).unwrap();
        let player = scene
            .spawn_child(root, Node::from_xywh(0.0, 0.0, TILE, TILE))
            .unwrap();

        let moves = Rc::new(RefCell::new(Vec::new()));
        let record = Rc::clone(&moves);
        engine
            .add_logic("move", Interval::EVERY_TICK, move |ctx| {
                let Some(keyboard) = ctx.input.keyboard() else {
                    return Ok(());
                };
                let step = [
                    (KeyCode::ArrowRight, (1, 0)),
                    (KeyCode::ArrowDown, (0, 1)),
                    (KeyCode::ArrowLeft, (-1, 0)),
                    (KeyCode::ArrowUp, (0, -1)),
                ]
                .into_iter()
                .find(|(key, _)| keyboard.is_key_down(*key))
                .map(|(_, step)| step);

                if let Some((dcol, drow)) = step {
                    let moved = try_move(ctx, grid, player, dcol, drow)?;
                    record.borrow_mut().push(moved);
                }
                Ok(())
            })
            .unwrap();

        // Sync the keyboard device
        engine.tick();

        press(&mut engine, KeyCode::ArrowRight);
        assert_eq!(engine.scene().world_position(player), Some(Vec2::new(TILE, 0.0)));

        // (1, 0) -> (1, 1) is blocked
        press(&mut engine, KeyCode::ArrowDown);
        assert_eq!(engine.scene().world_position(player), Some(Vec2::new(TILE, 0.0)));
        assert!(engine.scene().is_collisionable(grid, GridCoord::new(1, 1)).unwrap());

        // Leaving the map is refused as well
        press(&mut engine, KeyCode::ArrowUp);
        assert_eq!(*moves.borrow(), vec![true, false, false]);
    }

    #[test]
    fn test_logic_failure_does_not_stop_tick() {
        let mut engine = engine();
        engine
            .add_logic("broken", Interval::EVERY_TICK, |_| anyhow::bail!("no map loaded"))
            .unwrap();
        engine
            .add_logic("counter", Interval::EVERY_TICK, |ctx| {
                ctx.scene.spawn(Node::default());
                Ok(())
            })
            .unwrap();

        let report = engine.tick();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(engine.scene().len(), 1);
        assert!(matches!(
            engine.add_logic("counter", Interval::EVERY_TICK, |_| Ok(())),
            Err(EngineError::Logic(_))
        ));
    }

    #[test]
    fn test_tick_pumps_loads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("map.txt"), "grass").unwrap();

        let config = EngineConfig::default().with_asset_root(dir.path());
        let mut engine = Engine::new(config, ScriptedSource::new()).unwrap();
        let asset = engine
            .context()
            .assets
            .build(AssetType::Text, "map.txt")
            .unwrap();
        asset.load().unwrap();
        assert_eq!(asset.state(), AssetState::Loading);

        // Only the engine tick delivers the worker result
        let mut ticks = 0;
        while !asset.is_ready() && ticks < 500 {
            engine.tick();
            std::thread::sleep(Duration::from_millis(10));
            ticks += 1;
        }

        assert!(asset.is_ready(), "load not delivered after {ticks} ticks");
        assert_eq!(asset.data().unwrap().as_text(), Some("grass"));
        assert_eq!(engine.context().loads.pending_count(), 0);
    }

    #[test]
    fn test_logic_queues_audio() {
        use std::sync::Arc;

        use crate::assets::{Asset, AssetData, AudioClip};
        use crate::audio::{AudioCommand, AudioPlayer};

        #[derive(Default)]
        struct Recorder(Vec<AudioCommand>);

        impl AudioPlayer for Recorder {
            fn apply(&mut self, command: &AudioCommand) {
                self.0.push(command.clone());
            }
        }

        let mut engine = engine();
        let music = Asset::new(AssetType::Audio, "bg.ogg");
        engine.context_mut().audio.add("bg", music.clone()).unwrap();
        engine
            .add_logic("music", Interval::EVERY_TICK, |ctx| {
                ctx.audio.play_looped("bg")?;
                Ok(())
            })
            .unwrap();

        engine.tick();
        let mut player = Recorder::default();
        assert_eq!(engine.play_audio(&mut player), 0);

        music.set_data(Some(AssetData::Audio(AudioClip {
            bytes: Arc::from(vec![1u8, 2, 3]),
            sample_rate: 22_050,
            channels: 1,
        })));
        music.set_state(AssetState::Loaded);
        assert_eq!(engine.play_audio(&mut player), 1);
        assert!(matches!(
            &player.0[..],
            [AudioCommand::Start { looped: true, .. }]
        ));
    }

    #[test]
    fn test_frame_and_quit() {
        let mut engine = engine();
        let root = engine.scene_mut().spawn(Node::default());
        let camera = Camera::unscaled(root, Vec2::splat(500.0)).unwrap();
        engine.context_mut().render.add_camera(camera);
        engine.resize(320, 240);

        let frame = engine.frame();
        assert_eq!(frame.viewport, Vec2::new(320.0, 240.0));
        assert_eq!(frame.views.len(), 1);

        engine
            .add_logic("quit", Interval::Ticks(2), |ctx| {
                ctx.quit();
                Ok(())
            })
            .unwrap();
        engine.tick();
        assert!(!engine.should_quit());
        engine.tick();
        assert!(engine.should_quit());
    }

    #[test]
    fn test_invalid_config() {
        let config = EngineConfig::default().with_tick_ms(0);
        assert!(matches!(
            Engine::new(config, ScriptedSource::new()),
            Err(EngineError::Config(_))
        ));
    }
}
