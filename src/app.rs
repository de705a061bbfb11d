use anyhow::Result;

use crate::camera::PerspectiveCamera;
use crate::config::LagoonConfig;
use crate::core::{
    handle_resize, CancellationToken, FpsCounter, FrameClock, FrameTime, OrbitControls, RevealSequence,
    Viewport, WinitController,
};
use crate::gui::{draw_loading_bar, validate_controls, water_controls, DebugPanel, PanelStats};
use crate::loading::{AssetLoader, AssetResult, LoadEvent, LoadingBar, LoadingManager};
use crate::loaders::ModelData;
use crate::scene::{AnimationMixer, Scene};
use crate::scenes::{attach_model, bind_clip, compose, AttachedModel, ScenePreset, SceneHandles};
use crate::traits::{RenderFrame, RenderSurface, SceneRenderer};
use crate::uniforms::{self, UniformSet};

/// How often the FPS readout refreshes, in seconds
const FPS_UPDATE_INTERVAL: f32 = 0.5;

/// Whether the frame loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Steps of one tick, recorded in the order they ran
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickStage {
    Loader,
    Clock,
    Uniforms,
    Controls,
    Mixer,
    Ui,
    Render,
    RequestFrame,
}

/// All per-run state: scene, camera, uniforms, loading and timing
///
/// Owned by the event loop and handed to the renderer once per tick.
pub struct AppContext {
    pub config: LagoonConfig,
    pub preset: ScenePreset,
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub water: UniformSet,
    pub overlay: UniformSet,
    pub handles: SceneHandles,
    pub manager: LoadingManager,
    pub bar: LoadingBar,
    pub reveal: RevealSequence,
    pub clock: FrameClock,
    pub mixer: Option<AnimationMixer>,
    pub viewport: Viewport,
    pub panel: DebugPanel,
    pub model: Option<AttachedModel>,
    fps: FpsCounter,
    input: WinitController,
    loader: AssetLoader,
    cancel: CancellationToken,
    load_events: Vec<LoadEvent>,
    stages: Vec<TickStage>,
    /// Set while the window has a zero-sized inner area
    minimised: bool,
}

impl AppContext {
    pub fn new(config: LagoonConfig, clock: FrameClock, viewport: Viewport) -> Result<Self> {
        config.validate()?;
        let preset = config.preset;
        let composed = compose(preset, &config, viewport.aspect());

        let specs = water_controls();
        validate_controls(&specs, &composed.water)?;

        log::info!(
            "Scene {} ready: {} nodes, {} meshes, {}x{} @{}x",
            preset.name(),
            composed.scene.len(),
            composed.scene.mesh_count(),
            viewport.width,
            viewport.height,
            viewport.pixel_ratio
        );

        Ok(Self {
            preset,
            scene: composed.scene,
            camera: composed.camera,
            controls: composed.controls,
            water: composed.water,
            overlay: composed.overlay,
            handles: composed.handles,
            manager: LoadingManager::new(config.loading.failure_policy),
            bar: LoadingBar::new(config.loading.bar_collapse_seconds),
            reveal: RevealSequence::new(config.loading.reveal),
            clock,
            mixer: None,
            viewport,
            panel: DebugPanel::new(specs, config.show_ui),
            model: None,
            fps: FpsCounter::new(FPS_UPDATE_INTERVAL),
            input: WinitController::new(),
            loader: AssetLoader::new(config.assets_dir.clone()),
            cancel: CancellationToken::new(),
            load_events: Vec::new(),
            stages: Vec::new(),
            minimised: false,
            config,
        })
    }

    /// Start fetching the preset's model in the background
    pub fn request_assets(&mut self) {
        let url = self.preset.model_url();
        self.track_asset(url);
        self.loader.request(url);
    }

    /// Count an asset as outstanding without fetching it
    pub fn track_asset(&mut self, url: &str) {
        let events = self.manager.item_start(url);
        self.handle_load_events(events);
    }

    /// Apply every finished asset request; returns how many there were
    pub fn pump_loader(&mut self) -> usize {
        let results = self.loader.poll();
        let count = results.len();
        for result in results {
            self.apply_asset_result(result);
        }
        count
    }

    pub fn apply_asset_result(&mut self, result: AssetResult) {
        let events = match result.result {
            Ok(model) => {
                self.add_model(&model);
                self.manager.item_end(&result.url)
            }
            Err(e) => {
                log::warn!("Failed to load {}: {:#}", result.url, e);
                self.manager.item_error(&result.url)
            }
        };
        self.handle_load_events(events);
    }

    fn add_model(&mut self, model: &ModelData) {
        let attached = attach_model(&mut self.scene, model, self.preset.name(), self.preset.model_scale());

        if self.preset.plays_animation() {
            match model.animations.first() {
                Some(clip) => match bind_clip(clip, &attached) {
                    Ok(clip) => self.mixer = Some(AnimationMixer::new(clip)),
                    Err(e) => log::warn!("Animation disabled: {:#}", e),
                },
                None => log::info!("Model has no animation clips"),
            }
        }
        self.model = Some(attached);
    }

    /// React to loader notifications: move the bar, start the reveal
    pub fn handle_load_events(&mut self, events: Vec<LoadEvent>) {
        for event in events {
            match &event {
                LoadEvent::Started { url, .. } => log::info!("Loading started with {}", url),
                LoadEvent::Progress {
                    items_loaded,
                    items_total,
                    ..
                } => {
                    log::debug!("Loaded {}/{}", items_loaded, items_total);
                    self.bar.set_progress(*items_loaded as f32 / *items_total as f32);
                }
                LoadEvent::Error { .. } => {}
                LoadEvent::Completed => self.reveal.start(self.clock.now()),
            }
            self.load_events.push(event);
        }
    }

    /// Every loader event seen so far
    pub fn load_events(&self) -> &[LoadEvent] {
        &self.load_events
    }

    /// Steps the last tick ran
    pub fn stages(&self) -> &[TickStage] {
        &self.stages
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn input_mut(&mut self) -> &mut WinitController {
        &mut self.input
    }

    pub fn is_minimised(&self) -> bool {
        self.minimised
    }

    /// Returns true when a minimised window got its size back and the
    /// frame loop has to be kicked again
    pub fn resize(&mut self, surface: &mut dyn RenderSurface, width: u32, height: u32, device_pixel_ratio: f64) -> bool {
        if width == 0 || height == 0 {
            if !self.minimised {
                log::debug!("Window minimised, pausing frame requests");
            }
            self.minimised = true;
            return false;
        }
        let restored = std::mem::replace(&mut self.minimised, false);
        if restored {
            log::debug!("Window restored to {}x{}", width, height);
        }
        handle_resize(
            &mut self.viewport,
            &mut self.camera,
            surface,
            width,
            height,
            device_pixel_ratio,
        );
        restored
    }

    /// Run one frame; render and mixer errors end the loop
    pub fn tick<R: SceneRenderer + ?Sized>(&mut self, renderer: &mut R) -> Result<LoopState> {
        self.stages.clear();
        if self.cancel.is_cancelled() {
            return Ok(LoopState::Stopped);
        }

        self.pump_loader();
        let now = self.clock.now();
        let mut alpha = self.overlay.float(uniforms::ALPHA)?;
        self.reveal.advance(now, &mut self.bar, &mut alpha);
        self.overlay.set_float(uniforms::ALPHA, alpha)?;
        self.stages.push(TickStage::Loader);

        let frame: FrameTime = self.clock.tick();
        self.fps.tick(frame.delta as f32);
        self.stages.push(TickStage::Clock);

        self.water.set_float(uniforms::TIME, frame.elapsed as f32)?;
        self.stages.push(TickStage::Uniforms);

        self.controls
            .apply_input(&self.input, &self.camera, self.viewport.height as f32);
        self.input.reset_deltas();
        self.controls.update(&mut self.camera);
        self.stages.push(TickStage::Controls);

        if let Some(mixer) = &mut self.mixer {
            mixer.update(frame.delta as f32, &mut self.scene)?;
            self.stages.push(TickStage::Mixer);
        }

        let bar = self.bar.display(frame.elapsed);
        let stats = PanelStats {
            fps: self.fps.fps(),
            progress: self.manager.progress(),
        };
        let panel = &self.panel;
        let water = &mut self.water;
        renderer.run_ui(&mut |ctx: &egui::Context| {
            if let Some(bar) = bar {
                draw_loading_bar(ctx, bar);
            }
            panel.show(ctx, water, stats);
        });
        self.stages.push(TickStage::Ui);

        renderer.render(&RenderFrame {
            scene: &self.scene,
            camera: &self.camera,
            water: &self.water,
            overlay: &self.overlay,
            viewport: self.viewport,
        })?;
        self.stages.push(TickStage::Render);

        if self.cancel.is_cancelled() {
            return Ok(LoopState::Stopped);
        }
        if self.minimised {
            return Ok(LoopState::Running);
        }
        renderer.request_next_frame();
        self.stages.push(TickStage::RequestFrame);
        Ok(LoopState::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualTime;

    #[derive(Default)]
    struct NullRenderer {
        frames: usize,
        next_frames: std::cell::Cell<usize>,
    }

    impl RenderSurface for NullRenderer {
        fn set_size(&mut self, _width: u32, _height: u32) {}
        fn set_pixel_ratio(&mut self, _ratio: f64) {}
    }

    impl SceneRenderer for NullRenderer {
        fn run_ui(&mut self, _build: &mut dyn FnMut(&egui::Context)) {}

        fn render(&mut self, _frame: &RenderFrame<'_>) -> Result<()> {
            self.frames += 1;
            Ok(())
        }

        fn request_next_frame(&self) {
            self.next_frames.set(self.next_frames.get() + 1);
        }
    }

    fn context(time: &ManualTime) -> AppContext {
        AppContext::new(
            LagoonConfig::default(),
            FrameClock::new(Box::new(time.clone())),
            Viewport::new(800, 600, 1.0),
        )
        .unwrap()
    }

    #[test]
    fn test_tick_without_assets() {
        let time = ManualTime::new();
        let mut app = context(&time);
        let mut renderer = NullRenderer::default();

        time.set(0.5);
        assert_eq!(app.tick(&mut renderer).unwrap(), LoopState::Running);
        assert_eq!(renderer.frames, 1);
        assert_eq!(renderer.next_frames.get(), 1);
        assert_eq!(app.water.float(uniforms::TIME), Ok(0.5));
        // Nothing requested, so the overlay stays opaque
        assert_eq!(app.overlay.float(uniforms::ALPHA), Ok(1.0));
        assert!(!app.stages().contains(&TickStage::Mixer));
    }

    #[test]
    fn test_cancelled_before_tick_renders_nothing() {
        let time = ManualTime::new();
        let mut app = context(&time);
        let mut renderer = NullRenderer::default();

        app.cancel_token().cancel();
        assert_eq!(app.tick(&mut renderer).unwrap(), LoopState::Stopped);
        assert_eq!(renderer.frames, 0);
        assert!(app.stages().is_empty());
    }

    #[test]
    fn test_progress_moves_bar() {
        let time = ManualTime::new();
        let mut app = context(&time);

        app.track_asset("a.gltf");
        app.track_asset("b.gltf");
        app.apply_asset_result(AssetResult {
            url: "a.gltf".to_string(),
            result: Ok(ModelData::default()),
        });

        assert_eq!(
            app.bar.transform(),
            Some(crate::loading::BarTransform::ScaleX(0.5))
        );
        assert!(!app.reveal.is_started());
    }
}
