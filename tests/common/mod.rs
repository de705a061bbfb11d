use std::cell::Cell;

use lagoon::core::CancellationToken;
use lagoon::traits::{RenderFrame, RenderSurface, SceneRenderer};

/// Renderer that records calls instead of drawing
#[derive(Default)]
pub struct NullRenderer {
    pub size: Option<(u32, u32)>,
    pub pixel_ratio: Option<f64>,
    pub frames: usize,
    pub ui_builds: usize,
    pub next_frames: Cell<usize>,
    /// Cancelled from inside `render` when set
    pub cancel_on_render: Option<CancellationToken>,
}

impl RenderSurface for NullRenderer {
    fn set_size(&mut self, width: u32, height: u32) {
        self.size = Some((width, height));
    }

    fn set_pixel_ratio(&mut self, ratio: f64) {
        self.pixel_ratio = Some(ratio);
    }
}

impl SceneRenderer for NullRenderer {
    fn run_ui(&mut self, build: &mut dyn FnMut(&egui::Context)) {
        let ctx = egui::Context::default();
        let _ = ctx.run(egui::RawInput::default(), |ctx| build(ctx));
        self.ui_builds += 1;
    }

    fn render(&mut self, _frame: &RenderFrame<'_>) -> anyhow::Result<()> {
        self.frames += 1;
        if let Some(token) = &self.cancel_on_render {
            token.cancel();
        }
        Ok(())
    }

    fn request_next_frame(&self) {
        self.next_frames.set(self.next_frames.get() + 1);
    }
}
