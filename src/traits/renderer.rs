use crate::camera::PerspectiveCamera;
use crate::core::Viewport;
use crate::scene::Scene;
use crate::uniforms::UniformSet;

/// Output whose size and pixel density follow the window
pub trait RenderSurface {
    /// Output size in logical pixels
    fn set_size(&mut self, width: u32, height: u32);

    /// Backing-store pixels per logical pixel
    fn set_pixel_ratio(&mut self, ratio: f64);
}

/// Everything needed to draw one frame
pub struct RenderFrame<'a> {
    pub scene: &'a Scene,
    pub camera: &'a PerspectiveCamera,
    pub water: &'a UniformSet,
    pub overlay: &'a UniformSet,
    pub viewport: Viewport,
}

/// Scene renderer driven once per tick
pub trait SceneRenderer: RenderSurface {
    /// Build the debug GUI for this frame
    fn run_ui(&mut self, build: &mut dyn FnMut(&egui::Context));

    /// Draw the scene, then any GUI built since the last frame
    fn render(&mut self, frame: &RenderFrame<'_>) -> anyhow::Result<()>;

    /// Ask for another tick
    fn request_next_frame(&self);
}
