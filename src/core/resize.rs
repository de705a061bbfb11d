use crate::camera::PerspectiveCamera;
use crate::traits::RenderSurface;

/// Upper bound on the device pixel ratio used for rendering
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Output size in logical pixels plus the render pixel ratio
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64) -> Self {
        Self {
            width,
            height,
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio),
        }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Backing buffer size in physical pixels
    pub fn physical_size(&self) -> (u32, u32) {
        (
            ((self.width as f64 * self.pixel_ratio).round() as u32).max(1),
            ((self.height as f64 * self.pixel_ratio).round() as u32).max(1),
        )
    }
}

pub fn clamp_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    device_pixel_ratio.min(MAX_PIXEL_RATIO)
}

/// Apply a new window size to the viewport, camera and renderer
///
/// Zero-sized windows (minimised) are ignored.
pub fn handle_resize(
    viewport: &mut Viewport,
    camera: &mut PerspectiveCamera,
    surface: &mut dyn RenderSurface,
    width: u32,
    height: u32,
    device_pixel_ratio: f64,
) {
    if width == 0 || height == 0 {
        log::debug!("Ignoring resize to {}x{}", width, height);
        return;
    }

    viewport.width = width;
    viewport.height = height;
    viewport.pixel_ratio = clamp_pixel_ratio(device_pixel_ratio);

    camera.aspect = viewport.aspect();
    camera.update_projection_matrix();

    surface.set_size(width, height);
    surface.set_pixel_ratio(viewport.pixel_ratio);
    log::debug!(
        "Resized to {}x{} @{}x ({}x{} physical)",
        width,
        height,
        viewport.pixel_ratio,
        viewport.physical_size().0,
        viewport.physical_size().1
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MockSurface {
        size: Option<(u32, u32)>,
        pixel_ratio: Option<f64>,
        calls: usize,
    }

    impl RenderSurface for MockSurface {
        fn set_size(&mut self, width: u32, height: u32) {
            self.size = Some((width, height));
            self.calls += 1;
        }

        fn set_pixel_ratio(&mut self, ratio: f64) {
            self.pixel_ratio = Some(ratio);
            self.calls += 1;
        }
    }

    #[test]
    fn resize_updates_camera_and_surface() {
        let mut viewport = Viewport::new(1, 1, 1.0);
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let mut surface = MockSurface::default();

        handle_resize(&mut viewport, &mut camera, &mut surface, 800, 600, 3.0);

        assert_eq!(camera.aspect, 800.0 / 600.0);
        assert_eq!(
            camera.projection_matrix(),
            glam::Mat4::perspective_rh(75f32.to_radians(), 800.0 / 600.0, 0.1, 100.0)
        );
        assert_eq!(surface.size, Some((800, 600)));
        assert_eq!(surface.pixel_ratio, Some(2.0));
        assert_eq!(viewport.physical_size(), (1600, 1200));
    }

    #[test]
    fn pixel_ratio_below_cap_is_kept() {
        for (dpr, expected) in [(1.0, 1.0), (1.5, 1.5), (2.0, 2.0), (2.5, 2.0)] {
            let mut viewport = Viewport::new(1, 1, 1.0);
            let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
            let mut surface = MockSurface::default();
            handle_resize(&mut viewport, &mut camera, &mut surface, 800, 600, dpr);
            assert_eq!(surface.pixel_ratio, Some(expected));
        }
    }

    #[test]
    fn resize_is_idempotent() {
        let mut viewport = Viewport::new(1, 1, 1.0);
        let mut camera = PerspectiveCamera::new(75.0, 1.0, 0.1, 100.0);
        let mut surface = MockSurface::default();

        handle_resize(&mut viewport, &mut camera, &mut surface, 1024, 768, 1.0);
        let first = (viewport, camera.projection_matrix(), surface.size);
        handle_resize(&mut viewport, &mut camera, &mut surface, 1024, 768, 1.0);

        assert_eq!(first, (viewport, camera.projection_matrix(), surface.size));
    }

    #[test]
    fn zero_size_is_ignored() {
        let mut viewport = Viewport::new(800, 600, 1.0);
        let mut camera = PerspectiveCamera::new(75.0, 800.0 / 600.0, 0.1, 100.0);
        let mut surface = MockSurface::default();

        handle_resize(&mut viewport, &mut camera, &mut surface, 0, 600, 1.0);

        assert_eq!(viewport.width, 800);
        assert_eq!(surface.calls, 0);
    }
}
