use crate::loading::{BarAnchor, BarDisplay, LoadProgress};
use crate::math::Rgb;
use crate::uniforms::{self, UniformError, UniformKind, UniformSet, UniformValue};

/// How a uniform is edited
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlKind {
    Slider { min: f32, max: f32, step: f32 },
    ColorPicker,
}

/// One debug GUI control bound to a uniform (or one component of a vec2)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlSpec {
    pub uniform: &'static str,
    pub component: Option<usize>,
    pub label: &'static str,
    pub kind: ControlKind,
}

impl ControlSpec {
    fn slider(uniform: &'static str, label: &'static str, min: f32, max: f32, step: f32) -> Self {
        Self {
            uniform,
            component: None,
            label,
            kind: ControlKind::Slider { min, max, step },
        }
    }

    fn component(mut self, index: usize) -> Self {
        self.component = Some(index);
        self
    }

    fn color(uniform: &'static str) -> Self {
        Self {
            uniform,
            component: None,
            label: uniform,
            kind: ControlKind::ColorPicker,
        }
    }

    fn expected_kind(&self) -> UniformKind {
        match (self.kind, self.component) {
            (ControlKind::ColorPicker, _) => UniformKind::Color,
            (ControlKind::Slider { .. }, Some(_)) => UniformKind::Vec2,
            (ControlKind::Slider { .. }, None) => UniformKind::Float,
        }
    }
}

/// Controls for every tunable water uniform
pub fn water_controls() -> Vec<ControlSpec> {
    use uniforms::*;
    vec![
        ControlSpec::slider(BIG_WAVES_ELEVATION, "uBigWavesElevation", 0.0, 1.0, 0.001),
        ControlSpec::slider(BIG_WAVES_FREQUENCY, "uBigWavesFrequencyX", 0.0, 10.0, 0.001).component(0),
        ControlSpec::slider(BIG_WAVES_FREQUENCY, "uBigWavesFrequencyY", 0.0, 10.0, 0.001).component(1),
        ControlSpec::slider(BIG_WAVES_SPEED, "uBigWavesSpeed", 0.0, 4.0, 0.001),
        ControlSpec::slider(SMALL_WAVES_ELEVATION, "uSmallWavesElevation", 0.0, 1.0, 0.001),
        ControlSpec::slider(SMALL_WAVES_FREQUENCY, "uSmallWavesFrequency", 0.0, 30.0, 0.001),
        ControlSpec::slider(SMALL_WAVES_SPEED, "uSmallWavesSpeed", 0.0, 4.0, 0.001),
        ControlSpec::slider(SMALL_ITERATIONS, "uSmallIterations", 0.0, 5.0, 1.0),
        ControlSpec::color(DEPTH_COLOR),
        ControlSpec::color(SURFACE_COLOR),
        ControlSpec::slider(COLOR_OFFSET, "uColorOffset", 0.0, 1.0, 0.001),
        ControlSpec::slider(COLOR_MULTIPLIER, "uColorMultiplier", 0.0, 10.0, 0.001),
    ]
}

/// Check every control targets an existing uniform of the right kind
pub fn validate_controls(specs: &[ControlSpec], set: &UniformSet) -> Result<(), UniformError> {
    for spec in specs {
        let found = set.get(spec.uniform)?.kind();
        if found != spec.expected_kind() {
            return Err(UniformError::KindMismatch {
                name: spec.uniform.to_string(),
                expected: spec.expected_kind(),
                found,
            });
        }
    }
    Ok(())
}

/// Current value behind a slider control
pub fn control_value(set: &UniformSet, spec: &ControlSpec) -> Result<f32, UniformError> {
    match spec.component {
        Some(i) => Ok(set.vec2(spec.uniform)?.to_array()[i.min(1)]),
        None => set.float(spec.uniform),
    }
}

/// Write a slider value, clamped to the control's range
pub fn set_control(set: &mut UniformSet, spec: &ControlSpec, value: f32) -> Result<(), UniformError> {
    let value = match spec.kind {
        ControlKind::Slider { min, max, .. } => value.clamp(min, max),
        ControlKind::ColorPicker => value,
    };
    match spec.component {
        Some(i) => {
            let mut v = set.vec2(spec.uniform)?;
            v[i.min(1)] = value;
            set.set(spec.uniform, UniformValue::Vec2(v))
        }
        None => set.set_float(spec.uniform, value),
    }
}

/// Figures shown under the controls
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelStats {
    pub fps: f32,
    pub progress: LoadProgress,
}

/// Debug GUI window for live-tuning uniforms
pub struct DebugPanel {
    pub visible: bool,
    specs: Vec<ControlSpec>,
}

impl DebugPanel {
    pub fn new(specs: Vec<ControlSpec>, visible: bool) -> Self {
        Self { visible, specs }
    }

    pub fn specs(&self) -> &[ControlSpec] {
        &self.specs
    }

    pub fn show(&self, ctx: &egui::Context, water: &mut UniformSet, stats: PanelStats) {
        if !self.visible {
            return;
        }

        egui::Window::new("Debug")
            .default_pos(egui::pos2(10.0, 10.0))
            .resizable(false)
            .show(ctx, |ui| {
                for spec in &self.specs {
                    if let Err(e) = Self::control(ui, water, spec) {
                        log::warn!("GUI control {}: {}", spec.label, e);
                    }
                }

                ui.separator();
                ui.label(
                    egui::RichText::new(format!("{:.0} FPS", stats.fps))
                        .color(egui::Color32::from_rgb(74, 158, 255)),
                );
                ui.label(
                    egui::RichText::new(format!(
                        "assets {}/{}",
                        stats.progress.items_loaded, stats.progress.items_total
                    ))
                    .color(egui::Color32::GRAY),
                );
            });
    }

    fn control(ui: &mut egui::Ui, water: &mut UniformSet, spec: &ControlSpec) -> Result<(), UniformError> {
        match spec.kind {
            ControlKind::Slider { min, max, step } => {
                let mut value = control_value(water, spec)?;
                let changed = ui
                    .add(
                        egui::Slider::new(&mut value, min..=max)
                            .step_by(step as f64)
                            .text(spec.label),
                    )
                    .changed();
                if changed {
                    set_control(water, spec, value)?;
                }
            }
            ControlKind::ColorPicker => {
                // The picker edits linear RGB, uniforms hold sRGB
                let color = water.color_mut(spec.uniform)?;
                let mut linear = Rgb(*color).to_linear();
                ui.horizontal(|ui| {
                    if ui.color_edit_button_rgb(&mut linear).changed() {
                        *color = Rgb::from_linear(linear).0;
                    }
                    ui.label(spec.label);
                });
            }
        }
        Ok(())
    }
}

/// Screen-space rectangle covered by the loading bar
pub fn bar_rect(screen: egui::Rect, display: BarDisplay) -> egui::Rect {
    let width = screen.width() * display.scale;
    let y = screen.center().y;
    let (left, right) = match display.anchor {
        BarAnchor::Left => (screen.left(), screen.left() + width),
        BarAnchor::Right => (screen.right() - width, screen.right()),
    };
    egui::Rect::from_min_max(egui::pos2(left, y), egui::pos2(right, y + 2.0))
}

/// Thin white bar across the middle of the screen, above everything else
pub fn draw_loading_bar(ctx: &egui::Context, display: BarDisplay) {
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("loading_bar"),
    ));
    painter.rect_filled(bar_rect(ctx.screen_rect(), display), 0.0, egui::Color32::WHITE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uniforms::{water_uniforms, WaterSettings, BIG_WAVES_FREQUENCY, SMALL_ITERATIONS};

    #[test]
    fn test_controls_match_water_uniforms() {
        let set = water_uniforms(&WaterSettings::default());
        let specs = water_controls();
        assert!(validate_controls(&specs, &set).is_ok());

        // Every uniform except time is tunable
        for (name, _) in set.iter() {
            let covered = specs.iter().any(|s| s.uniform == name);
            assert_eq!(covered, name != uniforms::TIME, "{}", name);
        }
    }

    #[test]
    fn test_vector_components_are_separate_controls() {
        let mut set = water_uniforms(&WaterSettings::default());
        let specs = water_controls();
        let y = specs.iter().find(|s| s.label == "uBigWavesFrequencyY").unwrap();

        assert_eq!(control_value(&set, y), Ok(1.5));
        set_control(&mut set, y, 2.5).unwrap();
        assert_eq!(set.vec2(BIG_WAVES_FREQUENCY), Ok(glam::Vec2::new(4.0, 2.5)));
    }

    #[test]
    fn test_slider_value_is_clamped() {
        let mut set = water_uniforms(&WaterSettings::default());
        let specs = water_controls();
        let iterations = specs.iter().find(|s| s.uniform == SMALL_ITERATIONS).unwrap();
        assert_eq!(
            iterations.kind,
            ControlKind::Slider {
                min: 0.0,
                max: 5.0,
                step: 1.0
            }
        );

        set_control(&mut set, iterations, 12.0).unwrap();
        assert_eq!(set.float(SMALL_ITERATIONS), Ok(5.0));
    }

    #[test]
    fn test_validation_catches_wrong_kind() {
        let set = water_uniforms(&WaterSettings::default());
        let bad = [ControlSpec::color(uniforms::COLOR_OFFSET)];
        assert!(matches!(
            validate_controls(&bad, &set),
            Err(UniformError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_bar_rect_anchors() {
        let screen = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(800.0, 600.0));
        let left = bar_rect(
            screen,
            BarDisplay {
                scale: 0.25,
                anchor: BarAnchor::Left,
            },
        );
        assert_eq!((left.left(), left.right(), left.top()), (0.0, 200.0, 300.0));

        let right = bar_rect(
            screen,
            BarDisplay {
                scale: 0.25,
                anchor: BarAnchor::Right,
            },
        );
        assert_eq!((right.left(), right.right()), (600.0, 800.0));
        assert_eq!(right.height(), 2.0);
    }
}
