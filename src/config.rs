//! Runtime settings
//!
//! Loaded from a JSON file when one is given; every section falls back to
//! its defaults field by field, so a file only needs the values it changes.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{OrbitSettings, RevealTimings};
use crate::loading::LoadFailurePolicy;
use crate::math::Rgb;
use crate::scene::Fog;
use crate::scenes::ScenePreset;
use crate::uniforms::WaterSettings;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LagoonConfig {
    /// Which demo to show
    pub preset: ScenePreset,

    /// Directory model URLs are resolved against
    pub assets_dir: PathBuf,

    /// Show the debug GUI
    pub show_ui: bool,

    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub controls: OrbitSettings,
    pub loading: LoadingConfig,
    pub water: WaterSettings,
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    /// Initial inner size in logical pixels
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
    /// Orbit pivot
    pub target: [f32; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadingConfig {
    pub failure_policy: LoadFailurePolicy,
    pub reveal: RevealTimings,
    /// How long the ended loading bar takes to collapse
    pub bar_collapse_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub floor_color: Rgb,
    /// Replaces the preset's fog when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fog: Option<Fog>,
}

impl Default for LagoonConfig {
    fn default() -> Self {
        Self {
            preset: ScenePreset::default(),
            assets_dir: PathBuf::from("static"),
            show_ui: true,
            window: WindowConfig::default(),
            camera: CameraConfig::default(),
            controls: OrbitSettings::default(),
            loading: LoadingConfig::default(),
            water: WaterSettings::default(),
            scene: SceneConfig::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Lagoon".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 100.0,
            position: [5.0, 8.0, 8.0],
            target: [0.0, 0.75, 0.0],
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            failure_policy: LoadFailurePolicy::default(),
            reveal: RevealTimings::default(),
            bar_collapse_seconds: 1.5,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            floor_color: Rgb::from_hex(0xba9a88),
            fog: None,
        }
    }
}

impl LagoonConfig {
    /// Load configuration from `path`, or defaults when there is no file
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            log::warn!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values serde accepts but the scene cannot run with
    pub fn validate(&self) -> Result<()> {
        self.controls.validate().context("Invalid controls settings")?;

        let camera = &self.camera;
        if !(camera.near > 0.0) {
            bail!("Camera near plane must be positive, got {}", camera.near);
        }
        if !(camera.far > camera.near) {
            bail!("Camera far plane ({}) must lie beyond near plane ({})", camera.far, camera.near);
        }
        if !(camera.fov > 0.0 && camera.fov < 180.0) {
            bail!("Camera fov must be between 0 and 180 degrees, got {}", camera.fov);
        }
        if !(self.loading.bar_collapse_seconds >= 0.0) {
            bail!("bar_collapse_seconds must not be negative, got {}", self.loading.bar_collapse_seconds);
        }
        Ok(())
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = LagoonConfig::from_json(
            r##"{
                "preset": "ship",
                "loading": { "failure_policy": "block" },
                "water": { "depth_color": "#000000", "big_waves_frequency": [2.0, 3.0] }
            }"##,
        )
        .unwrap();

        assert_eq!(config.preset, ScenePreset::Ship);
        assert_eq!(config.loading.failure_policy, LoadFailurePolicy::Block);
        assert_eq!(config.loading.bar_collapse_seconds, 1.5);
        assert_eq!(config.water.depth_color, Rgb::BLACK);
        assert_eq!(config.water.big_waves_frequency, [2.0, 3.0]);
        assert_eq!(config.water.surface_color, Rgb::from_hex(0x9bd8ff));
        assert_eq!(config.camera.position, [5.0, 8.0, 8.0]);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(LagoonConfig::from_json("{ \"preset\": ").is_err());
        assert!(LagoonConfig::from_json(r#"{ "preset": "yacht" }"#).is_err());
        assert!(LagoonConfig::from_json(r#"{ "scene": { "floor_color": "beige" } }"#).is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = LagoonConfig::load_or_default(Some(Path::new("no/such/lagoon.json"))).unwrap();
        assert_eq!(config, LagoonConfig::default());
        assert_eq!(LagoonConfig::load_or_default(None).unwrap(), LagoonConfig::default());
    }

    #[test]
    fn test_inverted_polar_range_is_rejected() {
        let err = LagoonConfig::from_json(r#"{ "controls": { "min_polar_angle": 2.0, "max_polar_angle": 1.0 } }"#)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("min_polar_angle"));
    }

    #[test]
    fn test_inverted_distance_range_is_rejected() {
        let err = LagoonConfig::from_json(r#"{ "controls": { "min_distance": 30.0, "max_distance": 5.0 } }"#)
            .unwrap_err();
        assert!(format!("{:#}", err).contains("min_distance"));

        // An unbounded max keeps any min valid
        assert!(LagoonConfig::from_json(r#"{ "controls": { "min_distance": 30.0 } }"#).is_ok());
    }

    #[test]
    fn test_negative_damping_is_rejected() {
        let err = LagoonConfig::from_json(r#"{ "controls": { "damping_factor": -0.1 } }"#).unwrap_err();
        assert!(format!("{:#}", err).contains("damping_factor"));
    }

    #[test]
    fn test_non_positive_near_plane_is_rejected() {
        assert!(LagoonConfig::from_json(r#"{ "camera": { "near": 0.0 } }"#).is_err());
        assert!(LagoonConfig::from_json(r#"{ "camera": { "near": -1.0 } }"#).is_err());
        assert!(LagoonConfig::from_json(r#"{ "camera": { "near": 5.0, "far": 2.0 } }"#).is_err());
    }

    #[test]
    fn test_invalid_file_names_the_path() {
        let path = std::env::temp_dir().join(format!("lagoon-invalid-{}.json", std::process::id()));
        fs::write(&path, r#"{ "controls": { "min_polar_angle": 2.0, "max_polar_angle": 1.0 } }"#).unwrap();
        let err = LagoonConfig::load_or_default(Some(&path)).unwrap_err();
        fs::remove_file(&path).ok();
        assert!(format!("{:#}", err).contains("min_polar_angle"));
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!("lagoon-config-{}.json", std::process::id()));
        let mut config = LagoonConfig::default();
        config.show_ui = false;
        config.water.color_multiplier = 3.5;
        config.save(&path).unwrap();

        let loaded = LagoonConfig::load_or_default(Some(&path)).unwrap();
        fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
