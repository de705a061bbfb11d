use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::math::Rgb;

pub const BIG_WAVES_ELEVATION: &str = "uBigWavesElevation";
pub const BIG_WAVES_FREQUENCY: &str = "uBigWavesFrequency";
pub const BIG_WAVES_SPEED: &str = "uBigWavesSpeed";
pub const SMALL_WAVES_ELEVATION: &str = "uSmallWavesElevation";
pub const SMALL_WAVES_FREQUENCY: &str = "uSmallWavesFrequency";
pub const SMALL_WAVES_SPEED: &str = "uSmallWavesSpeed";
pub const SMALL_ITERATIONS: &str = "uSmallIterations";
pub const DEPTH_COLOR: &str = "uDepthColor";
pub const SURFACE_COLOR: &str = "uSurfaceColor";
pub const COLOR_OFFSET: &str = "uColorOffset";
pub const COLOR_MULTIPLIER: &str = "uColorMultiplier";
pub const TIME: &str = "uTime";
pub const ALPHA: &str = "uAlpha";

/// Initial water shader parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterSettings {
    pub big_waves_elevation: f32,
    pub big_waves_frequency: [f32; 2],
    pub big_waves_speed: f32,
    pub small_waves_elevation: f32,
    pub small_waves_frequency: f32,
    pub small_waves_speed: f32,
    pub small_iterations: f32,
    pub depth_color: Rgb,
    pub surface_color: Rgb,
    pub color_offset: f32,
    pub color_multiplier: f32,
}

impl Default for WaterSettings {
    fn default() -> Self {
        Self {
            big_waves_elevation: 0.2,
            big_waves_frequency: [4.0, 1.5],
            big_waves_speed: 0.75,
            small_waves_elevation: 0.15,
            small_waves_frequency: 3.0,
            small_waves_speed: 0.2,
            small_iterations: 4.0,
            depth_color: Rgb::from_hex(0x186691),
            surface_color: Rgb::from_hex(0x9bd8ff),
            color_offset: 0.08,
            color_multiplier: 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformKind {
    Float,
    Vec2,
    Color,
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformKind::Float => write!(f, "float"),
            UniformKind::Vec2 => write!(f, "vec2"),
            UniformKind::Color => write!(f, "color"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Vec2(Vec2),
    Color(Rgb),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Color(_) => UniformKind::Color,
        }
    }
}

/// Error types for uniform lookups and writes.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformError {
    Unknown(String),
    KindMismatch {
        name: String,
        expected: UniformKind,
        found: UniformKind,
    },
}

impl fmt::Display for UniformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniformError::Unknown(name) => write!(f, "Unknown uniform {}", name),
            UniformError::KindMismatch {
                name,
                expected,
                found,
            } => write!(f, "Uniform {} holds a {}, got a {}", name, expected, found),
        }
    }
}

impl std::error::Error for UniformError {}

/// Fixed set of named shader parameters
///
/// Names and kinds are fixed at construction. Writes must target an
/// existing name with a value of the same kind.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSet {
    label: &'static str,
    entries: Vec<(&'static str, UniformValue)>,
}

impl UniformSet {
    pub fn new(label: &'static str, entries: Vec<(&'static str, UniformValue)>) -> Self {
        Self { label, entries }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| *n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &UniformValue)> {
        self.entries.iter().map(|(n, v)| (*n, v))
    }

    pub fn get(&self, name: &str) -> Result<&UniformValue, UniformError> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| UniformError::Unknown(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut UniformValue, UniformError> {
        self.entries
            .iter_mut()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| UniformError::Unknown(name.to_string()))
    }

    /// Replace a value, keeping its kind
    pub fn set(&mut self, name: &str, value: UniformValue) -> Result<(), UniformError> {
        let slot = self.get_mut(name)?;
        if slot.kind() != value.kind() {
            return Err(mismatch(name, slot.kind(), value.kind()));
        }
        *slot = value;
        Ok(())
    }

    pub fn set_float(&mut self, name: &str, value: f32) -> Result<(), UniformError> {
        self.set(name, UniformValue::Float(value))
    }

    pub fn float(&self, name: &str) -> Result<f32, UniformError> {
        match self.get(name)? {
            UniformValue::Float(v) => Ok(*v),
            other => Err(mismatch(name, UniformKind::Float, other.kind())),
        }
    }

    pub fn vec2(&self, name: &str) -> Result<Vec2, UniformError> {
        match self.get(name)? {
            UniformValue::Vec2(v) => Ok(*v),
            other => Err(mismatch(name, UniformKind::Vec2, other.kind())),
        }
    }

    pub fn color(&self, name: &str) -> Result<Rgb, UniformError> {
        match self.get(name)? {
            UniformValue::Color(v) => Ok(*v),
            other => Err(mismatch(name, UniformKind::Color, other.kind())),
        }
    }

    /// In-place access for GUI widgets that edit a float directly
    pub fn float_mut(&mut self, name: &str) -> Result<&mut f32, UniformError> {
        match self.get_mut(name)? {
            UniformValue::Float(v) => Ok(v),
            other => Err(mismatch(name, UniformKind::Float, other.kind())),
        }
    }

    pub fn vec2_mut(&mut self, name: &str) -> Result<&mut Vec2, UniformError> {
        match self.get_mut(name)? {
            UniformValue::Vec2(v) => Ok(v),
            other => Err(mismatch(name, UniformKind::Vec2, other.kind())),
        }
    }

    pub fn color_mut(&mut self, name: &str) -> Result<&mut [f32; 3], UniformError> {
        match self.get_mut(name)? {
            UniformValue::Color(v) => Ok(&mut v.0),
            other => Err(mismatch(name, UniformKind::Color, other.kind())),
        }
    }
}

fn mismatch(name: &str, expected: UniformKind, found: UniformKind) -> UniformError {
    UniformError::KindMismatch {
        name: name.to_string(),
        expected,
        found,
    }
}

/// Water shader parameters with `uTime` at zero
pub fn water_uniforms(settings: &WaterSettings) -> UniformSet {
    UniformSet::new(
        "water",
        vec![
            (BIG_WAVES_ELEVATION, UniformValue::Float(settings.big_waves_elevation)),
            (
                BIG_WAVES_FREQUENCY,
                UniformValue::Vec2(Vec2::from_array(settings.big_waves_frequency)),
            ),
            (BIG_WAVES_SPEED, UniformValue::Float(settings.big_waves_speed)),
            (SMALL_WAVES_ELEVATION, UniformValue::Float(settings.small_waves_elevation)),
            (SMALL_WAVES_FREQUENCY, UniformValue::Float(settings.small_waves_frequency)),
            (SMALL_WAVES_SPEED, UniformValue::Float(settings.small_waves_speed)),
            (SMALL_ITERATIONS, UniformValue::Float(settings.small_iterations)),
            (DEPTH_COLOR, UniformValue::Color(settings.depth_color)),
            (SURFACE_COLOR, UniformValue::Color(settings.surface_color)),
            (COLOR_OFFSET, UniformValue::Float(settings.color_offset)),
            (COLOR_MULTIPLIER, UniformValue::Float(settings.color_multiplier)),
            (TIME, UniformValue::Float(0.0)),
        ],
    )
}

pub fn overlay_uniforms(alpha: f32) -> UniformSet {
    UniformSet::new("overlay", vec![(ALPHA, UniformValue::Float(alpha))])
}

/// GPU layout of the water uniform block (80 bytes, matches water.wgsl)
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct WaterGpu {
    pub big_waves_frequency: [f32; 2],
    pub big_waves_elevation: f32,
    pub big_waves_speed: f32,
    pub small_waves_elevation: f32,
    pub small_waves_frequency: f32,
    pub small_waves_speed: f32,
    pub small_iterations: f32,
    pub depth_color: [f32; 3],
    pub color_offset: f32,
    pub surface_color: [f32; 3],
    pub color_multiplier: f32,
    pub time: f32,
    pub _padding: [f32; 3],
}

impl WaterGpu {
    /// Colors are converted to linear light here, the shader mixes in linear space
    pub fn pack(set: &UniformSet) -> Result<Self, UniformError> {
        Ok(Self {
            big_waves_frequency: set.vec2(BIG_WAVES_FREQUENCY)?.to_array(),
            big_waves_elevation: set.float(BIG_WAVES_ELEVATION)?,
            big_waves_speed: set.float(BIG_WAVES_SPEED)?,
            small_waves_elevation: set.float(SMALL_WAVES_ELEVATION)?,
            small_waves_frequency: set.float(SMALL_WAVES_FREQUENCY)?,
            small_waves_speed: set.float(SMALL_WAVES_SPEED)?,
            small_iterations: set.float(SMALL_ITERATIONS)?,
            depth_color: set.color(DEPTH_COLOR)?.to_linear(),
            color_offset: set.float(COLOR_OFFSET)?,
            surface_color: set.color(SURFACE_COLOR)?.to_linear(),
            color_multiplier: set.float(COLOR_MULTIPLIER)?,
            time: set.float(TIME)?,
            _padding: [0.0; 3],
        })
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct OverlayGpu {
    pub alpha: f32,
    pub _padding: [f32; 3],
}

impl OverlayGpu {
    pub fn pack(set: &UniformSet) -> Result<Self, UniformError> {
        Ok(Self {
            alpha: set.float(ALPHA)?,
            _padding: [0.0; 3],
        })
    }
}
