use std::f32::consts::PI;

use anyhow::{bail, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::controller::{Button, Controller};
use crate::camera::PerspectiveCamera;

const EPS: f32 = 1e-6;

/// Orbit control tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    /// Unbounded when absent from the config file
    #[serde(skip_serializing_if = "is_unbounded")]
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
        }
    }
}

impl OrbitSettings {
    /// Reject ranges that `update` cannot clamp into
    pub fn validate(&self) -> Result<()> {
        if !(self.min_polar_angle <= self.max_polar_angle) {
            bail!(
                "min_polar_angle ({}) must not exceed max_polar_angle ({})",
                self.min_polar_angle,
                self.max_polar_angle
            );
        }
        if !(self.min_distance <= self.max_distance) {
            bail!(
                "min_distance ({}) must not exceed max_distance ({})",
                self.min_distance,
                self.max_distance
            );
        }
        if !(self.damping_factor >= 0.0 && self.damping_factor.is_finite()) {
            bail!("damping_factor must be a non-negative number, got {}", self.damping_factor);
        }
        Ok(())
    }
}

fn is_unbounded(value: &f32) -> bool {
    value.is_infinite()
}

/// Radius, azimuth (around +Y, from +Z) and polar angle (from +Y)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct Spherical {
    radius: f32,
    theta: f32,
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

/// Damped orbit controls around a target point
///
/// Input accumulates rotation, zoom and pan requests; `update` applies a
/// fraction of them each frame when damping is enabled, so motion eases out
/// after the pointer stops.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub settings: OrbitSettings,
    spherical_delta: Spherical,
    scale: f32,
    pan_offset: Vec3,
}

impl OrbitControls {
    pub fn new(target: Vec3, settings: OrbitSettings) -> Self {
        Self {
            target,
            settings,
            spherical_delta: Spherical::default(),
            scale: 1.0,
            pan_offset: Vec3::ZERO,
        }
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.phi -= angle;
    }

    /// Move toward the target; `factor > 1` zooms in
    pub fn dolly_in(&mut self, factor: f32) {
        self.scale /= factor;
    }

    pub fn dolly_out(&mut self, factor: f32) {
        self.scale *= factor;
    }

    /// Translate target and camera in the view plane
    pub fn pan(&mut self, dx: f32, dy: f32, camera: &PerspectiveCamera, viewport_height: f32) {
        let distance = (camera.position - self.target).length() * (camera.fov.to_radians() / 2.0).tan();
        let height = viewport_height.max(1.0);
        let left = -camera.right() * (2.0 * dx * distance / height);
        let up = camera.camera_up() * (2.0 * dy * distance / height);
        self.pan_offset += left + up;
    }

    /// Turn one frame of pointer input into rotate/pan/zoom requests
    pub fn apply_input(&mut self, input: &dyn Controller, camera: &PerspectiveCamera, viewport_height: f32) {
        let (dx, dy) = input.pointer_delta();
        let height = viewport_height.max(1.0);

        if input.is_down(Button::MouseRight)
            || input.is_down(Button::MouseMiddle)
            || (input.is_down(Button::MouseLeft) && input.is_down(Button::Shift))
        {
            self.pan(dx * self.settings.pan_speed, dy * self.settings.pan_speed, camera, height);
        } else if input.is_down(Button::MouseLeft) {
            self.rotate_left(2.0 * PI * dx / height * self.settings.rotate_speed);
            self.rotate_up(2.0 * PI * dy / height * self.settings.rotate_speed);
        }

        let scroll = input.scroll_delta();
        if scroll != 0.0 {
            let zoom = 0.95f32.powf(self.settings.zoom_speed);
            if scroll > 0.0 {
                self.dolly_in(1.0 / zoom);
            } else {
                self.dolly_out(1.0 / zoom);
            }
        }
    }

    /// Advance one step, moving the camera; returns whether it moved
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let s = self.settings;

        let mut spherical = Spherical::from_offset(camera.position - self.target);

        if s.enable_damping {
            spherical.theta += self.spherical_delta.theta * s.damping_factor;
            spherical.phi += self.spherical_delta.phi * s.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.theta;
            spherical.phi += self.spherical_delta.phi;
        }

        spherical.phi = spherical
            .phi
            .clamp(s.min_polar_angle, s.max_polar_angle)
            .clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale).clamp(s.min_distance, s.max_distance);

        if s.enable_damping {
            self.target += self.pan_offset * s.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        camera.position = self.target + spherical.to_offset();
        camera.look_at(self.target);

        if s.enable_damping {
            self.spherical_delta.theta *= 1.0 - s.damping_factor;
            self.spherical_delta.phi *= 1.0 - s.damping_factor;
            self.pan_offset *= 1.0 - s.damping_factor;
        } else {
            self.spherical_delta = Spherical::default();
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        camera.position.distance_squared(before) > EPS
    }
}
