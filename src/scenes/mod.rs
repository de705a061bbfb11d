mod common;
mod model;

pub use model::{attach_model, bind_clip, AttachedModel};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::camera::PerspectiveCamera;
use crate::config::LagoonConfig;
use crate::core::OrbitControls;
use crate::math::Rgb;
use crate::scene::{Fog, NodeId, Scene};
use crate::uniforms::{overlay_uniforms, water_uniforms, UniformSet};

/// The two demos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScenePreset {
    /// Coconut palm on a sand disc
    #[default]
    Palm,
    /// Animated pirate ship in light fog
    Ship,
}

impl ScenePreset {
    pub fn name(self) -> &'static str {
        match self {
            ScenePreset::Palm => "palm",
            ScenePreset::Ship => "ship",
        }
    }

    pub fn model_url(self) -> &'static str {
        match self {
            ScenePreset::Palm => "/models/coconut_palm/scene.gltf",
            ScenePreset::Ship => "/models/pirate_ship/scene.gltf",
        }
    }

    pub fn model_scale(self) -> f32 {
        match self {
            ScenePreset::Palm => 5.0,
            ScenePreset::Ship => 1.0,
        }
    }

    /// Whether the model's first clip is played
    pub fn plays_animation(self) -> bool {
        matches!(self, ScenePreset::Ship)
    }

    pub fn fog(self) -> Option<Fog> {
        match self {
            ScenePreset::Palm => None,
            ScenePreset::Ship => Some(Fog {
                color: Rgb::from_hex(0x8fb9d6),
                near: 10.0,
                far: 50.0,
            }),
        }
    }
}

/// Node ids of the fixed scene parts
#[derive(Debug, Clone, Copy)]
pub struct SceneHandles {
    pub floor: NodeId,
    pub water: NodeId,
    pub ambient: NodeId,
    pub directional: NodeId,
    pub overlay: NodeId,
}

/// Static world for a preset, before any model has loaded
pub struct ComposedScene {
    pub scene: Scene,
    pub camera: PerspectiveCamera,
    pub controls: OrbitControls,
    pub water: UniformSet,
    pub overlay: UniformSet,
    pub handles: SceneHandles,
}

/// Build the floor, water, lights, fog, camera, controls and overlay
pub fn compose(preset: ScenePreset, config: &LagoonConfig, aspect: f32) -> ComposedScene {
    let mut scene = Scene::new();

    let floor = common::floor(&mut scene, config.scene.floor_color);
    let water = common::water(&mut scene);
    let (ambient, directional) = common::lights(&mut scene);
    let overlay = common::overlay(&mut scene);

    scene.fog = config.scene.fog.or_else(|| preset.fog());
    if let Some(fog) = scene.fog {
        scene.background = fog.color;
    }

    let c = &config.camera;
    let mut camera = PerspectiveCamera::new(c.fov, aspect, c.near, c.far);
    camera.position = Vec3::from_array(c.position);
    let target = Vec3::from_array(c.target);
    camera.look_at(target);

    log::debug!("Composed {} scene with {} nodes", preset.name(), scene.len());

    ComposedScene {
        scene,
        camera,
        controls: OrbitControls::new(target, config.controls),
        water: water_uniforms(&config.water),
        overlay: overlay_uniforms(1.0),
        handles: SceneHandles {
            floor,
            water,
            ambient,
            directional,
            overlay,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Material, NodeKind};
    use crate::uniforms::{ALPHA, TIME};

    #[test]
    fn test_palm_composition() {
        let composed = compose(ScenePreset::Palm, &LagoonConfig::default(), 16.0 / 9.0);
        let scene = &composed.scene;

        let world = scene.world_matrices();
        let water_y = world[composed.handles.water.index()].w_axis.y;
        assert_eq!(water_y, -1.0);

        // Floor lies flat: its +Z normal now points up
        let up = world[composed.handles.floor.index()].transform_vector3(Vec3::Z);
        assert!((up - Vec3::Y).length() < 1e-5);

        match scene.node(composed.handles.floor).unwrap().kind {
            NodeKind::Mesh { material, .. } => assert_eq!(
                material,
                Material::Basic {
                    color: Rgb::from_hex(0xba9a88)
                }
            ),
            other => panic!("floor is {:?}", other),
        }

        assert!(scene.fog.is_none());
        assert_eq!(composed.camera.position, Vec3::new(5.0, 8.0, 8.0));
        assert_eq!(composed.controls.target, Vec3::new(0.0, 0.75, 0.0));
        assert_eq!(composed.overlay.float(ALPHA), Ok(1.0));
        assert_eq!(composed.water.float(TIME), Ok(0.0));
        assert_eq!(scene.drawables().last().map(|d| d.node), Some(composed.handles.overlay));
    }

    #[test]
    fn test_ship_has_fog_unless_overridden() {
        let mut config = LagoonConfig::default();
        let composed = compose(ScenePreset::Ship, &config, 1.0);
        assert_eq!(composed.scene.fog, ScenePreset::Ship.fog());

        let custom = Fog {
            color: Rgb::WHITE,
            near: 1.0,
            far: 2.0,
        };
        config.scene.fog = Some(custom);
        let composed = compose(ScenePreset::Palm, &config, 1.0);
        assert_eq!(composed.scene.fog, Some(custom));
        assert_eq!(composed.scene.background, Rgb::WHITE);
    }

    #[test]
    fn test_preset_assets() {
        assert_eq!(ScenePreset::Palm.model_url(), "/models/coconut_palm/scene.gltf");
        assert_eq!(ScenePreset::Palm.model_scale(), 5.0);
        assert!(!ScenePreset::Palm.plays_animation());
        assert_eq!(ScenePreset::Ship.model_url(), "/models/pirate_ship/scene.gltf");
        assert!(ScenePreset::Ship.plays_animation());
    }
}
