use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use crate::geometry::{circle, plane};
use crate::math::Rgb;
use crate::scene::{Light, Material, Node, NodeId, Scene, Transform};

/// Lay a mesh built in the XY plane flat on the ground
fn flat(y: f32) -> Transform {
    Transform::from_translation(Vec3::new(0.0, y, 0.0)).with_rotation(Quat::from_rotation_x(-FRAC_PI_2))
}

/// Sand disc under the model
pub fn floor(scene: &mut Scene, color: Rgb) -> NodeId {
    let mesh = scene.add_mesh(circle(4.0, 16));
    scene.add(Node::mesh("floor", mesh, Material::Basic { color }).with_transform(flat(0.0)))
}

/// Finely subdivided plane displaced by the water shader
pub fn water(scene: &mut Scene) -> NodeId {
    let mesh = scene.add_mesh(plane(60.0, 60.0, 128, 128));
    scene.add(Node::mesh("water", mesh, Material::Water).with_transform(flat(-1.0)))
}

pub fn lights(scene: &mut Scene) -> (NodeId, NodeId) {
    let ambient = scene.add(Node::light(
        "ambient",
        Light::Ambient {
            color: Rgb::WHITE,
            intensity: 2.0,
        },
    ));
    let sun = scene.add(
        Node::light(
            "directional",
            Light::Directional {
                color: Rgb::WHITE,
                intensity: 0.6,
                target: Vec3::ZERO,
            },
        )
        .with_transform(Transform::from_translation(Vec3::new(5.0, 5.0, 5.0))),
    );
    (ambient, sun)
}

/// Clip-space quad covering the screen; its vertices bypass the camera
pub fn overlay(scene: &mut Scene) -> NodeId {
    let mesh = scene.add_mesh(plane(2.0, 2.0, 1, 1));
    scene.add(Node::mesh("overlay", mesh, Material::Overlay))
}
