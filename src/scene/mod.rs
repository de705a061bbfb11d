pub mod animation;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::geometry::MeshData;
use crate::math::Rgb;

pub use animation::{AnimationClip, AnimationMixer, Channel, ChannelValues, Interpolation};

/// Index of a node in its scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of uploaded-once geometry in its scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(usize);

impl MeshHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Local translation, rotation and scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }
}

/// Surface shading for a mesh node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Unlit flat color
    Basic { color: Rgb },
    /// Diffuse-lit flat color
    Lambert { color: Rgb },
    /// Animated water surface driven by the water uniforms
    Water,
    /// Full-screen black quad faded by `uAlpha`
    Overlay,
}

impl Material {
    pub fn is_transparent(&self) -> bool {
        matches!(self, Material::Overlay)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Ambient {
        color: Rgb,
        intensity: f32,
    },
    /// Parallel light shining from the node position toward `target`
    Directional {
        color: Rgb,
        intensity: f32,
        target: Vec3,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Group,
    Mesh { mesh: MeshHandle, material: Material },
    Light(Light),
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            transform: Transform::IDENTITY,
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::with_kind(name, NodeKind::Group)
    }

    pub fn mesh(name: impl Into<String>, mesh: MeshHandle, material: Material) -> Self {
        Self::with_kind(name, NodeKind::Mesh { mesh, material })
    }

    pub fn light(name: impl Into<String>, light: Light) -> Self {
        Self::with_kind(name, NodeKind::Light(light))
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Linear distance fog
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fog {
    pub color: Rgb,
    pub near: f32,
    pub far: f32,
}

/// One mesh ready to draw, with its resolved world matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawable {
    pub node: NodeId,
    pub mesh: MeshHandle,
    pub material: Material,
    pub world: Mat4,
}

/// Light contribution in linear RGB, folded to one ambient and one directional term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lighting {
    pub ambient: Vec3,
    pub directional: Vec3,
    /// Unit vector pointing from the surface toward the light
    pub direction: Vec3,
}

/// Node arena plus the geometry the nodes reference
///
/// Nodes are only ever appended; ids stay valid for the scene's lifetime.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    meshes: Vec<MeshData>,
    pub fog: Option<Fog>,
    pub background: Rgb,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            meshes: Vec::new(),
            fog: None,
            background: Rgb::BLACK,
        }
    }

    pub fn add_mesh(&mut self, mesh: MeshData) -> MeshHandle {
        self.meshes.push(mesh);
        MeshHandle(self.meshes.len() - 1)
    }

    pub fn mesh(&self, handle: MeshHandle) -> Option<&MeshData> {
        self.meshes.get(handle.0)
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    /// Add a top-level node
    pub fn add(&mut self, node: Node) -> NodeId {
        let id = self.push(node, None);
        self.roots.push(id);
        id
    }

    /// Add `node` under `parent`; an unknown parent makes it a root
    pub fn add_child(&mut self, parent: NodeId, node: Node) -> NodeId {
        if parent.0 >= self.nodes.len() {
            log::warn!("Parent {:?} does not exist, adding {:?} at the root", parent, node.name);
            return self.add(node);
        }
        let id = self.push(node, Some(parent));
        self.nodes[parent.0].children.push(id);
        id
    }

    fn push(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        node.parent = parent;
        node.children.clear();
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.name == name).map(NodeId)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// World matrix of every node, indexed by node id
    pub fn world_matrices(&self) -> Vec<Mat4> {
        // Parents always precede their children in the arena
        let mut world = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let local = node.transform.matrix();
            let m = match node.parent {
                Some(parent) => world[parent.0] * local,
                None => local,
            };
            world.push(m);
        }
        world
    }

    fn is_visible(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(id) = current {
            let node = &self.nodes[id.0];
            if !node.visible {
                return false;
            }
            current = node.parent;
        }
        true
    }

    /// Visible meshes in draw order, transparent ones last
    pub fn drawables(&self) -> Vec<Drawable> {
        let world = self.world_matrices();
        let mut out: Vec<Drawable> = self
            .iter()
            .filter_map(|(id, node)| match node.kind {
                NodeKind::Mesh { mesh, material } if self.is_visible(id) => Some(Drawable {
                    node: id,
                    mesh,
                    material,
                    world: world[id.0],
                }),
                _ => None,
            })
            .collect();
        out.sort_by_key(|d| d.material.is_transparent());
        out
    }

    pub fn lighting(&self) -> Lighting {
        let world = self.world_matrices();
        let mut lighting = Lighting {
            ambient: Vec3::ZERO,
            directional: Vec3::ZERO,
            direction: Vec3::Y,
        };
        let mut have_directional = false;

        for (id, node) in self.iter() {
            let NodeKind::Light(light) = node.kind else {
                continue;
            };
            if !self.is_visible(id) {
                continue;
            }
            match light {
                Light::Ambient { color, intensity } => {
                    lighting.ambient += Vec3::from_array(color.to_linear()) * intensity;
                }
                Light::Directional {
                    color,
                    intensity,
                    target,
                } => {
                    if have_directional {
                        log::debug!("Only the first directional light is used, skipping {:?}", node.name);
                        continue;
                    }
                    let position = world[id.0].w_axis.truncate();
                    lighting.directional = Vec3::from_array(color.to_linear()) * intensity;
                    lighting.direction = (position - target).try_normalize().unwrap_or(Vec3::Y);
                    have_directional = true;
                }
            }
        }
        lighting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::plane;

    #[test]
    fn test_child_inherits_parent_transform() {
        let mut scene = Scene::new();
        let parent = scene.add(
            Node::group("model").with_transform(Transform::IDENTITY.with_scale(Vec3::splat(5.0))),
        );
        let child = scene.add_child(
            parent,
            Node::group("leaf").with_transform(Transform::from_translation(Vec3::new(1.0, 0.0, 0.0))),
        );

        let world = scene.world_matrices();
        let p = world[child.index()].transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(5.0, 0.0, 0.0)).length() < 1e-5);
        assert_eq!(scene.node(child).and_then(|n| n.parent()), Some(parent));
        assert_eq!(scene.node(parent).map(|n| n.children().to_vec()), Some(vec![child]));
        assert_eq!(scene.roots(), &[parent]);
    }

    #[test]
    fn test_overlay_draws_last_and_hidden_nodes_skip() {
        let mut scene = Scene::new();
        let quad = scene.add_mesh(plane(2.0, 2.0, 1, 1));
        scene.add(Node::mesh("overlay", quad, Material::Overlay));
        let water = scene.add(Node::mesh("water", quad, Material::Water));
        let hidden = scene.add(Node::group("hidden"));
        scene.add_child(hidden, Node::mesh("floor", quad, Material::Basic { color: Rgb::WHITE }));
        scene.node_mut(hidden).unwrap().visible = false;

        let drawables = scene.drawables();
        assert_eq!(drawables.len(), 2);
        assert_eq!(drawables[0].node, water);
        assert_eq!(drawables[1].material, Material::Overlay);
    }

    #[test]
    fn test_lighting_summary() {
        let mut scene = Scene::new();
        scene.add(Node::light(
            "ambient",
            Light::Ambient {
                color: Rgb::WHITE,
                intensity: 2.0,
            },
        ));
        scene.add(
            Node::light(
                "sun",
                Light::Directional {
                    color: Rgb::WHITE,
                    intensity: 0.6,
                    target: Vec3::ZERO,
                },
            )
            .with_transform(Transform::from_translation(Vec3::new(5.0, 5.0, 5.0))),
        );

        let lighting = scene.lighting();
        assert!((lighting.ambient - Vec3::splat(2.0)).length() < 1e-5);
        assert!((lighting.directional - Vec3::splat(0.6)).length() < 1e-5);
        assert!((lighting.direction - Vec3::ONE.normalize()).length() < 1e-5);
    }

    #[test]
    fn test_unknown_parent_falls_back_to_root() {
        let mut scene = Scene::new();
        let id = scene.add_child(NodeId(42), Node::group("orphan"));
        assert_eq!(scene.roots(), &[id]);
        assert_eq!(scene.find("orphan"), Some(id));
    }
}
