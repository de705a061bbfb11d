use anyhow::{Context, Result};
use glam::{Quat, Vec3};
use std::path::Path;

use crate::geometry::MeshData;
use crate::math::Rgb;
use crate::scene::{ChannelValues, Interpolation, Transform};

/// One drawable piece of a glTF mesh
#[derive(Debug, Clone)]
pub struct ModelPrimitive {
    pub mesh: MeshData,
    /// Material base color factor, alpha dropped
    pub base_color: Rgb,
}

#[derive(Debug, Clone)]
pub struct ModelNode {
    pub name: String,
    pub transform: Transform,
    /// Index into `ModelData::meshes`
    pub mesh: Option<usize>,
    pub children: Vec<usize>,
}

/// Animation channel addressed by glTF node index
#[derive(Debug, Clone)]
pub struct ChannelData {
    pub node: usize,
    pub times: Vec<f32>,
    pub values: ChannelValues,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone)]
pub struct ClipData {
    pub name: String,
    pub channels: Vec<ChannelData>,
}

/// Everything the scene needs from a glTF asset
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    /// All nodes of the document, by glTF node index
    pub nodes: Vec<ModelNode>,
    /// Top-level nodes of the default scene
    pub roots: Vec<usize>,
    /// Primitives grouped per glTF mesh
    pub meshes: Vec<Vec<ModelPrimitive>>,
    pub animations: Vec<ClipData>,
}

impl ModelData {
    pub fn primitive_count(&self) -> usize {
        self.meshes.iter().map(Vec::len).sum()
    }
}

/// Loads a glTF file (and its external buffers) from disk
pub fn load_model(path: impl AsRef<Path>) -> Result<ModelData> {
    let path = path.as_ref();
    log::debug!("Loading glTF file: {:?}", path);

    let (document, buffers, _images) =
        gltf::import(path).context(format!("Failed to load glTF file: {:?}", path))?;

    let model = convert(&document, &buffers)?;
    log::info!(
        "glTF loaded: {:?} ({} nodes, {} primitives, {} animations)",
        path,
        model.nodes.len(),
        model.primitive_count(),
        model.animations.len()
    );
    Ok(model)
}

/// Parses a self-contained glTF or GLB from memory
pub fn parse_model(bytes: &[u8]) -> Result<ModelData> {
    let (document, buffers, _images) = gltf::import_slice(bytes).context("Failed to parse glTF data")?;
    convert(&document, &buffers)
}

fn convert(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> Result<ModelData> {
    let meshes = document
        .meshes()
        .map(|mesh| read_mesh(&mesh, buffers))
        .collect::<Result<Vec<_>>>()?;

    let nodes = document
        .nodes()
        .map(|node| {
            let (translation, rotation, scale) = node.transform().decomposed();
            ModelNode {
                name: node.name().unwrap_or("node").to_string(),
                transform: Transform {
                    translation: Vec3::from_array(translation),
                    rotation: Quat::from_array(rotation),
                    scale: Vec3::from_array(scale),
                },
                mesh: node.mesh().map(|m| m.index()),
                children: node.children().map(|c| c.index()).collect(),
            }
        })
        .collect();

    let roots = match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => scene.nodes().map(|n| n.index()).collect(),
        None => {
            log::warn!("glTF has no scene, nothing will be shown");
            Vec::new()
        }
    };

    let animations = document
        .animations()
        .map(|animation| read_animation(&animation, buffers))
        .collect();

    Ok(ModelData {
        nodes,
        roots,
        meshes,
        animations,
    })
}

fn read_mesh(mesh: &gltf::Mesh, buffers: &[gltf::buffer::Data]) -> Result<Vec<ModelPrimitive>> {
    let mut primitives = Vec::new();

    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!("Skipping {:?} primitive in mesh {:?}", primitive.mode(), mesh.name());
            continue;
        }

        let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .context(format!("Mesh {:?} primitive has no positions", mesh.name()))?
            .collect();

        if positions.is_empty() {
            continue;
        }

        let indices: Vec<u32> = match reader.read_indices() {
            Some(indices) => indices.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };

        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|t| t.into_f32().collect())
            .unwrap_or_default();

        let mut data = MeshData {
            positions,
            normals: Vec::new(),
            uvs,
            indices,
        };
        match reader.read_normals() {
            Some(normals) => data.normals = normals.collect(),
            None => data.compute_normals(),
        }

        let [r, g, b, _a] = primitive.material().pbr_metallic_roughness().base_color_factor();
        primitives.push(ModelPrimitive {
            mesh: data,
            base_color: Rgb::from_linear([r, g, b]),
        });
    }

    Ok(primitives)
}

fn read_animation(animation: &gltf::Animation, buffers: &[gltf::buffer::Data]) -> ClipData {
    use gltf::animation::util::ReadOutputs;

    let mut channels = Vec::new();

    for channel in animation.channels() {
        let reader = channel.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));
        let node = channel.target().node().index();

        let Some(inputs) = reader.read_inputs() else {
            log::warn!("Animation channel on node {} has no keyframe times", node);
            continue;
        };
        let times: Vec<f32> = inputs.collect();
        if !ascending_times(&times) {
            log::warn!("Animation channel on node {} has non-finite or unordered keyframe times", node);
            continue;
        }

        let (interpolation, cubic) = match channel.sampler().interpolation() {
            gltf::animation::Interpolation::Step => (Interpolation::Step, false),
            gltf::animation::Interpolation::Linear => (Interpolation::Linear, false),
            gltf::animation::Interpolation::CubicSpline => (Interpolation::Linear, true),
        };

        let values = match reader.read_outputs() {
            Some(ReadOutputs::Translations(v)) => {
                ChannelValues::Translation(keyframes(v.map(Vec3::from_array).collect(), cubic))
            }
            Some(ReadOutputs::Scales(v)) => {
                ChannelValues::Scale(keyframes(v.map(Vec3::from_array).collect(), cubic))
            }
            Some(ReadOutputs::Rotations(v)) => {
                ChannelValues::Rotation(keyframes(v.into_f32().map(Quat::from_array).collect(), cubic))
            }
            Some(ReadOutputs::MorphTargetWeights(_)) => {
                log::debug!("Skipping morph target channel on node {}", node);
                continue;
            }
            None => {
                log::warn!("Animation channel on node {} has no values", node);
                continue;
            }
        };

        channels.push(ChannelData {
            node,
            times,
            values,
            interpolation,
        });
    }

    ClipData {
        name: animation.name().unwrap_or("animation").to_string(),
        channels,
    }
}

/// Keyframe times must be finite and strictly increasing
fn ascending_times(times: &[f32]) -> bool {
    times.iter().all(|t| t.is_finite()) && times.windows(2).all(|pair| pair[0] < pair[1])
}

/// Cubic-spline outputs come as (in-tangent, value, out-tangent) triplets; keep the values
fn keyframes<T: Copy>(values: Vec<T>, cubic: bool) -> Vec<T> {
    if cubic {
        values.chunks_exact(3).map(|triplet| triplet[1]).collect()
    } else {
        values
    }
}
