use anyhow::{anyhow, Result};
use glam::Vec3;

use crate::loaders::{ClipData, ModelData};
use crate::scene::{AnimationClip, Channel, Material, Node, NodeId, Scene, Transform};

/// Where a model landed in the scene
#[derive(Debug, Clone)]
pub struct AttachedModel {
    /// Group holding the model, carries the preset scale
    pub root: NodeId,
    /// Scene node for each glTF node index, `None` if not reachable from the scene roots
    pub bindings: Vec<Option<NodeId>>,
}

/// Copy a loaded model under a new scaled group at the scene root
pub fn attach_model(scene: &mut Scene, model: &ModelData, name: &str, scale: f32) -> AttachedModel {
    let root = scene.add(Node::group(name).with_transform(Transform::IDENTITY.with_scale(Vec3::splat(scale))));
    let mut bindings = vec![None; model.nodes.len()];
    let mut handles = Vec::with_capacity(model.meshes.len());
    for primitives in &model.meshes {
        handles.push(
            primitives
                .iter()
                .map(|p| (scene.add_mesh(p.mesh.clone()), p.base_color))
                .collect::<Vec<_>>(),
        );
    }

    let mut stack: Vec<(usize, NodeId)> = model.roots.iter().rev().map(|&i| (i, root)).collect();
    while let Some((index, parent)) = stack.pop() {
        let Some(source) = model.nodes.get(index) else {
            log::warn!("glTF scene references missing node {}", index);
            continue;
        };
        if bindings[index].is_some() {
            log::warn!("glTF node {} appears twice in the hierarchy, keeping the first", index);
            continue;
        }

        let id = scene.add_child(parent, Node::group(source.name.clone()).with_transform(source.transform));
        bindings[index] = Some(id);

        if let Some(primitives) = source.mesh.and_then(|m| handles.get(m)) {
            for (i, &(mesh, color)) in primitives.iter().enumerate() {
                scene.add_child(
                    id,
                    Node::mesh(format!("{}#{}", source.name, i), mesh, Material::Lambert { color }),
                );
            }
        }

        stack.extend(source.children.iter().rev().map(|&child| (child, id)));
    }

    AttachedModel { root, bindings }
}

/// Retarget a loaded clip onto the scene nodes created by `attach_model`
pub fn bind_clip(clip: &ClipData, model: &AttachedModel) -> Result<AnimationClip> {
    let channels = clip
        .channels
        .iter()
        .map(|channel| {
            let target = model
                .bindings
                .get(channel.node)
                .copied()
                .flatten()
                .ok_or_else(|| anyhow!("Clip {:?} animates unbound node {}", clip.name, channel.node))?;
            Ok(Channel {
                target,
                times: channel.times.clone(),
                values: channel.values.clone(),
                interpolation: channel.interpolation,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(AnimationClip {
        name: clip.name.clone(),
        channels,
    })
}
