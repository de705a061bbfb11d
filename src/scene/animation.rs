use anyhow::{bail, Result};
use glam::{Quat, Vec3};

use super::{NodeId, Scene};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    Step,
    Linear,
}

/// Keyframe values of one animated property
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValues {
    Translation(Vec<Vec3>),
    Rotation(Vec<Quat>),
    Scale(Vec<Vec3>),
}

impl ChannelValues {
    pub fn len(&self) -> usize {
        match self {
            ChannelValues::Translation(v) | ChannelValues::Scale(v) => v.len(),
            ChannelValues::Rotation(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Keyframed property of one node; `times` ascend
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    pub target: NodeId,
    pub times: Vec<f32>,
    pub values: ChannelValues,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationClip {
    pub name: String,
    pub channels: Vec<Channel>,
}

impl AnimationClip {
    /// Time of the last keyframe across all channels
    pub fn duration(&self) -> f32 {
        self.channels
            .iter()
            .filter_map(|c| c.times.last().copied())
            .fold(0.0, f32::max)
    }
}

/// Keyframe pair around `time` and the blend factor between them
fn locate(times: &[f32], time: f32) -> (usize, usize, f32) {
    let last = times.len() - 1;
    if last == 0 || !(time > times[0]) {
        return (0, 0, 0.0);
    }
    if time >= times[last] {
        return (last, last, 0.0);
    }
    // Clamped so unsorted or NaN times still give in-range indices
    let next = times.partition_point(|&t| t <= time).clamp(1, last);
    let prev = next - 1;
    let span = times[next] - times[prev];
    let alpha = if span > 0.0 { (time - times[prev]) / span } else { 0.0 };
    (prev, next, alpha)
}

/// Plays one clip on a scene, looping
#[derive(Debug, Clone)]
pub struct AnimationMixer {
    clip: AnimationClip,
    duration: f32,
    time: f32,
    pub time_scale: f32,
}

impl AnimationMixer {
    pub fn new(clip: AnimationClip) -> Self {
        let duration = clip.duration();
        log::info!("Playing clip {:?} ({:.2}s, {} channels)", clip.name, duration, clip.channels.len());
        Self {
            clip,
            duration,
            time: 0.0,
            time_scale: 1.0,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance by `delta` seconds and write the sampled pose into `scene`
    pub fn update(&mut self, delta: f32, scene: &mut Scene) -> Result<()> {
        self.time += delta * self.time_scale;
        if self.duration > 0.0 {
            self.time = self.time.rem_euclid(self.duration);
        }

        for channel in &self.clip.channels {
            if channel.times.is_empty() {
                continue;
            }
            if channel.times.len() != channel.values.len() {
                bail!(
                    "Channel on {:?} has {} keyframe times but {} values",
                    channel.target,
                    channel.times.len(),
                    channel.values.len()
                );
            }
            let Some(node) = scene.node_mut(channel.target) else {
                bail!("Animation targets missing node {:?}", channel.target);
            };

            let (a, b, alpha) = locate(&channel.times, self.time);
            let alpha = match channel.interpolation {
                Interpolation::Step => 0.0,
                Interpolation::Linear => alpha,
            };

            match &channel.values {
                ChannelValues::Translation(v) => node.transform.translation = v[a].lerp(v[b], alpha),
                ChannelValues::Scale(v) => node.transform.scale = v[a].lerp(v[b], alpha),
                ChannelValues::Rotation(v) => node.transform.rotation = v[a].slerp(v[b], alpha).normalize(),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    fn bob_clip(target: NodeId, interpolation: Interpolation) -> AnimationClip {
        AnimationClip {
            name: "bob".to_string(),
            channels: vec![Channel {
                target,
                times: vec![0.0, 1.0, 2.0],
                values: ChannelValues::Translation(vec![
                    Vec3::ZERO,
                    Vec3::new(0.0, 1.0, 0.0),
                    Vec3::ZERO,
                ]),
                interpolation,
            }],
        }
    }

    #[test]
    fn test_locate_keeps_indices_in_range() {
        assert_eq!(locate(&[0.0, 1.0, 2.0], 1.5), (1, 2, 0.5));
        assert_eq!(locate(&[0.0, 1.0, 2.0], -1.0), (0, 0, 0.0));
        assert_eq!(locate(&[0.0, 1.0, 2.0], 3.0), (2, 2, 0.0));
        assert_eq!(locate(&[f32::NAN, 1.0, 2.0], 0.5), (0, 0, 0.0));
        assert_eq!(locate(&[1.0], 0.5), (0, 0, 0.0));

        let (prev, next, _) = locate(&[0.0, f32::NAN, 2.0], 1.0);
        assert!(prev < next && next <= 2);
    }

    #[test]
    fn test_linear_sampling() {
        let mut scene = Scene::new();
        let ship = scene.add(Node::group("ship"));
        let mut mixer = AnimationMixer::new(bob_clip(ship, Interpolation::Linear));

        mixer.update(0.5, &mut scene).unwrap();
        let y = scene.node(ship).unwrap().transform.translation.y;
        assert!((y - 0.5).abs() < 1e-5);

        mixer.update(1.0, &mut scene).unwrap();
        let y = scene.node(ship).unwrap().transform.translation.y;
        assert!((y - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_step_holds_previous_key() {
        let mut scene = Scene::new();
        let ship = scene.add(Node::group("ship"));
        let mut mixer = AnimationMixer::new(bob_clip(ship, Interpolation::Step));

        mixer.update(1.9, &mut scene).unwrap();
        assert_eq!(scene.node(ship).unwrap().transform.translation.y, 1.0);
    }

    #[test]
    fn test_clip_loops() {
        let mut scene = Scene::new();
        let ship = scene.add(Node::group("ship"));
        let mut mixer = AnimationMixer::new(bob_clip(ship, Interpolation::Linear));

        mixer.update(2.25, &mut scene).unwrap();
        assert!((mixer.time() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_rotation_slerp() {
        let mut scene = Scene::new();
        let node = scene.add(Node::group("spin"));
        let clip = AnimationClip {
            name: "spin".to_string(),
            channels: vec![Channel {
                target: node,
                times: vec![0.0, 1.0],
                values: ChannelValues::Rotation(vec![
                    Quat::IDENTITY,
                    Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
                ]),
                interpolation: Interpolation::Linear,
            }],
        };
        let mut mixer = AnimationMixer::new(clip);
        mixer.update(0.5, &mut scene).unwrap();

        let rotation = scene.node(node).unwrap().transform.rotation;
        assert!(rotation.angle_between(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4)) < 1e-4);
    }

    #[test]
    fn test_missing_target_is_an_error() {
        let mut scene = Scene::new();
        let ship = scene.add(Node::group("ship"));
        let mut mixer = AnimationMixer::new(bob_clip(ship, Interpolation::Linear));

        let mut empty = Scene::new();
        assert!(mixer.update(0.1, &mut empty).is_err());
    }
}
