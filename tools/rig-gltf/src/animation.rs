//! Animation clips against a skeleton

use gltf::json;
use hashbrown::{HashMap, HashSet};
use json::animation::{Channel, Interpolation, Property, Sampler, Target};
use json::validation::Checked::Valid;
use json::Index;
use rig_common::{Animation, Track};

use crate::error::{ConvertError, Result};
use crate::scene::SceneBuilder;
use crate::skeleton::unit_rotation;

/// An animation and the clip name it is exported under
#[derive(Debug, Clone, PartialEq)]
pub struct NamedAnimation {
    pub name: String,
    pub animation: Animation,
}

impl NamedAnimation {
    pub fn new(name: impl Into<String>, animation: Animation) -> Self {
        Self {
            name: name.into(),
            animation,
        }
    }
}

/// Track joints absent from the skeleton, each listed once in file order
pub(crate) fn missing_joints(animation: &Animation, lookup: &HashMap<&str, usize>) -> Vec<String> {
    let mut seen = HashSet::new();
    animation
        .tracks
        .iter()
        .map(|t| t.joint.as_str())
        .filter(|name| !lookup.contains_key(name) && seen.insert(*name))
        .map(str::to_string)
        .collect()
}

fn validate_times(clip: &str, track: &Track) -> Result<Vec<f32>> {
    let times: Vec<f32> = track.keyframes.iter().map(|k| k.time).collect();
    if let Some(bad) = times.iter().find(|t| !t.is_finite() || **t < 0.0) {
        return Err(ConvertError::validation(format!(
            "Animation '{}' track '{}' has invalid keyframe time {}",
            clip, track.joint, bad
        )));
    }
    if let Some(pair) = times.windows(2).find(|pair| pair[1] <= pair[0]) {
        return Err(ConvertError::validation(format!(
            "Animation '{}' track '{}' keyframe times are not increasing ({} then {})",
            clip, track.joint, pair[0], pair[1]
        )));
    }
    Ok(times)
}

fn channel(sampler: usize, node: Index<json::Node>, path: Property) -> Channel {
    Channel {
        sampler: Index::new(sampler as u32),
        target: Target {
            node,
            path: Valid(path),
            extensions: Default::default(),
            extras: Default::default(),
        },
        extensions: Default::default(),
        extras: Default::default(),
    }
}

fn linear_sampler(input: Index<json::Accessor>, output: Index<json::Accessor>) -> Sampler {
    Sampler {
        input,
        interpolation: Valid(Interpolation::Linear),
        output,
        extensions: Default::default(),
        extras: Default::default(),
    }
}

/// Add one clip; tracks for unknown joints are skipped
///
/// Returns `false` when no track matched and nothing was added.
pub(crate) fn add_clip(
    builder: &mut SceneBuilder,
    clip: &NamedAnimation,
    lookup: &HashMap<&str, usize>,
    joint_nodes: &[Index<json::Node>],
) -> Result<bool> {
    if let Some(joint) = clip.animation.duplicate_joint() {
        return Err(ConvertError::validation(format!(
            "Animation '{}' has more than one track for joint '{}'",
            clip.name, joint
        )));
    }

    let mut channels = Vec::new();
    let mut samplers = Vec::new();

    for track in &clip.animation.tracks {
        let Some(&joint) = lookup.get(track.joint.as_str()) else {
            continue;
        };
        if track.keyframes.is_empty() {
            tracing::debug!(
                "Animation '{}' track '{}' has no keyframes",
                clip.name,
                track.joint
            );
            continue;
        }

        let times = validate_times(&clip.name, track)?;
        let translations: Vec<[f32; 3]> = track.keyframes.iter().map(|k| k.translation).collect();
        let rotations: Vec<[f32; 4]> = track
            .keyframes
            .iter()
            .map(|k| unit_rotation(k.rotation))
            .collect();
        let scales: Vec<[f32; 3]> = track.keyframes.iter().map(|k| k.scale).collect();

        let input = builder.times(&times);
        let outputs = [
            (Property::Translation, builder.vec3(&translations)),
            (Property::Rotation, builder.vec4(&rotations)),
            (Property::Scale, builder.vec3(&scales)),
        ];
        for (path, output) in outputs {
            channels.push(channel(samplers.len(), joint_nodes[joint], path));
            samplers.push(linear_sampler(input, output));
        }
    }

    if channels.is_empty() {
        tracing::warn!("Animation '{}' has no usable tracks, skipped", clip.name);
        return Ok(false);
    }

    tracing::debug!(
        "Animation '{}': {} channels, {:.3}s",
        clip.name,
        channels.len(),
        clip.animation.duration()
    );
    builder.animation(json::Animation {
        name: Some(clip.name.clone()),
        channels,
        samplers,
        extensions: Default::default(),
        extras: Default::default(),
    });
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rig_common::Keyframe;

    fn key(time: f32) -> Keyframe {
        Keyframe {
            time,
            translation: [time, 0.0, 0.0],
            rotation: [0.0, 0.0, 0.0, 2.0],
            scale: [1.0; 3],
        }
    }

    fn track(joint: &str, times: &[f32]) -> Track {
        Track {
            joint: joint.to_string(),
            keyframes: times.iter().map(|&t| key(t)).collect(),
        }
    }

    fn lookup() -> HashMap<&'static str, usize> {
        [("Root", 0), ("Spine", 1)].into_iter().collect()
    }

    fn joint_nodes() -> Vec<Index<json::Node>> {
        vec![Index::new(0), Index::new(1)]
    }

    #[test]
    fn test_missing_joints_listed_once() {
        let animation = Animation {
            tracks: vec![
                track("Tail", &[0.0]),
                track("Root", &[0.0]),
                track("Wing", &[0.0]),
                track("Tail", &[0.5]),
            ],
        };
        assert_eq!(missing_joints(&animation, &lookup()), vec!["Tail", "Wing"]);
    }

    #[test]
    fn test_clip_uses_matching_tracks_only() {
        let clip = NamedAnimation::new(
            "run",
            Animation {
                tracks: vec![track("Root", &[0.0, 0.5]), track("Tail", &[0.0, 0.5])],
            },
        );
        let mut builder = SceneBuilder::new("test");
        assert!(add_clip(&mut builder, &clip, &lookup(), &joint_nodes()).unwrap());

        let scene = builder.finish("Scene");
        let animation = &scene.root.animations[0];
        assert_eq!(animation.name.as_deref(), Some("run"));
        assert_eq!(animation.channels.len(), 3);
        assert_eq!(animation.samplers.len(), 3);
        assert!(animation
            .channels
            .iter()
            .all(|c| c.target.node == Index::new(0)));
    }

    #[test]
    fn test_clip_without_matches_is_skipped() {
        let clip = NamedAnimation::new(
            "wag",
            Animation {
                tracks: vec![track("Tail", &[0.0])],
            },
        );
        let mut builder = SceneBuilder::new("test");
        assert!(!add_clip(&mut builder, &clip, &lookup(), &joint_nodes()).unwrap());
        assert!(builder.finish("Scene").root.animations.is_empty());
    }

    #[test]
    fn test_repeated_joint_track_rejected() {
        let clip = NamedAnimation::new(
            "twice",
            Animation {
                tracks: vec![track("Root", &[0.0, 0.5]), track("Root", &[0.0, 1.0])],
            },
        );
        let mut builder = SceneBuilder::new("test");
        let err = add_clip(&mut builder, &clip, &lookup(), &joint_nodes()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
        assert!(err.to_string().contains("more than one track for joint 'Root'"));
        assert!(builder.finish("Scene").root.animations.is_empty());
    }

    #[test]
    fn test_times_must_increase() {
        let clip = NamedAnimation::new(
            "bad",
            Animation {
                tracks: vec![track("Spine", &[0.0, 0.5, 0.5])],
            },
        );
        let mut builder = SceneBuilder::new("test");
        let err = add_clip(&mut builder, &clip, &lookup(), &joint_nodes()).unwrap_err();
        assert!(err.to_string().contains("not increasing"));
    }
}
