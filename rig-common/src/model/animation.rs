//! Animation model: per-joint keyframe tracks keyed by joint name

use hashbrown::HashSet;

/// One sampled pose of a joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub time: f32,
    pub translation: [f32; 3],
    /// Quaternion as [x, y, z, w], not necessarily normalized
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

/// Keyframes for a single joint, ordered by time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Track {
    /// Joint name, resolved against a skeleton at conversion time
    pub joint: String,
    pub keyframes: Vec<Keyframe>,
}

/// A named clip's tracks, in file order
///
/// The clip name is not stored here; it comes from the file the animation
/// was loaded from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Animation {
    pub tracks: Vec<Track>,
}

impl Animation {
    /// Time of the last keyframe across all tracks
    pub fn duration(&self) -> f32 {
        self.tracks
            .iter()
            .filter_map(|t| t.keyframes.last())
            .map(|k| k.time)
            .fold(0.0, f32::max)
    }

    /// First joint that has more than one track
    pub fn duplicate_joint(&self) -> Option<&str> {
        let mut seen = HashSet::with_capacity(self.tracks.len());
        self.tracks
            .iter()
            .map(|t| t.joint.as_str())
            .find(|name| !seen.insert(*name))
    }
}
