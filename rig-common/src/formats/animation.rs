//! Animation binary format (.anm)
//!
//! # Layout
//! ```text
//! 0x00: magic [u8; 8] ("r3d2anmd")
//! 0x08: version u32 (4)
//! 0x0C: track_count u32
//! 0x10: tracks, each:
//!       name_len u16, name [u8; name_len],
//!       keyframe_count u32,
//!       keyframes (keyframe_count × 44 bytes):
//!         time f32, translation f32×3, rotation f32×4 (xyzw), scale f32×3
//! ```

use std::io::{Cursor, Write};

use crate::model::{Animation, Keyframe, Track};

use super::io::{
    count_u32, read_bytes, read_f32, read_f32s, read_prefixed_string, read_u32, write_f32s,
    write_prefixed_string, write_u32,
};
use super::FormatError;

pub const ANIMATION_MAGIC: [u8; 8] = *b"r3d2anmd";
pub const ANIMATION_VERSION: u32 = 4;

/// Size of one keyframe record in bytes
pub const KEYFRAME_SIZE: usize = 44;

/// Animation header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationHeader {
    pub magic: [u8; 8],
    pub version: u32,
    pub track_count: u32,
}

impl AnimationHeader {
    pub const SIZE: usize = 16;

    pub fn new(track_count: u32) -> Self {
        Self {
            magic: ANIMATION_MAGIC,
            version: ANIMATION_VERSION,
            track_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..12].copy_from_slice(&self.version.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.track_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let mut magic = [0u8; 8];
        magic.copy_from_slice(&bytes[0..8]);
        Some(Self {
            magic,
            version: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            track_count: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }
}

/// Decode a .anm file
pub fn read_animation(bytes: &[u8]) -> Result<Animation, FormatError> {
    let mut r = Cursor::new(bytes);

    let header = AnimationHeader::from_bytes(&read_bytes::<{ AnimationHeader::SIZE }>(&mut r)?)
        .ok_or_else(|| FormatError::invalid("truncated header"))?;
    FormatError::check_magic(&ANIMATION_MAGIC, &header.magic)?;
    if header.version != ANIMATION_VERSION {
        return Err(FormatError::UnsupportedVersion {
            major: header.version,
            minor: 0,
        });
    }

    let mut tracks = Vec::new();
    for _ in 0..header.track_count {
        let joint = read_prefixed_string(&mut r)?;
        let keyframe_count = read_u32(&mut r)?;
        let mut keyframes = Vec::new();
        for _ in 0..keyframe_count {
            keyframes.push(Keyframe {
                time: read_f32(&mut r)?,
                translation: read_f32s::<3>(&mut r)?,
                rotation: read_f32s::<4>(&mut r)?,
                scale: read_f32s::<3>(&mut r)?,
            });
        }
        tracks.push(Track { joint, keyframes });
    }

    let animation = Animation { tracks };
    if let Some(joint) = animation.duplicate_joint() {
        return Err(FormatError::invalid(format!(
            "joint '{joint}' has more than one track"
        )));
    }
    Ok(animation)
}

/// Encode an animation as a .anm file
pub fn write_animation<W: Write>(w: &mut W, animation: &Animation) -> Result<(), FormatError> {
    let track_count = count_u32("tracks", animation.tracks.len())?;
    w.write_all(&AnimationHeader::new(track_count).to_bytes())?;

    for track in &animation.tracks {
        write_prefixed_string(w, &track.joint)?;
        write_u32(w, count_u32("keyframes", track.keyframes.len())?)?;
        for key in &track.keyframes {
            write_f32s(w, &[key.time])?;
            write_f32s(w, &key.translation)?;
            write_f32s(w, &key.rotation)?;
            write_f32s(w, &key.scale)?;
        }
    }

    Ok(())
}
