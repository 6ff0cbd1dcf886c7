//! Skeleton binary format (.skl)
//!
//! # Layout
//! ```text
//! 0x00: magic [u8; 8] ("r3d2sklt")
//! 0x08: version u32 (1)
//! 0x0C: joint_count u32
//! 0x10: influence_count u32
//! 0x14: joints, each:
//!       id u16, parent_id i16 (-1 for roots), flags u16,
//!       translation f32×3, rotation f32×4 (xyzw), scale f32×3,
//!       inverse_bind f32×16 (column-major),
//!       name_len u16, name [u8; name_len]
//! ....: influences (influence_count × u16 joint index)
//! ```
//!
//! Parents are stored by joint id and resolved to arena indices on load.

use std::io::{Cursor, Write};

use hashbrown::HashMap;

use crate::model::{Joint, Skeleton, Transform};

use super::io::{
    count_u32, read_bytes, read_f32s, read_i16, read_prefixed_string, read_u16, write_f32s,
    write_i16, write_prefixed_string, write_u16,
};
use super::FormatError;

pub const SKELETON_MAGIC: [u8; 8] = *b"r3d2sklt";
pub const SKELETON_VERSION: u32 = 1;

/// Skeleton header (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkeletonHeader {
    pub magic: [u8; 8],
    pub version: u32,
    pub joint_count: u32,
    pub influence_count: u32,
}

impl SkeletonHeader {
    pub const SIZE: usize = 20;

    pub fn new(joint_count: u32, influence_count: u32) -> Self {
        Self {
            magic: SKELETON_MAGIC,
            version: SKELETON_VERSION,
            joint_count,
            influence_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..12].copy_from_slice(&self.version.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.joint_count.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.influence_count.to_le_bytes());
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
            joint_count: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            influence_count: u32::from_le_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]),
        })
    }
}

/// Decode a .skl file
///
/// Only structural problems are rejected here (unknown parent id, duplicate
/// id). Hierarchy cycles and duplicate names are left for conversion-time
/// validation.
pub fn read_skeleton(bytes: &[u8]) -> Result<Skeleton, FormatError> {
    let mut r = Cursor::new(bytes);

    let header = SkeletonHeader::from_bytes(&read_bytes::<{ SkeletonHeader::SIZE }>(&mut r)?)
        .ok_or_else(|| FormatError::invalid("truncated header"))?;
    FormatError::check_magic(&SKELETON_MAGIC, &header.magic)?;
    if header.version != SKELETON_VERSION {
        return Err(FormatError::UnsupportedVersion {
            major: header.version,
            minor: 0,
        });
    }

    let mut joints = Vec::new();
    let mut parent_ids = Vec::new();
    for _ in 0..header.joint_count {
        let id = read_u16(&mut r)?;
        let parent_id = read_i16(&mut r)?;
        let _flags = read_u16(&mut r)?;
        let local = Transform {
            translation: read_f32s::<3>(&mut r)?,
            rotation: read_f32s::<4>(&mut r)?,
            scale: read_f32s::<3>(&mut r)?,
        };
        let inverse_bind = read_f32s::<16>(&mut r)?;
        let name = read_prefixed_string(&mut r)?;

        joints.push(Joint {
            name,
            id,
            parent: None,
            local,
            inverse_bind,
        });
        parent_ids.push(parent_id);
    }

    let mut by_id: HashMap<u16, usize> = HashMap::with_capacity(joints.len());
    for (index, joint) in joints.iter().enumerate() {
        if by_id.insert(joint.id, index).is_some() {
            return Err(FormatError::invalid(format!("duplicate joint id {}", joint.id)));
        }
    }

    for (joint, parent_id) in joints.iter_mut().zip(parent_ids) {
        if parent_id < 0 {
            continue;
        }
        let parent = by_id.get(&(parent_id as u16)).copied().ok_or_else(|| {
            FormatError::invalid(format!(
                "joint '{}' references unknown parent id {}",
                joint.name, parent_id
            ))
        })?;
        joint.parent = Some(parent);
    }

    let mut influences = Vec::new();
    for _ in 0..header.influence_count {
        influences.push(read_u16(&mut r)?);
    }

    Ok(Skeleton { joints, influences })
}

/// Encode a skeleton as a .skl file
pub fn write_skeleton<W: Write>(w: &mut W, skeleton: &Skeleton) -> Result<(), FormatError> {
    FormatError::check_limit("joints", skeleton.joints.len(), i16::MAX as usize)?;
    let joint_count = count_u32("joints", skeleton.joints.len())?;
    let influence_count = count_u32("influences", skeleton.influences.len())?;

    w.write_all(&SkeletonHeader::new(joint_count, influence_count).to_bytes())?;

    for joint in &skeleton.joints {
        let parent_id = match joint.parent {
            None => -1,
            Some(parent) => {
                let parent = skeleton.joints.get(parent).ok_or_else(|| {
                    FormatError::invalid(format!(
                        "joint '{}' has parent index {} outside the skeleton",
                        joint.name, parent
                    ))
                })?;
                i16::try_from(parent.id).map_err(|_| {
                    FormatError::invalid(format!("parent id {} does not fit 15 bits", parent.id))
                })?
            }
        };

        write_u16(w, joint.id)?;
        write_i16(w, parent_id)?;
        write_u16(w, 0)?;
        write_f32s(w, &joint.local.translation)?;
        write_f32s(w, &joint.local.rotation)?;
        write_f32s(w, &joint.local.scale)?;
        write_f32s(w, &joint.inverse_bind)?;
        write_prefixed_string(w, &joint.name)?;
    }

    for &influence in &skeleton.influences {
        write_u16(w, influence)?;
    }

    Ok(())
}
