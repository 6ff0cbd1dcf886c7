//! Vertex weight table (.wgt)
//!
//! Pairs with a static object to rebuild a legacy skin.
//!
//! # Layout
//! ```text
//! 0x00: magic [u8; 8] ("r3d2wght")
//! 0x08: version u32 (1)
//! 0x0C: vertex_count u32
//! 0x10: entries (vertex_count × 20 bytes): bone_indices u8×4, weights f32×4
//! ```

use std::io::{Cursor, Write};

use crate::model::VertexWeights;

use super::io::{count_u32, read_bytes, read_f32s, write_f32s};
use super::FormatError;

pub const WEIGHTS_MAGIC: [u8; 8] = *b"r3d2wght";
pub const WEIGHTS_VERSION: u32 = 1;

/// Weight table header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightsHeader {
    pub magic: [u8; 8],
    pub version: u32,
    pub vertex_count: u32,
}

impl WeightsHeader {
    pub const SIZE: usize = 16;

    pub fn new(vertex_count: u32) -> Self {
        Self {
            magic: WEIGHTS_MAGIC,
            version: WEIGHTS_VERSION,
            vertex_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..12].copy_from_slice(&self.version.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.vertex_count.to_le_bytes());
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
            vertex_count: u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
        })
    }
}

pub fn read_weights(bytes: &[u8]) -> Result<Vec<VertexWeights>, FormatError> {
    let mut r = Cursor::new(bytes);

    let header = WeightsHeader::from_bytes(&read_bytes::<{ WeightsHeader::SIZE }>(&mut r)?)
        .ok_or_else(|| FormatError::invalid("truncated header"))?;
    FormatError::check_magic(&WEIGHTS_MAGIC, &header.magic)?;
    if header.version != WEIGHTS_VERSION {
        return Err(FormatError::UnsupportedVersion {
            major: header.version,
            minor: 0,
        });
    }

    let mut entries = Vec::new();
    for _ in 0..header.vertex_count {
        entries.push(VertexWeights {
            bone_indices: read_bytes::<4>(&mut r)?,
            weights: read_f32s::<4>(&mut r)?,
        });
    }
    Ok(entries)
}

pub fn write_weights<W: Write>(w: &mut W, weights: &[VertexWeights]) -> Result<(), FormatError> {
    let vertex_count = count_u32("vertices", weights.len())?;
    w.write_all(&WeightsHeader::new(vertex_count).to_bytes())?;
    for entry in weights {
        w.write_all(&entry.bone_indices)?;
        write_f32s(w, &entry.weights)?;
    }
    Ok(())
}
