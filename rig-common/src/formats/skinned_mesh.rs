//! Skinned mesh binary format (.skn)
//!
//! # Layout
//! ```text
//! 0x00: magic u32 (0x00112233)
//! 0x04: major u16, minor u16 (4.1)
//! 0x08: range_count u32
//! 0x0C: ranges (range_count × 80 bytes)
//!       material [u8; 64], start_vertex u32, vertex_count u32,
//!       start_index u32, index_count u32
//! ....: vertex block header (20 bytes)
//!       flags u32, index_count u32, vertex_count u32, vertex_size u32 (52),
//!       vertex_type u32 (0)
//! ....: bounds (40 bytes): min f32×3, max f32×3, sphere center f32×3, radius f32
//! ....: indices (index_count × u16)
//! ....: vertices (vertex_count × 52 bytes)
//!       position f32×3, bone_indices u8×4, weights f32×4, normal f32×3, uv f32×2
//! ```
//!
//! Indices are absolute into the vertex buffer, so a file holds at most
//! 65536 vertices.

use std::io::{Cursor, Read, Write};

use crate::model::{SkinnedMesh, SkinnedVertex, SubmeshRange};

use super::io::{
    count_u32, decode_fixed_string, encode_fixed_string, read_bytes, read_f32, read_f32s,
    read_u16, write_f32s, write_u16,
};
use super::FormatError;

/// Magic number at the start of every .skn file
pub const SKINNED_MESH_MAGIC: u32 = 0x0011_2233;
pub const SKINNED_MESH_MAJOR: u16 = 4;
pub const SKINNED_MESH_MINOR: u16 = 1;

/// Size of one vertex record in bytes
pub const SKINNED_VERTEX_SIZE: u32 = 52;

/// Maximum material name length (excluding the NUL terminator)
pub const MATERIAL_NAME_SIZE: usize = 64;

/// File header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinnedMeshHeader {
    pub magic: u32,
    pub major: u16,
    pub minor: u16,
    pub range_count: u32,
}

impl SkinnedMeshHeader {
    pub const SIZE: usize = 12;

    pub fn new(range_count: u32) -> Self {
        Self {
            magic: SKINNED_MESH_MAGIC,
            major: SKINNED_MESH_MAJOR,
            minor: SKINNED_MESH_MINOR,
            range_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.major.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.minor.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.range_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            magic: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            major: u16::from_le_bytes([bytes[4], bytes[5]]),
            minor: u16::from_le_bytes([bytes[6], bytes[7]]),
            range_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }
}

/// One entry of the range table (80 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRecord {
    pub material: [u8; MATERIAL_NAME_SIZE],
    pub start_vertex: u32,
    pub vertex_count: u32,
    pub start_index: u32,
    pub index_count: u32,
}

impl RangeRecord {
    pub const SIZE: usize = 80;

    /// Build a record, failing if the material name does not fit
    pub fn new(range: &SubmeshRange) -> Result<Self, FormatError> {
        Ok(Self {
            material: encode_fixed_string("material name bytes", &range.material)?,
            start_vertex: range.start_vertex,
            vertex_count: range.vertex_count,
            start_index: range.start_index,
            index_count: range.index_count,
        })
    }

    pub fn material_name(&self) -> String {
        decode_fixed_string(&self.material)
    }

    pub fn to_range(&self) -> SubmeshRange {
        SubmeshRange {
            material: self.material_name(),
            start_vertex: self.start_vertex,
            vertex_count: self.vertex_count,
            start_index: self.start_index,
            index_count: self.index_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..64].copy_from_slice(&self.material);
        bytes[64..68].copy_from_slice(&self.start_vertex.to_le_bytes());
        bytes[68..72].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[72..76].copy_from_slice(&self.start_index.to_le_bytes());
        bytes[76..80].copy_from_slice(&self.index_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let mut material = [0u8; MATERIAL_NAME_SIZE];
        material.copy_from_slice(&bytes[0..64]);
        let word = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Some(Self {
            material,
            start_vertex: word(64),
            vertex_count: word(68),
            start_index: word(72),
            index_count: word(76),
        })
    }
}

/// Describes the vertex and index blocks (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexBlockHeader {
    pub flags: u32,
    pub index_count: u32,
    pub vertex_count: u32,
    pub vertex_size: u32,
    pub vertex_type: u32,
}

impl VertexBlockHeader {
    pub const SIZE: usize = 20;

    pub fn new(index_count: u32, vertex_count: u32) -> Self {
        Self {
            flags: 0,
            index_count,
            vertex_count,
            vertex_size: SKINNED_VERTEX_SIZE,
            vertex_type: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.flags.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.index_count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.vertex_size.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.vertex_type.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let word = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        Some(Self {
            flags: word(0),
            index_count: word(4),
            vertex_count: word(8),
            vertex_size: word(12),
            vertex_type: word(16),
        })
    }
}

/// Decode a .skn file
pub fn read_skinned_mesh(bytes: &[u8]) -> Result<SkinnedMesh, FormatError> {
    let mut r = Cursor::new(bytes);

    let header = SkinnedMeshHeader::from_bytes(&read_bytes::<{ SkinnedMeshHeader::SIZE }>(&mut r)?)
        .ok_or_else(|| FormatError::invalid("truncated header"))?;
    FormatError::check_magic(&SKINNED_MESH_MAGIC.to_le_bytes(), &header.magic.to_le_bytes())?;
    if header.major != SKINNED_MESH_MAJOR {
        return Err(FormatError::UnsupportedVersion {
            major: header.major as u32,
            minor: header.minor as u32,
        });
    }

    let mut ranges = Vec::new();
    for _ in 0..header.range_count {
        let record = RangeRecord::from_bytes(&read_bytes::<{ RangeRecord::SIZE }>(&mut r)?)
            .ok_or_else(|| FormatError::invalid("truncated range record"))?;
        ranges.push(record.to_range());
    }

    let block = VertexBlockHeader::from_bytes(&read_bytes::<{ VertexBlockHeader::SIZE }>(&mut r)?)
        .ok_or_else(|| FormatError::invalid("truncated vertex block header"))?;
    if block.vertex_size != SKINNED_VERTEX_SIZE || block.vertex_type != 0 {
        return Err(FormatError::invalid(format!(
            "unsupported vertex layout (size {}, type {})",
            block.vertex_size, block.vertex_type
        )));
    }

    // Bounds are derived data; skip them
    read_bytes::<40>(&mut r)?;

    let mut indices = Vec::new();
    for _ in 0..block.index_count {
        indices.push(read_u16(&mut r)? as u32);
    }

    let mut vertices = Vec::new();
    for _ in 0..block.vertex_count {
        vertices.push(read_vertex(&mut r)?);
    }

    for (i, range) in ranges.iter().enumerate() {
        if range.vertex_range().end > vertices.len() || range.index_range().end > indices.len() {
            return Err(FormatError::invalid(format!(
                "range {} ('{}') lies outside the vertex or index buffer",
                i, range.material
            )));
        }
    }

    Ok(SkinnedMesh {
        ranges,
        vertices,
        indices,
    })
}

fn read_vertex(r: &mut impl Read) -> Result<SkinnedVertex, FormatError> {
    let position = read_f32s::<3>(r)?;
    let bone_indices = read_bytes::<4>(r)?;
    let weights = read_f32s::<4>(r)?;
    let normal = read_f32s::<3>(r)?;
    let uv = [read_f32(r)?, read_f32(r)?];
    Ok(SkinnedVertex {
        position,
        normal,
        uv,
        bone_indices,
        weights,
    })
}

/// Encode a skinned mesh as a .skn file
pub fn write_skinned_mesh<W: Write>(w: &mut W, mesh: &SkinnedMesh) -> Result<(), FormatError> {
    FormatError::check_limit("vertices", mesh.vertices.len(), u16::MAX as usize + 1)?;
    let range_count = count_u32("ranges", mesh.ranges.len())?;
    let index_count = count_u32("indices", mesh.indices.len())?;

    w.write_all(&SkinnedMeshHeader::new(range_count).to_bytes())?;
    for range in &mesh.ranges {
        w.write_all(&RangeRecord::new(range)?.to_bytes())?;
    }

    w.write_all(&VertexBlockHeader::new(index_count, mesh.vertices.len() as u32).to_bytes())?;

    let bounds = mesh.bounding_box();
    let (center, radius) = mesh.bounding_sphere();
    write_f32s(w, &bounds.min)?;
    write_f32s(w, &bounds.max)?;
    write_f32s(w, &center)?;
    write_f32s(w, &[radius])?;

    for &index in &mesh.indices {
        let index = u16::try_from(index).map_err(|_| {
            FormatError::invalid(format!("index {index} does not fit a 16-bit index buffer"))
        })?;
        write_u16(w, index)?;
    }

    for v in &mesh.vertices {
        write_f32s(w, &v.position)?;
        w.write_all(&v.bone_indices)?;
        write_f32s(w, &v.weights)?;
        write_f32s(w, &v.normal)?;
        write_f32s(w, &v.uv)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_mesh() -> SkinnedMesh {
        let vertex = |x: f32, bone: u8| SkinnedVertex {
            position: [x, x * 2.0, -x],
            normal: [0.0, 0.0, 1.0],
            uv: [x, 1.0 - x],
            bone_indices: [bone, 0, 0, 0],
            weights: [0.75, 0.25, 0.0, 0.0],
        };
        let mut mesh = SkinnedMesh::new();
        mesh.push_submesh(
            "Body",
            &[vertex(0.0, 0), vertex(1.0, 1), vertex(0.5, 1)],
            &[0, 1, 2],
        );
        mesh.push_submesh(
            "Sword",
            &[vertex(2.0, 2), vertex(3.0, 2), vertex(2.5, 2), vertex(3.5, 2)],
            &[0, 1, 2, 2, 1, 3],
        );
        mesh
    }

    fn encode(mesh: &SkinnedMesh) -> Vec<u8> {
        let mut out = Vec::new();
        write_skinned_mesh(&mut out, mesh).unwrap();
        out
    }

    #[test]
    fn test_header_roundtrip() {
        let header = SkinnedMeshHeader::new(3);
        let parsed = SkinnedMeshHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.magic, 0x0011_2233);
        assert!(SkinnedMeshHeader::from_bytes(&[0u8; 4]).is_none());
    }

    #[test]
    fn test_record_sizes() {
        let range = SubmeshRange {
            material: "Body".to_string(),
            start_vertex: 1,
            vertex_count: 2,
            start_index: 3,
            index_count: 6,
        };
        let bytes = RangeRecord::new(&range).unwrap().to_bytes();
        assert_eq!(bytes.len(), 80);
        assert_eq!(RangeRecord::from_bytes(&bytes).unwrap().to_range(), range);
        assert_eq!(VertexBlockHeader::new(0, 0).to_bytes().len(), 20);
    }

    #[test]
    fn test_mesh_survives_encoding() {
        let mesh = sample_mesh();
        let bytes = encode(&mesh);
        let expected_len = 12 + 2 * 80 + 20 + 40 + 9 * 2 + 7 * 52;
        assert_eq!(bytes.len(), expected_len);

        let parsed = read_skinned_mesh(&bytes).unwrap();
        assert_eq!(parsed, mesh);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&sample_mesh());
        bytes[0] = 0xFF;
        assert!(matches!(
            read_skinned_mesh(&bytes),
            Err(FormatError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_unsupported_major_version() {
        let mut bytes = encode(&sample_mesh());
        bytes[4..6].copy_from_slice(&2u16.to_le_bytes());
        assert!(matches!(
            read_skinned_mesh(&bytes),
            Err(FormatError::UnsupportedVersion { major: 2, minor: 1 })
        ));
    }

    #[test]
    fn test_truncated_file() {
        let bytes = encode(&sample_mesh());
        let err = read_skinned_mesh(&bytes[..bytes.len() - 10]).unwrap_err();
        assert!(matches!(err, FormatError::Io(_)));
    }

    #[test]
    fn test_range_outside_buffers() {
        let mut mesh = sample_mesh();
        mesh.ranges[1].vertex_count = 40;
        let err = read_skinned_mesh(&encode(&mesh)).unwrap_err();
        assert!(matches!(err, FormatError::Invalid(_)));
    }

    #[test]
    fn test_material_name_too_long() {
        let mut mesh = sample_mesh();
        mesh.ranges[0].material = "x".repeat(64);
        let mut out = Vec::new();
        assert!(matches!(
            write_skinned_mesh(&mut out, &mesh),
            Err(FormatError::Limit { .. })
        ));
    }
}
