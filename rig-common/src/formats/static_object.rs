//! Static object binary format (.scb)
//!
//! Unskinned geometry used by older assets. Faces carry their own material
//! and UVs; vertices carry positions only.
//!
//! # Layout
//! ```text
//! 0x00: magic [u8; 8] ("r3d2Mesh")
//! 0x08: major u16, minor u16 (3.2)
//! 0x0C: name [u8; 128]
//! 0x8C: vertex_count u32, face_count u32, flags u32
//! 0x98: bounding box min f32×3, max f32×3
//! 0xB0: positions (vertex_count × f32×3)
//! ....: central point f32×3
//! ....: faces (face_count × 100 bytes):
//!       indices u32×3, material [u8; 64], u f32×3, v f32×3
//! ```

use std::io::{Cursor, Write};

use glam::Vec3;
use hashbrown::HashMap;

use crate::model::{Aabb, StaticGeometry, StaticSubmesh, StaticVertex};

use super::io::{
    count_u32, encode_fixed_string, read_bytes, read_f32s, read_fixed_string, read_u32,
    write_f32s, write_u32,
};
use super::FormatError;

pub const STATIC_OBJECT_MAGIC: [u8; 8] = *b"r3d2Mesh";
pub const STATIC_OBJECT_MAJOR: u16 = 3;
pub const STATIC_OBJECT_MINOR: u16 = 2;

const OBJECT_NAME_SIZE: usize = 128;
const FACE_MATERIAL_SIZE: usize = 64;

/// Static object header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticObjectHeader {
    pub magic: [u8; 8],
    pub major: u16,
    pub minor: u16,
}

impl StaticObjectHeader {
    pub const SIZE: usize = 12;

    pub fn new() -> Self {
        Self {
            magic: STATIC_OBJECT_MAGIC,
            major: STATIC_OBJECT_MAJOR,
            minor: STATIC_OBJECT_MINOR,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..8].copy_from_slice(&self.magic);
        bytes[8..10].copy_from_slice(&self.major.to_le_bytes());
        bytes[10..12].copy_from_slice(&self.minor.to_le_bytes());
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
            major: u16::from_le_bytes([bytes[8], bytes[9]]),
            minor: u16::from_le_bytes([bytes[10], bytes[11]]),
        })
    }
}

impl Default for StaticObjectHeader {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a .scb file
///
/// Faces are grouped into submeshes by material in order of first
/// appearance. Each vertex takes its UV from the first face corner that
/// references it. Normals are accumulated from unnormalized face normals,
/// which weights each face by its area.
pub fn read_static_object(bytes: &[u8]) -> Result<StaticGeometry, FormatError> {
    let mut r = Cursor::new(bytes);

    let header =
        StaticObjectHeader::from_bytes(&read_bytes::<{ StaticObjectHeader::SIZE }>(&mut r)?)
            .ok_or_else(|| FormatError::invalid("truncated header"))?;
    FormatError::check_magic(&STATIC_OBJECT_MAGIC, &header.magic)?;
    if header.major != STATIC_OBJECT_MAJOR {
        return Err(FormatError::UnsupportedVersion {
            major: header.major as u32,
            minor: header.minor as u32,
        });
    }

    let name = read_fixed_string(&mut r, OBJECT_NAME_SIZE)?;
    let vertex_count = read_u32(&mut r)? as usize;
    let face_count = read_u32(&mut r)?;
    let _flags = read_u32(&mut r)?;
    let _bounds = read_f32s::<6>(&mut r)?;

    let mut positions = Vec::new();
    for _ in 0..vertex_count {
        positions.push(read_f32s::<3>(&mut r)?);
    }
    let _central_point = read_f32s::<3>(&mut r)?;

    let mut uvs: Vec<Option<[f32; 2]>> = vec![None; vertex_count];
    let mut normals = vec![Vec3::ZERO; vertex_count];
    let mut submeshes: Vec<StaticSubmesh> = Vec::new();
    let mut by_material: HashMap<String, usize> = HashMap::new();

    for face in 0..face_count {
        let corners = [read_u32(&mut r)?, read_u32(&mut r)?, read_u32(&mut r)?];
        let material = read_fixed_string(&mut r, FACE_MATERIAL_SIZE)?;
        let u = read_f32s::<3>(&mut r)?;
        let v = read_f32s::<3>(&mut r)?;

        if let Some(&bad) = corners.iter().find(|&&c| c as usize >= vertex_count) {
            return Err(FormatError::invalid(format!(
                "face {face} references vertex {bad} of {vertex_count}"
            )));
        }

        for (corner, &index) in corners.iter().enumerate() {
            uvs[index as usize].get_or_insert([u[corner], v[corner]]);
        }

        let [a, b, c] = corners.map(|i| Vec3::from_array(positions[i as usize]));
        let face_normal = (b - a).cross(c - a);
        for &index in &corners {
            normals[index as usize] += face_normal;
        }

        let slot = *by_material.entry(material.clone()).or_insert_with(|| {
            submeshes.push(StaticSubmesh {
                material,
                indices: Vec::new(),
            });
            submeshes.len() - 1
        });
        submeshes[slot].indices.extend_from_slice(&corners);
    }

    let vertices = positions
        .into_iter()
        .zip(uvs)
        .zip(normals)
        .map(|((position, uv), normal)| StaticVertex {
            position,
            normal: normal.try_normalize().unwrap_or(Vec3::Y).to_array(),
            uv: uv.unwrap_or_default(),
        })
        .collect();

    Ok(StaticGeometry {
        name,
        vertices,
        submeshes,
    })
}

/// Encode static geometry as a .scb file
///
/// Normals are not stored; UVs are written per face corner.
pub fn write_static_object<W: Write>(
    w: &mut W,
    geometry: &StaticGeometry,
) -> Result<(), FormatError> {
    let name: [u8; OBJECT_NAME_SIZE] = encode_fixed_string("object name bytes", &geometry.name)?;
    let vertex_count = count_u32("vertices", geometry.vertices.len())?;
    let face_count: usize = geometry.submeshes.iter().map(|s| s.indices.len() / 3).sum();
    let face_count = count_u32("faces", face_count)?;

    w.write_all(&StaticObjectHeader::new().to_bytes())?;
    w.write_all(&name)?;
    write_u32(w, vertex_count)?;
    write_u32(w, face_count)?;
    write_u32(w, 0)?;

    let bounds = Aabb::from_points(geometry.vertices.iter().map(|v| &v.position));
    write_f32s(w, &bounds.min)?;
    write_f32s(w, &bounds.max)?;

    for vertex in &geometry.vertices {
        write_f32s(w, &vertex.position)?;
    }
    write_f32s(w, &bounds.center())?;

    for submesh in &geometry.submeshes {
        let material: [u8; FACE_MATERIAL_SIZE] =
            encode_fixed_string("material name bytes", &submesh.material)?;
        if submesh.indices.len() % 3 != 0 {
            return Err(FormatError::invalid(format!(
                "submesh '{}' index count {} is not a multiple of 3",
                submesh.material,
                submesh.indices.len()
            )));
        }

        for tri in submesh.indices.chunks_exact(3) {
            let mut u = [0.0f32; 3];
            let mut v = [0.0f32; 3];
            for (corner, &index) in tri.iter().enumerate() {
                let vertex = geometry.vertices.get(index as usize).ok_or_else(|| {
                    FormatError::invalid(format!(
                        "submesh '{}' references vertex {} of {}",
                        submesh.material, index, vertex_count
                    ))
                })?;
                u[corner] = vertex.uv[0];
                v[corner] = vertex.uv[1];
                write_u32(w, index)?;
            }
            w.write_all(&material)?;
            write_f32s(w, &u)?;
            write_f32s(w, &v)?;
        }
    }

    Ok(())
}
