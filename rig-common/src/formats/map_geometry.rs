//! Level geometry container (.mapgeo)
//!
//! # Layout
//! ```text
//! 0x00: magic [u8; 4] ("OEGM")
//! 0x04: version u32 (1)
//! 0x08: model_count u32
//! 0x0C: models, each:
//!       name_len u16, name [u8; name_len]
//!       transform f32×16 (column-major)
//!       vertex_count u32, vertices (vertex_count × 32 bytes: position f32×3,
//!         normal f32×3, uv f32×2)
//!       index_count u32, indices (index_count × u32)
//!       submesh_count u32, submeshes:
//!         material_len u16, material, start_index u32, index_count u32
//! ```

use std::io::{Cursor, Read, Write};

use crate::model::{MapGeometry, MapModel, MapSubmesh, StaticVertex};

use super::io::{
    count_u32, read_bytes, read_f32s, read_prefixed_string, read_u32, write_f32s,
    write_prefixed_string, write_u32,
};
use super::FormatError;

pub const MAP_GEOMETRY_MAGIC: [u8; 4] = *b"OEGM";
pub const MAP_GEOMETRY_VERSION: u32 = 1;

/// Map geometry header (12 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapGeometryHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub model_count: u32,
}

impl MapGeometryHeader {
    pub const SIZE: usize = 12;

    pub fn new(model_count: u32) -> Self {
        Self {
            magic: MAP_GEOMETRY_MAGIC,
            version: MAP_GEOMETRY_VERSION,
            model_count,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.model_count.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        Some(Self {
            magic,
            version: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            model_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }
}

/// Decode a .mapgeo container
///
/// Submeshes outside their model's index buffer and indices outside the
/// vertex buffer are rejected as [`FormatError::Invalid`].
pub fn read_map_geometry(bytes: &[u8]) -> Result<MapGeometry, FormatError> {
    let mut r = Cursor::new(bytes);

    let header = MapGeometryHeader::from_bytes(&read_bytes::<{ MapGeometryHeader::SIZE }>(&mut r)?)
        .ok_or_else(|| FormatError::invalid("truncated header"))?;
    FormatError::check_magic(&MAP_GEOMETRY_MAGIC, &header.magic)?;
    if header.version != MAP_GEOMETRY_VERSION {
        return Err(FormatError::UnsupportedVersion {
            major: header.version,
            minor: 0,
        });
    }

    let mut models = Vec::new();
    for _ in 0..header.model_count {
        models.push(read_model(&mut r)?);
    }
    Ok(MapGeometry { models })
}

fn read_model(r: &mut impl Read) -> Result<MapModel, FormatError> {
    let name = read_prefixed_string(r)?;
    let transform = read_f32s::<16>(r)?;

    let vertex_count = read_u32(r)?;
    let mut vertices = Vec::new();
    for _ in 0..vertex_count {
        vertices.push(StaticVertex {
            position: read_f32s::<3>(r)?,
            normal: read_f32s::<3>(r)?,
            uv: read_f32s::<2>(r)?,
        });
    }

    let index_count = read_u32(r)?;
    let mut indices = Vec::new();
    for _ in 0..index_count {
        let index = read_u32(r)?;
        if index >= vertex_count {
            return Err(FormatError::invalid(format!(
                "model '{name}' index {index} exceeds vertex count {vertex_count}"
            )));
        }
        indices.push(index);
    }

    let submesh_count = read_u32(r)?;
    let mut submeshes = Vec::new();
    for _ in 0..submesh_count {
        let submesh = MapSubmesh {
            material: read_prefixed_string(r)?,
            start_index: read_u32(r)?,
            index_count: read_u32(r)?,
        };
        let end = submesh.start_index as u64 + submesh.index_count as u64;
        if end > index_count as u64 {
            return Err(FormatError::invalid(format!(
                "model '{}' submesh '{}' lies outside the index buffer",
                name, submesh.material
            )));
        }
        if submesh.index_count % 3 != 0 {
            return Err(FormatError::invalid(format!(
                "model '{}' submesh '{}' index count {} is not a multiple of 3",
                name, submesh.material, submesh.index_count
            )));
        }
        submeshes.push(submesh);
    }

    Ok(MapModel {
        name,
        transform,
        vertices,
        indices,
        submeshes,
    })
}

/// Encode a level geometry container
pub fn write_map_geometry<W: Write>(w: &mut W, map: &MapGeometry) -> Result<(), FormatError> {
    let model_count = count_u32("models", map.models.len())?;
    w.write_all(&MapGeometryHeader::new(model_count).to_bytes())?;

    for model in &map.models {
        write_prefixed_string(w, &model.name)?;
        write_f32s(w, &model.transform)?;

        write_u32(w, count_u32("vertices", model.vertices.len())?)?;
        for vertex in &model.vertices {
            write_f32s(w, &vertex.position)?;
            write_f32s(w, &vertex.normal)?;
            write_f32s(w, &vertex.uv)?;
        }

        write_u32(w, count_u32("indices", model.indices.len())?)?;
        for &index in &model.indices {
            write_u32(w, index)?;
        }

        write_u32(w, count_u32("submeshes", model.submeshes.len())?)?;
        for submesh in &model.submeshes {
            write_prefixed_string(w, &submesh.material)?;
            write_u32(w, submesh.start_index)?;
            write_u32(w, submesh.index_count)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const IDENTITY: [f32; 16] = [
        1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0,
    ];

    fn sample_map() -> MapGeometry {
        let mut moved = IDENTITY;
        moved[12] = 10.0;
        let vertex = |x: f32| StaticVertex {
            position: [x, 0.0, 0.0],
            normal: [0.0, 1.0, 0.0],
            uv: [x, 0.0],
        };
        let model = |name: &str, transform: [f32; 16]| MapModel {
            name: name.to_string(),
            transform,
            vertices: vec![vertex(0.0), vertex(1.0), vertex(2.0), vertex(3.0)],
            indices: vec![0, 1, 2, 1, 3, 2],
            submeshes: vec![
                MapSubmesh {
                    material: "Grass".to_string(),
                    start_index: 0,
                    index_count: 3,
                },
                MapSubmesh {
                    material: "Stone".to_string(),
                    start_index: 3,
                    index_count: 3,
                },
            ],
        };
        MapGeometry {
            models: vec![model("Floor", IDENTITY), model("Floor_2", moved)],
        }
    }

    fn encode(map: &MapGeometry) -> Vec<u8> {
        let mut out = Vec::new();
        write_map_geometry(&mut out, map).unwrap();
        out
    }

    #[test]
    fn test_map_survives_encoding() {
        let map = sample_map();
        assert_eq!(read_map_geometry(&encode(&map)).unwrap(), map);
    }

    #[test]
    fn test_submesh_outside_index_buffer() {
        let mut map = sample_map();
        map.models[1].submeshes[1].index_count = 30;
        assert!(matches!(
            read_map_geometry(&encode(&map)),
            Err(FormatError::Invalid(_))
        ));
    }

    #[test]
    fn test_partial_triangle_submesh() {
        let mut map = sample_map();
        map.models[1].submeshes[1].index_count = 2;
        let err = read_map_geometry(&encode(&map)).unwrap_err();
        assert!(matches!(err, FormatError::Invalid(_)));
        assert!(err.to_string().contains("not a multiple of 3"));
    }

    #[test]
    fn test_index_outside_vertex_buffer() {
        let mut map = sample_map();
        map.models[0].indices[4] = 4;
        assert!(matches!(
            read_map_geometry(&encode(&map)),
            Err(FormatError::Invalid(_))
        ));
    }

    #[test]
    fn test_truncated_container() {
        let bytes = encode(&sample_map());
        assert!(matches!(
            read_map_geometry(&bytes[..bytes.len() / 2]),
            Err(FormatError::Io(_))
        ));
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode(&sample_map());
        bytes[..4].copy_from_slice(b"MGEO");
        assert!(matches!(
            read_map_geometry(&bytes),
            Err(FormatError::BadMagic { .. })
        ));
    }
}
