//! Skinned mesh ranges to glTF primitives

use gltf::json;
use json::mesh::Semantic;
use rig_common::{SkinnedMesh, SubmeshRange};

use crate::error::{ConvertError, Result};
use crate::scene::{primitive, SceneBuilder};

/// Check the range invariants a glTF export relies on
///
/// Every range must be non-empty, a triangle list, inside the shared
/// buffers, and index only its own vertex slice. Vertex slices must tile
/// the vertex buffer without gaps or overlap.
pub(crate) fn validate_geometry(mesh: &SkinnedMesh) -> Result<()> {
    if mesh.ranges.is_empty() {
        return Err(ConvertError::validation("Mesh has no submesh ranges"));
    }

    for (i, range) in mesh.ranges.iter().enumerate() {
        validate_range(mesh, i, range)?;
    }

    let mut spans: Vec<(usize, usize)> = mesh
        .ranges
        .iter()
        .map(|r| (r.vertex_range().start, r.vertex_range().end))
        .collect();
    spans.sort_unstable();

    let mut covered = 0;
    for (start, end) in spans {
        if start < covered {
            return Err(ConvertError::validation(format!(
                "Submesh ranges overlap at vertex {start}"
            )));
        }
        if start > covered {
            return Err(ConvertError::validation(format!(
                "Vertices {covered}..{start} belong to no submesh range"
            )));
        }
        covered = end;
    }
    if covered != mesh.vertices.len() {
        return Err(ConvertError::validation(format!(
            "Vertices {}..{} belong to no submesh range",
            covered,
            mesh.vertices.len()
        )));
    }

    Ok(())
}

fn validate_range(mesh: &SkinnedMesh, i: usize, range: &SubmeshRange) -> Result<()> {
    if range.material.is_empty() {
        return Err(ConvertError::validation(format!(
            "Range {i} has an empty material name"
        )));
    }
    if range.vertex_count == 0 || range.index_count == 0 {
        return Err(ConvertError::validation(format!(
            "Range {} ('{}') has {} vertices and {} indices",
            i, range.material, range.vertex_count, range.index_count
        )));
    }
    if range.index_count % 3 != 0 {
        return Err(ConvertError::validation(format!(
            "Range {} ('{}') index count {} is not a multiple of 3",
            i, range.material, range.index_count
        )));
    }
    if range.vertex_range().end > mesh.vertices.len() || range.index_range().end > mesh.indices.len()
    {
        return Err(ConvertError::validation(format!(
            "Range {} ('{}') lies outside the vertex or index buffer",
            i, range.material
        )));
    }

    let vertices = range.vertex_range();
    if let Some(&bad) = mesh
        .range_indices(range)
        .iter()
        .find(|&&index| !vertices.contains(&(index as usize)))
    {
        return Err(ConvertError::validation(format!(
            "Range {} ('{}') index {} is outside its vertices {:?}",
            i, range.material, bad, vertices
        )));
    }

    Ok(())
}

/// Per-vertex skin data for the whole mesh
#[derive(Debug)]
pub(crate) struct SkinAttributes {
    /// Joint slot per bone, indexed like the mesh's vertex buffer
    pub joints: Vec<[u16; 4]>,
    /// Use u16 JOINTS_0 components
    pub wide: bool,
}

/// Build the primitive for one validated range
pub(crate) fn range_primitive(
    builder: &mut SceneBuilder,
    mesh: &SkinnedMesh,
    range: &SubmeshRange,
    material: json::Index<json::Material>,
    skin: Option<&SkinAttributes>,
) -> json::mesh::Primitive {
    let vertices = mesh.range_vertices(range);
    let positions: Vec<[f32; 3]> = vertices.iter().map(|v| v.position).collect();
    let normals: Vec<[f32; 3]> = vertices.iter().map(|v| v.normal).collect();
    let uvs: Vec<[f32; 2]> = vertices.iter().map(|v| v.uv).collect();
    let local_indices: Vec<u32> = mesh
        .range_indices(range)
        .iter()
        .map(|&i| i - range.start_vertex)
        .collect();

    let mut attributes = vec![
        (Semantic::Positions, builder.positions(&positions)),
        (Semantic::Normals, builder.vec3(&normals)),
        (Semantic::TexCoords(0), builder.vec2(&uvs)),
    ];

    if let Some(skin) = skin {
        let joints = &skin.joints[range.vertex_range()];
        let weights: Vec<[f32; 4]> = vertices.iter().map(|v| v.weights).collect();
        attributes.push((Semantic::Joints(0), builder.joints(joints, skin.wide)));
        attributes.push((Semantic::Weights(0), builder.vec4(&weights)));
    }

    let indices = builder.indices(&local_indices);
    primitive(&attributes, indices, material)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rig_common::SkinnedVertex;

    fn tri_mesh() -> SkinnedMesh {
        let mut mesh = SkinnedMesh::new();
        let tri = [SkinnedVertex::default(); 3];
        mesh.push_submesh("Body", &tri, &[0, 1, 2]);
        mesh.push_submesh("Hair", &tri, &[2, 1, 0]);
        mesh
    }

    fn validation_message(mesh: &SkinnedMesh) -> String {
        let err = validate_geometry(mesh).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        err.to_string()
    }

    #[test]
    fn test_valid_mesh() {
        validate_geometry(&tri_mesh()).unwrap();
    }

    #[test]
    fn test_zero_length_range() {
        let mut mesh = tri_mesh();
        mesh.ranges[1].index_count = 0;
        assert!(validation_message(&mesh).contains("'Hair'"));
    }

    #[test]
    fn test_index_count_not_triangles() {
        let mut mesh = tri_mesh();
        mesh.indices.push(3);
        mesh.ranges[1].index_count = 4;
        assert!(validation_message(&mesh).contains("multiple of 3"));
    }

    #[test]
    fn test_index_outside_range() {
        let mut mesh = tri_mesh();
        mesh.indices[0] = 4;
        assert!(validation_message(&mesh).contains("outside its vertices"));
    }

    #[test]
    fn test_overlap_and_gap() {
        let mut mesh = tri_mesh();
        mesh.ranges[1].start_vertex = 2;
        mesh.indices[3..].copy_from_slice(&[2, 3, 4]);
        assert!(validation_message(&mesh).contains("overlap"));

        let mut mesh = tri_mesh();
        mesh.vertices.push(SkinnedVertex::default());
        assert!(validation_message(&mesh).contains("6..7"));
    }

    #[test]
    fn test_empty_mesh() {
        assert!(validation_message(&SkinnedMesh::new()).contains("no submesh"));
    }
}
