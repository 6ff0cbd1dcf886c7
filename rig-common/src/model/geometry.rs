//! Skinned mesh model: submesh ranges over a shared vertex/index buffer

use std::ops::Range;

/// A single skinned vertex
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkinnedVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// Bone slots, resolved through the skeleton's influence table
    pub bone_indices: [u8; 4],
    /// Weight per bone slot
    pub weights: [f32; 4],
}

impl Default for SkinnedVertex {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            normal: [0.0, 1.0, 0.0],
            uv: [0.0; 2],
            bone_indices: [0; 4],
            weights: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

/// A materially-homogeneous slice of the shared vertex and index buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmeshRange {
    pub material: String,
    pub start_vertex: u32,
    pub vertex_count: u32,
    pub start_index: u32,
    pub index_count: u32,
}

impl SubmeshRange {
    /// Number of triangles in the range
    pub fn face_count(&self) -> u32 {
        self.index_count / 3
    }

    pub fn vertex_range(&self) -> Range<usize> {
        let start = self.start_vertex as usize;
        start..start + self.vertex_count as usize
    }

    pub fn index_range(&self) -> Range<usize> {
        let start = self.start_index as usize;
        start..start + self.index_count as usize
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: [0.0; 3],
        max: [0.0; 3],
    };

    /// Compute bounds of a set of positions (all zero when empty)
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a [f32; 3]>) -> Self {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        let mut any = false;

        for p in points {
            any = true;
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        if any {
            Self { min, max }
        } else {
            Self::EMPTY
        }
    }

    pub fn center(&self) -> [f32; 3] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
            (self.min[2] + self.max[2]) * 0.5,
        ]
    }
}

/// Skinned mesh: ordered ranges sharing one vertex buffer and one index buffer
///
/// Indices are absolute into `vertices`. A well-formed mesh has ranges that
/// do not overlap and together cover the whole vertex buffer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinnedMesh {
    pub ranges: Vec<SubmeshRange>,
    pub vertices: Vec<SkinnedVertex>,
    pub indices: Vec<u32>,
}

impl SkinnedMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a submesh whose indices are local to `vertices`
    ///
    /// The indices are rebased onto the shared vertex buffer.
    pub fn push_submesh(
        &mut self,
        material: impl Into<String>,
        vertices: &[SkinnedVertex],
        indices: &[u32],
    ) {
        let start_vertex = self.vertices.len() as u32;
        let start_index = self.indices.len() as u32;

        self.vertices.extend_from_slice(vertices);
        self.indices
            .extend(indices.iter().map(|&i| i + start_vertex));

        self.ranges.push(SubmeshRange {
            material: material.into(),
            start_vertex,
            vertex_count: vertices.len() as u32,
            start_index,
            index_count: indices.len() as u32,
        });
    }

    /// Vertices of one range (empty if the range lies outside the buffer)
    pub fn range_vertices(&self, range: &SubmeshRange) -> &[SkinnedVertex] {
        self.vertices.get(range.vertex_range()).unwrap_or(&[])
    }

    /// Absolute indices of one range (empty if the range lies outside the buffer)
    pub fn range_indices(&self, range: &SubmeshRange) -> &[u32] {
        self.indices.get(range.index_range()).unwrap_or(&[])
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(self.vertices.iter().map(|v| &v.position))
    }

    /// Bounding sphere around the box center: (center, radius)
    pub fn bounding_sphere(&self) -> ([f32; 3], f32) {
        let center = self.bounding_box().center();
        let radius = self
            .vertices
            .iter()
            .map(|v| {
                let d = [
                    v.position[0] - center[0],
                    v.position[1] - center[1],
                    v.position[2] - center[2],
                ];
                (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
            })
            .fold(0.0f32, f32::max);
        (center, radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex_at(x: f32, y: f32, z: f32) -> SkinnedVertex {
        SkinnedVertex {
            position: [x, y, z],
            ..Default::default()
        }
    }

    #[test]
    fn test_push_submesh_rebases_indices() {
        let mut mesh = SkinnedMesh::new();
        let tri = [
            vertex_at(0.0, 0.0, 0.0),
            vertex_at(1.0, 0.0, 0.0),
            vertex_at(0.0, 1.0, 0.0),
        ];
        mesh.push_submesh("Body", &tri, &[0, 1, 2]);
        mesh.push_submesh("Hair", &tri, &[0, 2, 1]);

        assert_eq!(mesh.ranges.len(), 2);
        assert_eq!(mesh.ranges[1].start_vertex, 3);
        assert_eq!(mesh.ranges[1].start_index, 3);
        assert_eq!(mesh.range_indices(&mesh.ranges[1]), &[3, 5, 4]);
        assert_eq!(mesh.ranges[1].face_count(), 1);
    }

    #[test]
    fn test_bounding_box() {
        let mut mesh = SkinnedMesh::new();
        mesh.push_submesh(
            "Body",
            &[
                vertex_at(-1.0, 0.0, 2.0),
                vertex_at(3.0, -4.0, 0.5),
                vertex_at(0.0, 5.0, -2.0),
            ],
            &[0, 1, 2],
        );

        let bounds = mesh.bounding_box();
        assert_eq!(bounds.min, [-1.0, -4.0, -2.0]);
        assert_eq!(bounds.max, [3.0, 5.0, 2.0]);
        assert_eq!(bounds.center(), [1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_empty_mesh_bounds() {
        let mesh = SkinnedMesh::new();
        assert_eq!(mesh.bounding_box(), Aabb::EMPTY);
        assert_eq!(mesh.bounding_sphere().1, 0.0);
    }

    #[test]
    fn test_out_of_bounds_range_is_empty() {
        let mesh = SkinnedMesh::new();
        let range = SubmeshRange {
            material: "Ghost".to_string(),
            start_vertex: 10,
            vertex_count: 3,
            start_index: 0,
            index_count: 3,
        };
        assert!(mesh.range_vertices(&range).is_empty());
        assert!(mesh.range_indices(&range).is_empty());
    }
}
