//! Read-only summary of a skinned mesh

use std::fmt;

use rig_common::{Aabb, SkinnedMesh};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmeshInfo {
    pub material: String,
    pub vertex_count: u32,
    pub index_count: u32,
    pub face_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshInfo {
    pub bounds: Aabb,
    pub submeshes: Vec<SubmeshInfo>,
}

impl MeshInfo {
    pub fn from_mesh(mesh: &SkinnedMesh) -> Self {
        let submeshes = mesh
            .ranges
            .iter()
            .map(|range| SubmeshInfo {
                material: range.material.clone(),
                vertex_count: range.vertex_count,
                index_count: range.index_count,
                face_count: range.face_count(),
            })
            .collect();

        Self {
            bounds: mesh.bounding_box(),
            submeshes,
        }
    }
}

impl fmt::Display for MeshInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [x0, y0, z0] = self.bounds.min;
        let [x1, y1, z1] = self.bounds.max;
        writeln!(f, "Bounding box:")?;
        writeln!(f, "  min: ({x0:.4}, {y0:.4}, {z0:.4})")?;
        writeln!(f, "  max: ({x1:.4}, {y1:.4}, {z1:.4})")?;
        writeln!(f, "Submeshes: {}", self.submeshes.len())?;
        for (i, submesh) in self.submeshes.iter().enumerate() {
            writeln!(
                f,
                "  [{}] {}: {} vertices, {} indices, {} faces",
                i, submesh.material, submesh.vertex_count, submesh.index_count, submesh.face_count
            )?;
        }
        Ok(())
    }
}
