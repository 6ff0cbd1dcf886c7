//! Level geometry: placed static models, each with its own transform

use super::StaticVertex;

/// Index slice of a [`MapModel`] drawn with one material
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapSubmesh {
    pub material: String,
    pub start_index: u32,
    pub index_count: u32,
}

/// One placed instance in a level
#[derive(Debug, Clone, PartialEq)]
pub struct MapModel {
    pub name: String,
    /// Placement, 4x4 column-major
    pub transform: [f32; 16],
    pub vertices: Vec<StaticVertex>,
    pub indices: Vec<u32>,
    pub submeshes: Vec<MapSubmesh>,
}

impl MapModel {
    /// Indices of one submesh, or `None` if it lies outside the index buffer
    pub fn submesh_indices(&self, submesh: &MapSubmesh) -> Option<&[u32]> {
        let start = submesh.start_index as usize;
        self.indices.get(start..start + submesh.index_count as usize)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapGeometry {
    pub models: Vec<MapModel>,
}
