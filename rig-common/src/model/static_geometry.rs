//! Unskinned geometry and the per-vertex weight table used to rebuild legacy skins

/// Vertex without skinning data
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StaticVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Triangle list for one material, indexing [`StaticGeometry::vertices`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticSubmesh {
    pub material: String,
    pub indices: Vec<u32>,
}

/// Static object: a shared vertex pool and per-material triangle lists
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticGeometry {
    pub name: String,
    pub vertices: Vec<StaticVertex>,
    pub submeshes: Vec<StaticSubmesh>,
}

/// Up to four (bone, weight) pairs for one vertex
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct VertexWeights {
    pub bone_indices: [u8; 4],
    pub weights: [f32; 4],
}

impl VertexWeights {
    /// Sum in f64 so large finite weights cannot overflow
    pub fn sum(&self) -> f64 {
        self.weights.iter().map(|&w| f64::from(w)).sum()
    }
}
