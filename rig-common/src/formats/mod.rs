//! Engine binary asset formats
//!
//! All formats are little-endian. Each file starts with a fixed header that
//! implements [`BinarySerializable`]; the variable-length body follows.
//!
//! Readers take the whole file as a byte slice and return the matching
//! [`crate::model`] type. Writers take any `Write`.

pub mod animation;
mod error;
mod io;
pub mod map_geometry;
mod serialization;
pub mod skeleton;
pub mod skinned_mesh;
pub mod static_object;
pub mod weights;

pub use animation::{read_animation, write_animation, AnimationHeader};
pub use error::FormatError;
pub use map_geometry::{read_map_geometry, write_map_geometry, MapGeometryHeader};
pub use serialization::BinarySerializable;
pub use skeleton::{read_skeleton, write_skeleton, SkeletonHeader};
pub use skinned_mesh::{
    read_skinned_mesh, write_skinned_mesh, RangeRecord, SkinnedMeshHeader, VertexBlockHeader,
};
pub use static_object::{read_static_object, write_static_object, StaticObjectHeader};
pub use weights::{read_weights, write_weights, WeightsHeader};

/// File extensions (without the dot)
pub const SKINNED_MESH_EXT: &str = "skn";
pub const SKELETON_EXT: &str = "skl";
pub const ANIMATION_EXT: &str = "anm";
pub const STATIC_OBJECT_EXT: &str = "scb";
pub const WEIGHTS_EXT: &str = "wgt";
pub const MAP_GEOMETRY_EXT: &str = "mapgeo";
