//! Shared types for the rig-gltf asset pipeline
//!
//! This crate holds everything that describes the engine side of a
//! conversion:
//!
//! - [`model`] - In-memory skinned mesh, skeleton, animation, static geometry,
//!   weight table and map geometry models
//! - [`formats`] - Binary codecs for the engine files (.skn, .skl, .anm,
//!   .scb, .wgt, .mapgeo)
//!
//! The models are plain data. Structural validation (empty ranges, duplicate
//! joint names, unresolved influences) happens at conversion time in
//! `rig-gltf`, not here.

pub mod formats;
pub mod model;

// Re-export commonly used model items
pub use model::{
    Aabb, Animation, Joint, Keyframe, MapGeometry, MapModel, MapSubmesh, Skeleton, SkinnedMesh,
    SkinnedVertex, StaticGeometry, StaticSubmesh, StaticVertex, SubmeshRange, Track, Transform,
    VertexWeights,
};

// Re-export commonly used format items
pub use formats::{
    read_animation, read_map_geometry, read_skeleton, read_skinned_mesh, read_static_object,
    read_weights, write_animation, write_map_geometry, write_skeleton, write_skinned_mesh,
    write_static_object, write_weights, BinarySerializable, FormatError, ANIMATION_EXT,
    MAP_GEOMETRY_EXT, SKELETON_EXT, SKINNED_MESH_EXT, STATIC_OBJECT_EXT, WEIGHTS_EXT,
};
