//! rig-gltf library
//!
//! Converts the engine's skinned mesh, skeleton, animation, static object and
//! map geometry files to glTF 2.0 scenes, and skinned glTF scenes back.
//! The `rig-gltf` binary is a thin CLI over [`Command`].

pub mod animation;
pub mod commands;
pub mod config;
pub mod convert;
pub mod error;
pub mod info;
pub mod legacy;
pub mod map_geometry;
pub mod mesh;
pub mod report;
pub mod reverse;
pub mod scene;
pub mod skeleton;
pub mod textures;

pub use animation::NamedAnimation;
pub use commands::{scan_animation_dir, AnimationSource, Command, Outcome};
pub use config::{Config, OrphanPolicy, WeightPolicy};
pub use convert::{convert_simple_skin, convert_skinned_model};
pub use error::{ConvertError, ErrorKind};
pub use info::{MeshInfo, SubmeshInfo};
pub use legacy::synthesize_legacy_skin;
pub use map_geometry::convert_map_geometry;
pub use report::{ConversionReport, Warning};
pub use reverse::{reverse_convert, ReverseOutput};
pub use scene::{load_scene, parse_scene, LoadedScene, OutputContainer, Scene};
pub use textures::{
    parse_binding, parse_bindings, resolve_material_textures, ImageFileSource, MaterialTextures,
    TextureBinding, TextureSource,
};
