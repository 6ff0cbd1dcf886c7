//! glTF scene assembly and (de)serialization
//!
//! - [`SceneBuilder`] accumulates JSON objects and one binary buffer
//! - [`Scene`] is the finished document, written as GLB or embedded glTF
//! - [`LoadedScene`] is a parsed document plus its resolved buffers

mod builder;
mod container;

pub(crate) use builder::primitive;
pub use builder::SceneBuilder;
pub use container::{load_scene, parse_scene, LoadedScene, OutputContainer};

use gltf::json;

/// A finished glTF document and its single binary buffer
#[derive(Debug, Clone)]
pub struct Scene {
    pub root: json::Root,
    pub buffer: Vec<u8>,
}
