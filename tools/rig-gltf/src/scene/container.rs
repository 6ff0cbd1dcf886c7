use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use gltf::json;

use super::Scene;
use crate::error::{ConvertError, Result};

/// GLB chunk type "JSON"
const CHUNK_JSON: u32 = 0x4E4F_534A;
/// GLB chunk type "BIN\0"
const CHUNK_BIN: u32 = 0x004E_4942;

/// On-disk container for a scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputContainer {
    /// Binary glTF
    Glb,
    /// JSON glTF with the buffer inlined as a base64 data URI
    EmbeddedGltf,
}

impl OutputContainer {
    /// `.glb` selects binary output; any other extension selects JSON
    pub fn for_path(path: &Path) -> Self {
        let is_glb = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("glb"));
        if is_glb {
            OutputContainer::Glb
        } else {
            OutputContainer::EmbeddedGltf
        }
    }
}

impl Scene {
    fn json_bytes(root: &json::Root) -> Result<Vec<u8>> {
        json::serialize::to_vec(root)
            .map_err(|e| ConvertError::Format(format!("Failed to serialize glTF JSON: {e}")))
    }

    /// Assemble a GLB: header, JSON chunk, optional BIN chunk
    pub fn to_glb(&self) -> Result<Vec<u8>> {
        let json_bytes = Self::json_bytes(&self.root)?;

        // Pad JSON with spaces and BIN with zeros to 4-byte alignment
        let json_padding = (4 - (json_bytes.len() % 4)) % 4;
        let json_chunk_length = json_bytes.len() + json_padding;
        let buffer_padding = (4 - (self.buffer.len() % 4)) % 4;
        let buffer_chunk_length = self.buffer.len() + buffer_padding;

        let mut total_length = 12 + 8 + json_chunk_length;
        if !self.buffer.is_empty() {
            total_length += 8 + buffer_chunk_length;
        }
        let total_length_u32 = u32::try_from(total_length).map_err(|_| {
            ConvertError::Format(format!("Scene of {total_length} bytes exceeds the GLB limit"))
        })?;

        let mut glb = Vec::with_capacity(total_length);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&total_length_u32.to_le_bytes());

        glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
        glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        glb.extend_from_slice(&json_bytes);
        glb.extend(std::iter::repeat(0x20u8).take(json_padding));

        if !self.buffer.is_empty() {
            glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
            glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
            glb.extend_from_slice(&self.buffer);
            glb.extend(std::iter::repeat(0u8).take(buffer_padding));
        }

        Ok(glb)
    }

    /// JSON glTF with the buffer as a data URI
    pub fn to_gltf_embedded(&self) -> Result<Vec<u8>> {
        let mut root = self.root.clone();
        if let Some(buffer) = root.buffers.first_mut() {
            buffer.uri = Some(format!(
                "data:application/octet-stream;base64,{}",
                STANDARD.encode(&self.buffer)
            ));
        }
        Self::json_bytes(&root)
    }

    pub fn encode(&self, container: OutputContainer) -> Result<Vec<u8>> {
        match container {
            OutputContainer::Glb => self.to_glb(),
            OutputContainer::EmbeddedGltf => self.to_gltf_embedded(),
        }
    }
}

/// A parsed glTF document with every buffer resolved
pub struct LoadedScene {
    pub document: gltf::Document,
    pub buffers: Vec<gltf::buffer::Data>,
}

impl LoadedScene {
    pub(crate) fn buffer(&self, buffer: gltf::Buffer<'_>) -> Option<&[u8]> {
        self.buffers.get(buffer.index()).map(|data| data.0.as_slice())
    }
}

/// Parse GLB or JSON glTF bytes
///
/// `base` resolves relative buffer URIs; embedded data URIs and the GLB
/// binary chunk need no base.
pub fn parse_scene(bytes: &[u8], base: Option<&Path>) -> Result<LoadedScene> {
    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes)?;
    let buffers = gltf::import_buffers(&document, base, blob)?;
    Ok(LoadedScene { document, buffers })
}

pub fn load_scene(path: &Path) -> Result<LoadedScene> {
    let bytes = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    parse_scene(&bytes, path.parent())
}
