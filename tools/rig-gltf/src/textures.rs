//! Material to texture bindings
//!
//! Bindings arrive as `material:path` strings. The path half may carry a
//! drive letter (`Body:C:/textures/body.dds`), so a string splits into either
//! two or three non-empty segments.
//!
//! Resolved textures are always stored as PNG bytes. Decoding and
//! re-encoding belong to a [`TextureSource`].

use std::io::Cursor;
use std::path::{Path, PathBuf};

use hashbrown::{HashMap, HashSet};
use image::ImageFormat;
use rayon::prelude::*;

use crate::error::{ConvertError, Result};

/// One parsed `material:path` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBinding {
    pub material: String,
    pub path: PathBuf,
}

/// Parse a single `material:path` string
pub fn parse_binding(entry: &str) -> Result<TextureBinding> {
    let segments: Vec<&str> = entry.split(':').filter(|s| !s.is_empty()).collect();

    let (material, path) = match segments.as_slice() {
        [material, path] => (*material, path.to_string()),
        [material, drive, rest] => (*material, format!("{drive}:{rest}")),
        _ => {
            return Err(ConvertError::Format(format!(
                "Invalid texture binding '{entry}': expected material:path"
            )))
        }
    };

    Ok(TextureBinding {
        material: material.to_string(),
        path: PathBuf::from(path),
    })
}

/// Parse every entry, rejecting a material that appears twice
pub fn parse_bindings<S: AsRef<str>>(entries: &[S]) -> Result<Vec<TextureBinding>> {
    let mut seen = HashSet::with_capacity(entries.len());
    let mut bindings = Vec::with_capacity(entries.len());

    for entry in entries {
        let binding = parse_binding(entry.as_ref())?;
        if !seen.insert(binding.material.clone()) {
            return Err(ConvertError::DuplicateKey(binding.material));
        }
        bindings.push(binding);
    }

    Ok(bindings)
}

/// Material name to encoded PNG bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialTextures(HashMap<String, Vec<u8>>);

impl MaterialTextures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, material: impl Into<String>, png: Vec<u8>) -> Result<()> {
        let material = material.into();
        if self.0.contains_key(&material) {
            return Err(ConvertError::DuplicateKey(material));
        }
        self.0.insert(material, png);
        Ok(())
    }

    pub fn get(&self, material: &str) -> Option<&[u8]> {
        self.0.get(material).map(Vec::as_slice)
    }

    pub fn materials(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Loads an image file and hands back PNG bytes
pub trait TextureSource: Sync {
    fn load_png(&self, path: &Path) -> Result<Vec<u8>>;
}

/// Decodes anything the `image` crate reads and re-encodes it as PNG
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileSource;

impl TextureSource for ImageFileSource {
    fn load_png(&self, path: &Path) -> Result<Vec<u8>> {
        let texture_error = |source| ConvertError::Texture {
            path: path.to_path_buf(),
            source,
        };

        let img = image::open(path).map_err(texture_error)?;
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(texture_error)?;

        tracing::debug!(
            "Loaded texture {} ({}x{}, {} bytes as PNG)",
            path.display(),
            img.width(),
            img.height(),
            png.len()
        );
        Ok(png)
    }
}

/// Parse bindings and load every texture
///
/// Textures load in parallel; the first failure in input order is returned.
pub fn resolve_material_textures<S: AsRef<str>>(
    entries: &[S],
    source: &dyn TextureSource,
) -> Result<MaterialTextures> {
    let bindings = parse_bindings(entries)?;

    let loaded: Vec<Result<Vec<u8>>> = bindings
        .par_iter()
        .map(|binding| source.load_png(&binding.path))
        .collect();

    let mut textures = MaterialTextures::new();
    for (binding, png) in bindings.into_iter().zip(loaded) {
        textures.insert(binding.material, png?)?;
    }

    if !textures.is_empty() {
        tracing::info!("Resolved {} texture bindings", textures.len());
    }
    Ok(textures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Returns the path bytes as the "PNG" payload
    struct EchoSource {
        calls: AtomicUsize,
    }

    impl TextureSource for EchoSource {
        fn load_png(&self, path: &Path) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if path.to_string_lossy().contains("missing") {
                return Err(ConvertError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
                ));
            }
            Ok(path.to_string_lossy().as_bytes().to_vec())
        }
    }

    fn echo() -> EchoSource {
        EchoSource {
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn test_parse_relative_path() {
        let binding = parse_binding("Body:textures/body.dds").unwrap();
        assert_eq!(binding.material, "Body");
        assert_eq!(binding.path, PathBuf::from("textures/body.dds"));
    }

    #[test]
    fn test_parse_drive_letter_path() {
        let binding = parse_binding("Body:C:/textures/body.dds").unwrap();
        assert_eq!(binding.material, "Body");
        assert_eq!(binding.path, PathBuf::from("C:/textures/body.dds"));
    }

    #[test]
    fn test_parse_without_colon() {
        let err = parse_binding("BadEntry").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_parse_rejects_other_segment_counts() {
        for entry in ["", ":", "Body:", ":body.dds", "a:b:c:d"] {
            let err = parse_binding(entry).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Format, "entry {entry:?}");
        }
    }

    #[test]
    fn test_empty_segments_are_discarded() {
        let binding = parse_binding("Body::body.dds").unwrap();
        assert_eq!(binding.path, PathBuf::from("body.dds"));
    }

    #[test]
    fn test_duplicate_material() {
        let err = parse_bindings(&["Body:a.png", "Hair:b.png", "Body:c.png"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert!(err.to_string().contains("'Body'"));
    }

    #[test]
    fn test_resolve_keeps_every_binding() {
        let source = echo();
        let textures =
            resolve_material_textures(&["Body:body.png", "Hair:C:/hair.tga"], &source).unwrap();

        assert_eq!(textures.len(), 2);
        assert_eq!(textures.get("Hair"), Some(&b"C:/hair.tga"[..]));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_duplicate_detected_before_loading() {
        let source = echo();
        let err = resolve_material_textures(&["Body:a.png", "Body:b.png"], &source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_load_failure_aborts() {
        let err = resolve_material_textures(&["Body:a.png", "Hair:missing.png"], &echo())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_image_file_source_reencodes_as_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checker.bmp");
        let img = image::RgbaImage::from_fn(4, 4, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgba([255, 0, 0, 255])
            } else {
                image::Rgba([0, 0, 255, 255])
            }
        });
        img.save_with_format(&path, ImageFormat::Bmp).unwrap();

        let png = ImageFileSource.load_png(&path).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(1, 0), &image::Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_image_file_source_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageFileSource
            .load_png(&dir.path().join("nope.png"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
