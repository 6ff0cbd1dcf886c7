//! Conversion error type
//!
//! Every failure maps to one [`ErrorKind`], which the binary turns into a
//! process exit code.

use std::io;
use std::path::PathBuf;

use rig_common::FormatError;

/// Broad failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed binding string or file structure
    Format,
    /// Repeated material name
    DuplicateKey,
    /// Missing, unreadable or unwritable file
    Io,
    /// Structural invariant violated, or data the engine format cannot hold
    Validation,
    /// Static geometry and weight table disagree on vertex count
    Mismatch,
    /// Scene shape the reverse path cannot handle
    UnsupportedScene,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Format => 3,
            ErrorKind::DuplicateKey => 4,
            ErrorKind::Io => 5,
            ErrorKind::Validation => 6,
            ErrorKind::Mismatch => 7,
            ErrorKind::UnsupportedScene => 8,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("{0}")]
    Format(String),

    #[error("Failed to decode {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("Failed to encode {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("Malformed map geometry container {}", path.display())]
    MapContainer {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    #[error("Duplicate material '{0}' in texture bindings")]
    DuplicateKey(String),

    #[error("Failed to access {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to load texture {}", path.display())]
    Texture {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to parse glTF")]
    Gltf(#[from] gltf::Error),

    #[error("{0}")]
    Validation(String),

    #[error("Weight table has {actual} vertices but the static geometry has {expected}")]
    Mismatch { expected: usize, actual: usize },

    #[error("Unsupported scene: {0}")]
    UnsupportedScene(String),
}

impl ConvertError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::Format(_) | ConvertError::Decode { .. } => ErrorKind::Format,
            ConvertError::DuplicateKey(_) => ErrorKind::DuplicateKey,
            ConvertError::MapContainer { .. }
            | ConvertError::Io { .. }
            | ConvertError::Texture { .. } => ErrorKind::Io,
            ConvertError::Gltf(gltf::Error::Io(_)) => ErrorKind::Io,
            ConvertError::Gltf(_) => ErrorKind::Format,
            ConvertError::Validation(_) | ConvertError::Encode { .. } => ErrorKind::Validation,
            ConvertError::Mismatch { .. } => ErrorKind::Mismatch,
            ConvertError::UnsupportedScene(_) => ErrorKind::UnsupportedScene,
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ConvertError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ConvertError::Validation(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        ConvertError::UnsupportedScene(message.into())
    }
}

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_exit_codes_are_distinct() {
        let kinds = [
            ErrorKind::Format,
            ErrorKind::DuplicateKey,
            ErrorKind::Io,
            ErrorKind::Validation,
            ErrorKind::Mismatch,
            ErrorKind::UnsupportedScene,
        ];
        let mut codes: Vec<u8> = kinds.iter().map(|k| k.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
        assert!(codes.iter().all(|&c| c > 2));
    }

    #[test]
    fn test_map_container_is_io() {
        let err = ConvertError::MapContainer {
            path: "level.mapgeo".into(),
            source: FormatError::Invalid("bad submesh".into()),
        };
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.source().is_some());
    }

    #[test]
    fn test_decode_keeps_cause() {
        let err = ConvertError::Decode {
            path: "body.skn".into(),
            source: FormatError::Invalid("range 0 lies outside".into()),
        };
        assert_eq!(err.kind(), ErrorKind::Format);
        assert_eq!(err.to_string(), "Failed to decode body.skn");
        assert_eq!(
            err.source().map(|s| s.to_string()),
            Some("Invalid data: range 0 lies outside".to_string())
        );
    }
}
