use std::io;

/// Error type for reading and writing the engine binary formats.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// Truncated input or a failed write
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Bad magic: expected {expected}, found {found}")]
    BadMagic { expected: String, found: String },

    #[error("Unsupported version {major}.{minor}")]
    UnsupportedVersion { major: u32, minor: u32 },

    #[error("Invalid data: {0}")]
    Invalid(String),

    #[error("Too many {what}: {value} (limit {limit})")]
    Limit {
        what: &'static str,
        value: usize,
        limit: usize,
    },
}

impl FormatError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Check a magic value, rendering both sides for the error message
    pub(crate) fn check_magic(expected: &[u8], found: &[u8]) -> Result<(), Self> {
        if expected == found {
            return Ok(());
        }
        Err(Self::BadMagic {
            expected: render_magic(expected),
            found: render_magic(found),
        })
    }

    /// Fail with [`FormatError::Limit`] when `value` exceeds `limit`
    pub(crate) fn check_limit(what: &'static str, value: usize, limit: usize) -> Result<(), Self> {
        if value > limit {
            return Err(Self::Limit { what, value, limit });
        }
        Ok(())
    }
}

fn render_magic(bytes: &[u8]) -> String {
    if bytes.iter().all(|b| b.is_ascii_graphic()) {
        String::from_utf8_lossy(bytes).into_owned()
    } else {
        bytes.iter().map(|b| format!("{b:02x}")).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_rendering() {
        let err = FormatError::check_magic(b"r3d2sklt", b"r3d2anmd").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Bad magic: expected r3d2sklt, found r3d2anmd"
        );

        let err = FormatError::check_magic(&[0x33, 0x22, 0x11, 0x00], &[0, 0, 0, 1]).unwrap_err();
        assert_eq!(err.to_string(), "Bad magic: expected 33221100, found 00000001");
    }

    #[test]
    fn test_limit() {
        assert!(FormatError::check_limit("joints", 10, 10).is_ok());
        let err = FormatError::check_limit("joints", 11, 10).unwrap_err();
        assert_eq!(err.to_string(), "Too many joints: 11 (limit 10)");
    }
}
