//! Non-fatal findings collected during a conversion

use std::fmt;

/// A condition the conversion recovered from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// An animation has tracks for joints the skeleton does not contain
    Compatibility {
        animation: String,
        missing_joints: Vec<String>,
    },
    /// A material has no texture binding and was emitted untextured
    UntexturedMaterial { material: String },
    /// A texture binding names a material the input never uses
    UnusedTexture { material: String },
    /// Vertices whose weights were rescaled to sum to one
    RenormalizedWeights { vertices: usize },
    /// Vertices with no weight, bound to the root joint
    OrphanVertices { vertices: usize },
    /// Vertices no submesh referenced, left out of the output
    DroppedVertices { vertices: usize },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Compatibility {
                animation,
                missing_joints,
            } => write!(
                f,
                "animation '{}' references joints missing from the skeleton: {}",
                animation,
                missing_joints.join(", ")
            ),
            Warning::UntexturedMaterial { material } => {
                write!(f, "material '{material}' has no texture binding")
            }
            Warning::UnusedTexture { material } => {
                write!(f, "texture bound to '{material}' is not used by any submesh")
            }
            Warning::RenormalizedWeights { vertices } => {
                write!(f, "renormalized weights of {vertices} vertices")
            }
            Warning::OrphanVertices { vertices } => {
                write!(f, "bound {vertices} unweighted vertices to joint 0")
            }
            Warning::DroppedVertices { vertices } => {
                write!(f, "dropped {vertices} vertices not used by any submesh")
            }
        }
    }
}

/// Result of a successful conversion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversionReport {
    pub warnings: Vec<Warning>,
}

impl ConversionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a warning and log it
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn compatibility_warnings(&self) -> impl Iterator<Item = &Warning> {
        self.warnings
            .iter()
            .filter(|w| matches!(w, Warning::Compatibility { .. }))
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}
