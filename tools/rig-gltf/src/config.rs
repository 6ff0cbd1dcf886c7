//! rig-gltf.toml configuration
//!
//! Every section and field is optional; a missing file means defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// File looked up in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "rig-gltf.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub weights: WeightPolicy,
    #[serde(default)]
    pub animations: AnimationsSection,
    #[serde(default)]
    pub output: OutputSection,
}

/// How legacy skin synthesis treats weight tables
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightPolicy {
    /// Allowed deviation of a weight sum from 1.0
    /// Default: 0.0001
    #[serde(default = "default_tolerance")]
    pub tolerance: f32,

    /// Rescale out-of-tolerance sums instead of rejecting them
    /// Default: true
    #[serde(default = "default_true")]
    pub renormalize: bool,

    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
}

impl Default for WeightPolicy {
    fn default() -> Self {
        Self {
            tolerance: default_tolerance(),
            renormalize: true,
            orphan_policy: OrphanPolicy::default(),
        }
    }
}

/// What to do with a vertex whose weights sum to zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrphanPolicy {
    /// Bind it fully to joint 0
    #[default]
    BindToRoot,
    /// Fail the conversion
    Reject,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnimationsSection {
    /// Extension matched when scanning an animations directory
    /// Default: "anm"
    #[serde(default = "default_animation_extension")]
    pub extension: String,
}

impl Default for AnimationsSection {
    fn default() -> Self {
        Self {
            extension: default_animation_extension(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    /// Written to `asset.generator`
    /// Default: "rig-gltf"
    #[serde(default = "default_generator")]
    pub generator: String,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            generator: default_generator(),
        }
    }
}

fn default_tolerance() -> f32 {
    1e-4
}

fn default_true() -> bool {
    true
}

fn default_animation_extension() -> String {
    rig_common::ANIMATION_EXT.to_string()
}

fn default_generator() -> String {
    "rig-gltf".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Parse configuration from string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse rig-gltf.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Explicit path, else `rig-gltf.toml` in `dir` if present, else defaults
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!("Using config {}", candidate.display());
            return Self::load(&candidate);
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        let tolerance = self.weights.tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            anyhow::bail!("weights.tolerance must be a non-negative number, got {tolerance}");
        }
        if self.animations.extension.is_empty() {
            anyhow::bail!("animations.extension must not be empty");
        }
        Ok(())
    }
}
