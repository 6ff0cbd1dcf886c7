//! Command dispatch
//!
//! Every command reads its inputs, converts fully in memory and only then
//! writes its outputs, so a failed run leaves no partial files behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rig_common::{
    read_animation, read_map_geometry, read_skeleton, read_skinned_mesh, read_static_object,
    read_weights, write_skeleton, write_skinned_mesh, FormatError,
};
use walkdir::WalkDir;

use crate::animation::NamedAnimation;
use crate::config::Config;
use crate::convert::{convert_simple_skin, convert_skinned_model};
use crate::error::{ConvertError, Result};
use crate::info::MeshInfo;
use crate::legacy::synthesize_legacy_skin;
use crate::map_geometry::convert_map_geometry;
use crate::report::ConversionReport;
use crate::reverse::reverse_convert;
use crate::scene::{load_scene, OutputContainer, Scene};
use crate::textures::{resolve_material_textures, TextureSource};

/// Where the clips of a skinned model come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationSource {
    /// Explicit files; each clip is named after its file stem
    Files(Vec<PathBuf>),
    /// Every file in a directory (not recursive) with the configured extension
    Directory(PathBuf),
}

impl Default for AnimationSource {
    fn default() -> Self {
        AnimationSource::Files(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SimpleSkin {
        mesh: PathBuf,
        output: PathBuf,
        textures: Vec<String>,
    },
    SkinnedModel {
        mesh: PathBuf,
        skeleton: PathBuf,
        animations: AnimationSource,
        textures: Vec<String>,
        output: PathBuf,
    },
    DumpInfo {
        mesh: PathBuf,
    },
    LegacySkin {
        static_object: PathBuf,
        weights: PathBuf,
        output: PathBuf,
    },
    MapGeometry {
        map: PathBuf,
        output: PathBuf,
        textures: Vec<String>,
    },
    Reverse {
        scene: PathBuf,
        mesh_out: PathBuf,
        skeleton_out: PathBuf,
    },
}

/// What a successful command produced
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Converted(ConversionReport),
    Info(MeshInfo),
}

impl Command {
    pub fn run(&self, config: &Config, source: &dyn TextureSource) -> Result<Outcome> {
        let generator = config.output.generator.as_str();

        match self {
            Command::SimpleSkin {
                mesh,
                output,
                textures,
            } => {
                tracing::info!("Converting {} -> {}", mesh.display(), output.display());
                let mesh = decode(mesh, read_skinned_mesh)?;
                let textures = resolve_material_textures(textures.as_slice(), source)?;
                let (scene, report) = convert_simple_skin(&mesh, &textures, generator)?;
                write_scene(&scene, output)?;
                Ok(Outcome::Converted(report))
            }

            Command::SkinnedModel {
                mesh,
                skeleton,
                animations,
                textures,
                output,
            } => {
                tracing::info!("Converting {} -> {}", mesh.display(), output.display());
                let mesh = decode(mesh, read_skinned_mesh)?;
                let skeleton = decode(skeleton, read_skeleton)?;
                let animations = load_animations(animations, &config.animations.extension)?;
                let textures = resolve_material_textures(textures.as_slice(), source)?;
                let (scene, report) =
                    convert_skinned_model(&mesh, &skeleton, &animations, &textures, generator)?;
                write_scene(&scene, output)?;
                Ok(Outcome::Converted(report))
            }

            Command::DumpInfo { mesh } => {
                let mesh = decode(mesh, read_skinned_mesh)?;
                Ok(Outcome::Info(MeshInfo::from_mesh(&mesh)))
            }

            Command::LegacySkin {
                static_object,
                weights,
                output,
            } => {
                tracing::info!(
                    "Synthesizing {} + {} -> {}",
                    static_object.display(),
                    weights.display(),
                    output.display()
                );
                let geometry = decode(static_object, read_static_object)?;
                let weights = decode(weights, read_weights)?;
                let (mesh, report) = synthesize_legacy_skin(&geometry, &weights, &config.weights)?;

                let mut bytes = Vec::new();
                write_skinned_mesh(&mut bytes, &mesh).map_err(|source| ConvertError::Encode {
                    path: output.clone(),
                    source,
                })?;
                write_file(output, &bytes)?;
                Ok(Outcome::Converted(report))
            }

            Command::MapGeometry {
                map,
                output,
                textures,
            } => {
                tracing::info!("Converting {} -> {}", map.display(), output.display());
                let bytes = read_file(map)?;
                let geometry =
                    read_map_geometry(&bytes).map_err(|source| ConvertError::MapContainer {
                        path: map.clone(),
                        source,
                    })?;
                let textures = resolve_material_textures(textures.as_slice(), source)?;
                let (scene, report) = convert_map_geometry(&geometry, &textures, generator)?;
                write_scene(&scene, output)?;
                Ok(Outcome::Converted(report))
            }

            Command::Reverse {
                scene,
                mesh_out,
                skeleton_out,
            } => {
                tracing::info!("Reversing {}", scene.display());
                let loaded = load_scene(scene)?;
                let rebuilt = reverse_convert(&loaded)?;

                let mut mesh_bytes = Vec::new();
                write_skinned_mesh(&mut mesh_bytes, &rebuilt.mesh).map_err(|source| {
                    ConvertError::Encode {
                        path: mesh_out.clone(),
                        source,
                    }
                })?;
                let mut skeleton_bytes = Vec::new();
                write_skeleton(&mut skeleton_bytes, &rebuilt.skeleton).map_err(|source| {
                    ConvertError::Encode {
                        path: skeleton_out.clone(),
                        source,
                    }
                })?;

                write_outputs(&[
                    (mesh_out.as_path(), mesh_bytes.as_slice()),
                    (skeleton_out.as_path(), skeleton_bytes.as_slice()),
                ])?;
                Ok(Outcome::Converted(ConversionReport::new()))
            }
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| ConvertError::io(path, e))
}

fn decode<T>(path: &Path, reader: impl FnOnce(&[u8]) -> Result<T, FormatError>) -> Result<T> {
    let bytes = read_file(path)?;
    reader(&bytes).map_err(|source| ConvertError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConvertError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| ConvertError::io(path, e))?;
    tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Write every output or none: files written before a failure are removed
fn write_outputs(outputs: &[(&Path, &[u8])]) -> Result<()> {
    for (i, (path, bytes)) in outputs.iter().enumerate() {
        if let Err(err) = write_file(path, bytes) {
            for (written, _) in &outputs[..i] {
                if let Err(e) = fs::remove_file(written) {
                    tracing::warn!("Failed to remove {}: {e}", written.display());
                }
            }
            return Err(err);
        }
    }
    Ok(())
}

fn write_scene(scene: &Scene, output: &Path) -> Result<()> {
    let bytes = scene.encode(OutputContainer::for_path(output))?;
    write_file(output, &bytes)
}

fn clip_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Animation files in a directory, sorted by file name
pub fn scan_animation_dir(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ConvertError::io(
            dir,
            io::Error::new(io::ErrorKind::NotFound, "not a directory"),
        ));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| ConvertError::io(dir, e.into()))?;
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if entry.file_type().is_file() && matches {
            files.push(entry.into_path());
        }
    }

    tracing::debug!("Found {} animations in {}", files.len(), dir.display());
    Ok(files)
}

fn load_animations(source: &AnimationSource, extension: &str) -> Result<Vec<NamedAnimation>> {
    let paths = match source {
        AnimationSource::Files(paths) => paths.clone(),
        AnimationSource::Directory(dir) => scan_animation_dir(dir, extension)?,
    };

    paths
        .iter()
        .map(|path| {
            let animation = decode(path, read_animation)?;
            Ok(NamedAnimation::new(clip_name(path), animation))
        })
        .collect()
}
