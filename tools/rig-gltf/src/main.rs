//! rig-gltf - engine asset to glTF converter
//!
//! Converts skinned meshes (.skn), skeletons (.skl), animations (.anm),
//! static objects with weight tables (.scb + .wgt) and map geometry
//! (.mapgeo) to glTF 2.0, and skinned glTF scenes back to .skn/.skl.

use std::error::Error as _;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use rig_gltf::{AnimationSource, Command, Config, ConvertError, ImageFileSource, Outcome};

#[derive(Parser)]
#[command(name = "rig-gltf")]
#[command(about = "Engine skinned asset <-> glTF converter")]
#[command(version)]
struct Cli {
    /// Config file (default: rig-gltf.toml in the working directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a skinned mesh without its skeleton
    SimpleSkin {
        /// Input .skn file
        mesh: PathBuf,

        /// Output .glb or .gltf file
        #[arg(short, long)]
        output: PathBuf,

        /// Texture binding material:path (repeatable)
        #[arg(short = 't', long = "texture")]
        textures: Vec<String>,
    },

    /// Convert a skinned mesh with its skeleton and animations
    SkinnedModel {
        /// Input .skn file
        mesh: PathBuf,

        /// Input .skl file
        skeleton: PathBuf,

        /// Output .glb or .gltf file
        #[arg(short, long)]
        output: PathBuf,

        /// Animation file (repeatable)
        #[arg(short = 'a', long = "animation", conflicts_with = "animations_dir")]
        animations: Vec<PathBuf>,

        /// Directory scanned for animation files
        #[arg(long)]
        animations_dir: Option<PathBuf>,

        /// Texture binding material:path (repeatable)
        #[arg(short = 't', long = "texture")]
        textures: Vec<String>,
    },

    /// Print bounds and submeshes of a skinned mesh
    Info {
        /// Input .skn file
        mesh: PathBuf,
    },

    /// Build a skinned mesh from a static object and a weight table
    LegacySkin {
        /// Input .scb file
        static_object: PathBuf,

        /// Input .wgt file
        weights: PathBuf,

        /// Output .skn file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert level geometry
    MapGeometry {
        /// Input .mapgeo file
        map: PathBuf,

        /// Output .glb or .gltf file
        #[arg(short, long)]
        output: PathBuf,

        /// Texture binding material:path (repeatable)
        #[arg(short = 't', long = "texture")]
        textures: Vec<String>,
    },

    /// Rebuild .skn and .skl files from a skinned glTF scene
    Reverse {
        /// Input .glb or .gltf file
        scene: PathBuf,

        /// Output .skn file
        #[arg(long)]
        mesh: PathBuf,

        /// Output .skl file
        #[arg(long)]
        skeleton: PathBuf,
    },
}

impl From<Commands> for Command {
    fn from(command: Commands) -> Self {
        match command {
            Commands::SimpleSkin {
                mesh,
                output,
                textures,
            } => Command::SimpleSkin {
                mesh,
                output,
                textures,
            },
            Commands::SkinnedModel {
                mesh,
                skeleton,
                output,
                animations,
                animations_dir,
                textures,
            } => Command::SkinnedModel {
                mesh,
                skeleton,
                animations: match animations_dir {
                    Some(dir) => AnimationSource::Directory(dir),
                    None => AnimationSource::Files(animations),
                },
                textures,
                output,
            },
            Commands::Info { mesh } => Command::DumpInfo { mesh },
            Commands::LegacySkin {
                static_object,
                weights,
                output,
            } => Command::LegacySkin {
                static_object,
                weights,
                output,
            },
            Commands::MapGeometry {
                map,
                output,
                textures,
            } => Command::MapGeometry {
                map,
                output,
                textures,
            },
            Commands::Reverse {
                scene,
                mesh,
                skeleton,
            } => Command::Reverse {
                scene,
                mesh_out: mesh,
                skeleton_out: skeleton,
            },
        }
    }
}

fn load_config(explicit: Option<PathBuf>) -> anyhow::Result<Config> {
    let dir = std::env::current_dir().context("Failed to read working directory")?;
    Config::resolve(explicit.as_deref(), &dir)
}

fn report_failure(err: &ConvertError) {
    eprintln!("Error: {err}");
    let mut cause = err.source();
    while let Some(source) = cause {
        eprintln!("  caused by: {source}");
        cause = source.source();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = match load_config(cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    let command = Command::from(cli.command);
    match command.run(&config, &ImageFileSource) {
        Ok(Outcome::Info(info)) => {
            print!("{info}");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Converted(report)) => {
            if report.is_clean() {
                tracing::info!("Done!");
            } else {
                tracing::info!("Done with {} warnings", report.warnings.len());
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            report_failure(&err);
            ExitCode::from(err.exit_code())
        }
    }
}
