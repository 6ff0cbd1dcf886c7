//! Engine assets built in memory for integration tests.
//!
//! - Two-range skinned mesh (Body, Hair) over a 3-joint skeleton
//! - Root -> Spine -> Head skeleton with derived inverse bind matrices
//! - Keyframed clips with configurable joint names
//! - Static quad with a weight table, and a two-model map

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use glam::{Mat4, Quat, Vec3};
use rig_common::{
    write_animation, write_map_geometry, write_skeleton, write_skinned_mesh, write_static_object,
    write_weights, Animation, Joint, Keyframe, MapGeometry, MapModel, MapSubmesh, Skeleton,
    SkinnedMesh, SkinnedVertex, StaticGeometry, StaticSubmesh, StaticVertex, Track, Transform,
    VertexWeights,
};

pub const JOINT_NAMES: [&str; 3] = ["Root", "Spine", "Head"];

fn segment_vertex(x: f32, y: f32, bone: u8) -> SkinnedVertex {
    SkinnedVertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, 1.0],
        uv: [x, y / 3.0],
        bone_indices: [bone, bone.saturating_sub(1), 0, 0],
        weights: [0.75, 0.25, 0.0, 0.0],
    }
}

/// Body covers joints 0-1, Hair sits on the head
pub fn sample_mesh() -> SkinnedMesh {
    let mut mesh = SkinnedMesh::new();
    mesh.push_submesh(
        "Body",
        &[
            segment_vertex(0.0, 0.0, 0),
            segment_vertex(1.0, 0.0, 0),
            segment_vertex(0.0, 1.0, 1),
            segment_vertex(1.0, 1.0, 1),
        ],
        &[0, 1, 2, 2, 1, 3],
    );
    mesh.push_submesh(
        "Hair",
        &[
            segment_vertex(0.0, 2.0, 2),
            segment_vertex(1.0, 2.0, 2),
            segment_vertex(0.5, 3.0, 2),
        ],
        &[0, 1, 2],
    );
    mesh
}

pub fn sample_skeleton() -> Skeleton {
    let bone = |y: f32, angle: f32| Transform {
        translation: [0.0, y, 0.0],
        rotation: Quat::from_rotation_z(angle).to_array(),
        scale: [1.0; 3],
    };
    let mut skeleton = Skeleton::new(vec![
        Joint::new(JOINT_NAMES[0], 10, None, Transform::IDENTITY),
        Joint::new(JOINT_NAMES[1], 11, Some(0), bone(1.0, 0.2)),
        Joint::new(JOINT_NAMES[2], 12, Some(1), bone(1.0, -0.1)),
    ]);
    assert!(skeleton.derive_inverse_binds());
    skeleton
}

/// A 3-keyframe clip with one track per named joint
pub fn sample_animation(joints: &[&str]) -> Animation {
    let tracks = joints
        .iter()
        .map(|joint| Track {
            joint: joint.to_string(),
            keyframes: (0..3)
                .map(|i| {
                    let t = i as f32 * 0.5;
                    Keyframe {
                        time: t,
                        translation: [0.0, 1.0, 0.0],
                        // Deliberately not unit length
                        rotation: (Quat::from_rotation_x(t) * 2.0).to_array(),
                        scale: [1.0; 3],
                    }
                })
                .collect(),
        })
        .collect();
    Animation { tracks }
}

/// Quad in two materials plus one vertex no submesh references
pub fn sample_static_object() -> StaticGeometry {
    let vertex = |x: f32, y: f32| StaticVertex {
        position: [x, y, 0.0],
        normal: [0.0, 0.0, 1.0],
        uv: [x, y],
    };
    StaticGeometry {
        name: "crate".to_string(),
        vertices: vec![
            vertex(0.0, 0.0),
            vertex(1.0, 0.0),
            vertex(1.0, 1.0),
            vertex(0.0, 1.0),
            vertex(5.0, 5.0),
        ],
        submeshes: vec![
            StaticSubmesh {
                material: "Wood".to_string(),
                indices: vec![0, 1, 2],
            },
            StaticSubmesh {
                material: "Metal".to_string(),
                indices: vec![0, 2, 3],
            },
        ],
    }
}

/// One entry per vertex: a clean pair, an unnormalized pair, and an orphan
pub fn sample_weights(count: usize) -> Vec<VertexWeights> {
    (0..count)
        .map(|i| match i % 3 {
            0 => VertexWeights {
                bone_indices: [0, 1, 0, 0],
                weights: [0.5, 0.5, 0.0, 0.0],
            },
            1 => VertexWeights {
                bone_indices: [1, 2, 0, 0],
                weights: [3.0, 1.0, 0.0, 0.0],
            },
            _ => VertexWeights::default(),
        })
        .collect()
}

pub fn sample_map() -> MapGeometry {
    let model = |name: &str, offset: f32, materials: &[&str]| {
        let mut indices = Vec::new();
        let submeshes = materials
            .iter()
            .map(|material| {
                let submesh = MapSubmesh {
                    material: material.to_string(),
                    start_index: indices.len() as u32,
                    index_count: 3,
                };
                indices.extend([0u32, 1, 2]);
                submesh
            })
            .collect();
        MapModel {
            name: name.to_string(),
            transform: Mat4::from_translation(Vec3::new(offset, 0.0, 0.0)).to_cols_array(),
            vertices: (0..3)
                .map(|i| StaticVertex {
                    position: [i as f32, (i % 2) as f32, 0.0],
                    normal: [0.0, 1.0, 0.0],
                    uv: [0.0, 0.0],
                })
                .collect(),
            indices,
            submeshes,
        }
    };
    MapGeometry {
        models: vec![
            model("Floor", 0.0, &["Stone"]),
            model("Pillar", 4.0, &["Stone", "Moss"]),
        ],
    }
}

pub fn write_mesh_file(path: &Path, mesh: &SkinnedMesh) {
    let mut bytes = Vec::new();
    write_skinned_mesh(&mut bytes, mesh).expect("Failed to encode mesh");
    fs::write(path, bytes).expect("Failed to write mesh");
}

pub fn write_skeleton_file(path: &Path, skeleton: &Skeleton) {
    let mut bytes = Vec::new();
    write_skeleton(&mut bytes, skeleton).expect("Failed to encode skeleton");
    fs::write(path, bytes).expect("Failed to write skeleton");
}

pub fn write_animation_file(path: &Path, animation: &Animation) {
    let mut bytes = Vec::new();
    write_animation(&mut bytes, animation).expect("Failed to encode animation");
    fs::write(path, bytes).expect("Failed to write animation");
}

pub fn write_static_object_file(path: &Path, geometry: &StaticGeometry) {
    let mut bytes = Vec::new();
    write_static_object(&mut bytes, geometry).expect("Failed to encode static object");
    fs::write(path, bytes).expect("Failed to write static object");
}

pub fn write_weights_file(path: &Path, weights: &[VertexWeights]) {
    let mut bytes = Vec::new();
    write_weights(&mut bytes, weights).expect("Failed to encode weights");
    fs::write(path, bytes).expect("Failed to write weights");
}

pub fn write_map_file(path: &Path, map: &MapGeometry) {
    let mut bytes = Vec::new();
    write_map_geometry(&mut bytes, map).expect("Failed to encode map geometry");
    fs::write(path, bytes).expect("Failed to write map geometry");
}

/// 4x4 checkerboard PNG
pub fn write_checkerboard_png(path: &Path) {
    let img = image::RgbaImage::from_fn(4, 4, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([255, 255, 255, 255])
        } else {
            image::Rgba([0, 0, 0, 255])
        }
    });
    img.save(path).expect("Failed to write PNG");
}
