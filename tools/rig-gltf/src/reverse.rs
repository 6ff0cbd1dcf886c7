//! glTF skinned scenes back to engine assets
//!
//! Only a scene with exactly one skin is accepted. The skin's joint list
//! becomes the skeleton (joint `n` gets id `n`), and every triangle
//! primitive on a node bound to that skin becomes one submesh range.

use glam::Mat4;
use gltf::mesh::Mode;
use hashbrown::HashMap;
use rig_common::{Joint, Skeleton, SkinnedMesh, SkinnedVertex, Transform};

use crate::error::{ConvertError, Result};
use crate::scene::LoadedScene;

/// Engine assets rebuilt from a scene
#[derive(Debug, Clone)]
pub struct ReverseOutput {
    pub mesh: SkinnedMesh,
    pub skeleton: Skeleton,
}

pub fn reverse_convert(scene: &LoadedScene) -> Result<ReverseOutput> {
    let document = &scene.document;
    let skins: Vec<gltf::Skin<'_>> = document.skins().collect();
    let [skin] = skins.as_slice() else {
        return Err(ConvertError::unsupported(format!(
            "scene has {} skins, exactly one is required",
            skins.len()
        )));
    };

    let skeleton = rebuild_skeleton(scene, skin)?;
    let mesh = rebuild_mesh(scene, skin, skeleton.len())?;

    tracing::info!(
        "Rebuilt {} joints and {} ranges from skin {}",
        skeleton.len(),
        mesh.ranges.len(),
        skin.name().unwrap_or("(unnamed)")
    );
    Ok(ReverseOutput { mesh, skeleton })
}

fn rebuild_skeleton(scene: &LoadedScene, skin: &gltf::Skin<'_>) -> Result<Skeleton> {
    let joint_nodes: Vec<gltf::Node<'_>> = skin.joints().collect();
    if joint_nodes.is_empty() {
        return Err(ConvertError::unsupported("skin has no joints"));
    }
    if joint_nodes.len() > usize::from(u16::MAX) + 1 {
        return Err(ConvertError::unsupported(format!(
            "skin has {} joints",
            joint_nodes.len()
        )));
    }

    let joint_of_node: HashMap<usize, usize> = joint_nodes
        .iter()
        .enumerate()
        .map(|(joint, node)| (node.index(), joint))
        .collect();

    let mut parent_of_node = HashMap::new();
    for node in scene.document.nodes() {
        for child in node.children() {
            parent_of_node.insert(child.index(), node.index());
        }
    }

    let inverse_binds: Vec<[f32; 16]> = match skin
        .reader(|b| scene.buffer(b))
        .read_inverse_bind_matrices()
    {
        Some(matrices) => matrices.map(|m| Mat4::from_cols_array_2d(&m).to_cols_array()).collect(),
        None => vec![Mat4::IDENTITY.to_cols_array(); joint_nodes.len()],
    };
    if inverse_binds.len() < joint_nodes.len() {
        return Err(ConvertError::unsupported(format!(
            "skin has {} joints but {} inverse bind matrices",
            joint_nodes.len(),
            inverse_binds.len()
        )));
    }

    let joints = joint_nodes
        .iter()
        .enumerate()
        .map(|(index, node)| {
            // Non-joint ancestors (armature nodes) make this joint a root
            let parent = parent_of_node
                .get(&node.index())
                .and_then(|p| joint_of_node.get(p))
                .copied();
            let (translation, rotation, scale) = node.transform().decomposed();
            let name = node
                .name()
                .map_or_else(|| format!("joint_{index}"), str::to_string);

            let mut joint = Joint::new(
                name,
                index as u16,
                parent,
                Transform {
                    translation,
                    rotation,
                    scale,
                },
            );
            joint.inverse_bind = inverse_binds[index];
            joint
        })
        .collect();

    let skeleton = Skeleton::new(joints);
    if let Some(name) = skeleton.duplicate_name() {
        return Err(ConvertError::unsupported(format!(
            "skin joint name '{name}' is used more than once"
        )));
    }
    Ok(skeleton)
}

fn rebuild_mesh(scene: &LoadedScene, skin: &gltf::Skin<'_>, joint_count: usize) -> Result<SkinnedMesh> {
    let mut mesh = SkinnedMesh::new();

    let skinned_nodes = scene
        .document
        .nodes()
        .filter(|n| n.skin().is_some_and(|s| s.index() == skin.index()));

    for node in skinned_nodes {
        let Some(gltf_mesh) = node.mesh() else {
            continue;
        };
        for primitive in gltf_mesh.primitives() {
            let material = primitive
                .material()
                .name()
                .map(str::to_string)
                .or_else(|| gltf_mesh.name().map(str::to_string))
                .unwrap_or_else(|| format!("material_{}", mesh.ranges.len()));
            let (vertices, indices) = read_primitive(scene, &primitive, joint_count, &material)?;
            mesh.push_submesh(material, &vertices, &indices);
        }
    }

    if mesh.ranges.is_empty() {
        return Err(ConvertError::unsupported(
            "skin has no bound mesh primitives",
        ));
    }
    Ok(mesh)
}

fn read_primitive(
    scene: &LoadedScene,
    primitive: &gltf::Primitive<'_>,
    joint_count: usize,
    material: &str,
) -> Result<(Vec<SkinnedVertex>, Vec<u32>)> {
    if primitive.mode() != Mode::Triangles {
        return Err(ConvertError::unsupported(format!(
            "primitive '{}' uses {:?}, only triangles are supported",
            material,
            primitive.mode()
        )));
    }

    let reader = primitive.reader(|b| scene.buffer(b));
    let positions: Vec<[f32; 3]> = reader
        .read_positions()
        .ok_or_else(|| ConvertError::unsupported(format!("primitive '{material}' has no POSITION")))?
        .collect();
    let joints: Vec<[u16; 4]> = reader
        .read_joints(0)
        .ok_or_else(|| ConvertError::unsupported(format!("primitive '{material}' has no JOINTS_0")))?
        .into_u16()
        .collect();
    let weights: Vec<[f32; 4]> = reader
        .read_weights(0)
        .ok_or_else(|| {
            ConvertError::unsupported(format!("primitive '{material}' has no WEIGHTS_0"))
        })?
        .into_f32()
        .collect();
    let normals: Option<Vec<[f32; 3]>> = reader.read_normals().map(Iterator::collect);
    let uvs: Option<Vec<[f32; 2]>> = reader.read_tex_coords(0).map(|t| t.into_f32().collect());

    if joints.len() != positions.len() || weights.len() != positions.len() {
        return Err(ConvertError::unsupported(format!(
            "primitive '{material}' attribute counts differ"
        )));
    }

    let mut vertices = Vec::with_capacity(positions.len());
    for (i, position) in positions.iter().enumerate() {
        let mut bone_indices = [0u8; 4];
        for (slot, &joint) in joints[i].iter().enumerate() {
            if usize::from(joint) >= joint_count {
                return Err(ConvertError::unsupported(format!(
                    "primitive '{material}' references joint {joint} of {joint_count}"
                )));
            }
            bone_indices[slot] = u8::try_from(joint).map_err(|_| {
                ConvertError::unsupported(format!(
                    "primitive '{material}' references joint {joint}, bone indices stop at 255"
                ))
            })?;
        }

        let mut vertex = SkinnedVertex {
            position: *position,
            bone_indices,
            weights: weights[i],
            ..Default::default()
        };
        if let Some(normals) = &normals {
            vertex.normal = normals.get(i).copied().unwrap_or(vertex.normal);
        }
        if let Some(uvs) = &uvs {
            vertex.uv = uvs.get(i).copied().unwrap_or(vertex.uv);
        }
        vertices.push(vertex);
    }

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..vertices.len() as u32).collect(),
    };
    if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
        return Err(ConvertError::unsupported(format!(
            "primitive '{material}' index {bad} is outside its {} vertices",
            vertices.len()
        )));
    }

    Ok((vertices, indices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::NamedAnimation;
    use crate::convert::convert_skinned_model;
    use crate::error::ErrorKind;
    use crate::scene::parse_scene;
    use crate::textures::MaterialTextures;

    fn rotated(angle: f32) -> Transform {
        let q = glam::Quat::from_rotation_z(angle);
        Transform {
            translation: [0.0, 1.0, 0.0],
            rotation: q.to_array(),
            scale: [1.0; 3],
        }
    }

    fn sample_inputs() -> (SkinnedMesh, Skeleton) {
        let mut skeleton = Skeleton::new(vec![
            Joint::new("Root", 0, None, Transform::IDENTITY),
            Joint::new("Spine", 1, Some(0), rotated(0.5)),
            Joint::new("Head", 2, Some(1), rotated(-0.25)),
        ]);
        assert!(skeleton.derive_inverse_binds());

        let vertex = |x: f32, bone: u8| SkinnedVertex {
            position: [x, x * 0.5, 0.0],
            bone_indices: [bone, 0, 0, 0],
            ..Default::default()
        };
        let mut mesh = SkinnedMesh::new();
        mesh.push_submesh("Body", &[vertex(0.0, 0), vertex(1.0, 1), vertex(2.0, 2)], &[0, 1, 2]);
        mesh.push_submesh("Hair", &[vertex(3.0, 2), vertex(4.0, 2), vertex(5.0, 1)], &[2, 1, 0]);
        (mesh, skeleton)
    }

    fn round_trip(mesh: &SkinnedMesh, skeleton: &Skeleton) -> ReverseOutput {
        let animations: [NamedAnimation; 0] = [];
        let (scene, _) =
            convert_skinned_model(mesh, skeleton, &animations, &MaterialTextures::new(), "test")
                .unwrap();
        let loaded = parse_scene(&scene.to_glb().unwrap(), None).unwrap();
        reverse_convert(&loaded).unwrap()
    }

    #[test]
    fn test_round_trip_keeps_ranges() {
        let (mesh, skeleton) = sample_inputs();
        let output = round_trip(&mesh, &skeleton);

        assert_eq!(output.mesh.ranges, mesh.ranges);
        assert_eq!(output.mesh.indices, mesh.indices);
        for (a, b) in output.mesh.vertices.iter().zip(&mesh.vertices) {
            assert_eq!(a.position, b.position);
            assert_eq!(a.bone_indices, b.bone_indices);
        }
        assert!(output.skeleton.influences.is_empty());
    }

    #[test]
    fn test_round_trip_keeps_inverse_binds() {
        let (mesh, skeleton) = sample_inputs();
        let output = round_trip(&mesh, &skeleton);

        for (a, b) in output.skeleton.joints.iter().zip(&skeleton.joints) {
            for (x, y) in a.inverse_bind.iter().zip(&b.inverse_bind) {
                assert!((x - y).abs() < 1e-5);
            }
        }
    }

    fn reverse_with_renamed_joints(rename: &[(&str, Option<&str>)]) -> Result<ReverseOutput> {
        let (mesh, skeleton) = sample_inputs();
        let (mut scene, _) =
            convert_skinned_model(&mesh, &skeleton, &[], &MaterialTextures::new(), "test").unwrap();
        for &(from, to) in rename {
            let node = scene
                .root
                .nodes
                .iter_mut()
                .find(|n| n.name.as_deref() == Some(from))
                .unwrap();
            node.name = to.map(str::to_string);
        }
        let loaded = parse_scene(&scene.to_glb().unwrap(), None).unwrap();
        reverse_convert(&loaded)
    }

    #[test]
    fn test_repeated_joint_names_rejected() {
        let err = reverse_with_renamed_joints(&[("Spine", Some("Root"))]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedScene);
        assert!(err.to_string().contains("'Root'"));
    }

    #[test]
    fn test_fallback_name_collision_rejected() {
        // Unnamed joint 1 falls back to "joint_1", which Head already uses
        let err = reverse_with_renamed_joints(&[("Spine", None), ("Head", Some("joint_1"))])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedScene);

        let output = reverse_with_renamed_joints(&[("Spine", None)]).unwrap();
        assert_eq!(output.skeleton.joints[1].name, "joint_1");
    }

    #[test]
    fn test_scene_without_skin() {
        let (mesh, _) = sample_inputs();
        let (scene, _) =
            crate::convert::convert_simple_skin(&mesh, &MaterialTextures::new(), "test").unwrap();
        let loaded = parse_scene(&scene.to_glb().unwrap(), None).unwrap();

        let err = reverse_convert(&loaded).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedScene);
        assert!(err.to_string().contains("0 skins"));
    }
}
