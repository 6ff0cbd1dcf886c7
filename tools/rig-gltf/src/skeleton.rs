//! Skeleton checks, vertex influence resolution and joint nodes

use glam::{Quat, Vec4};
use gltf::json;
use json::Index;
use rig_common::{Skeleton, SkinnedMesh, Transform};

use crate::error::{ConvertError, Result};
use crate::mesh::SkinAttributes;
use crate::scene::SceneBuilder;

/// Most joints a u8 JOINTS_0 accessor can address
const NARROW_JOINT_LIMIT: usize = 256;

pub(crate) fn validate_skeleton(skeleton: &Skeleton) -> Result<()> {
    if skeleton.is_empty() {
        return Err(ConvertError::validation("Skeleton has no joints"));
    }
    if let Some(name) = skeleton.duplicate_name() {
        return Err(ConvertError::validation(format!(
            "Duplicate joint name '{name}' in skeleton"
        )));
    }
    if !skeleton.is_forest() {
        return Err(ConvertError::validation(
            "Skeleton parent links are out of range or cyclic",
        ));
    }
    Ok(())
}

/// Map every weighted bone index through the influence table
///
/// Slots with zero weight are pointed at joint 0 so the accessor stays in
/// range.
pub(crate) fn resolve_influences(mesh: &SkinnedMesh, skeleton: &Skeleton) -> Result<SkinAttributes> {
    let mut joints = Vec::with_capacity(mesh.vertices.len());

    for (v, vertex) in mesh.vertices.iter().enumerate() {
        let mut slots = [0u16; 4];
        for (slot, (&bone, &weight)) in vertex.bone_indices.iter().zip(&vertex.weights).enumerate() {
            if weight.is_nan() || weight < 0.0 {
                return Err(ConvertError::validation(format!(
                    "Vertex {v} has invalid weight {weight} in slot {slot}"
                )));
            }
            if weight == 0.0 {
                continue;
            }
            let joint = skeleton.resolve_influence(u16::from(bone)).ok_or_else(|| {
                ConvertError::validation(format!(
                    "Vertex {v} bone {bone} does not resolve to a joint"
                ))
            })?;
            slots[slot] = joint as u16;
        }
        joints.push(slots);
    }

    Ok(SkinAttributes {
        joints,
        wide: skeleton.len() > NARROW_JOINT_LIMIT,
    })
}

/// Unit quaternion for a stored rotation; degenerate input becomes identity
pub(crate) fn unit_rotation(rotation: [f32; 4]) -> [f32; 4] {
    Vec4::from_array(rotation)
        .try_normalize()
        .map_or(Quat::IDENTITY.to_array(), |v| v.to_array())
}

fn trs_node(name: &str, local: &Transform) -> json::Node {
    json::Node {
        name: Some(name.to_string()),
        translation: Some(local.translation),
        rotation: Some(json::scene::UnitQuaternion(unit_rotation(local.rotation))),
        scale: Some(local.scale),
        ..Default::default()
    }
}

/// One node per joint in skeleton order; roots go to the scene
///
/// Returns the node of each joint, indexed like `skeleton.joints`.
pub(crate) fn add_joint_nodes(builder: &mut SceneBuilder, skeleton: &Skeleton) -> Vec<Index<json::Node>> {
    let nodes: Vec<Index<json::Node>> = skeleton
        .joints
        .iter()
        .map(|joint| {
            let node = trs_node(&joint.name, &joint.local);
            if joint.parent.is_none() {
                builder.root_node(node)
            } else {
                builder.node(node)
            }
        })
        .collect();

    for (index, &node) in nodes.iter().enumerate() {
        let children: Vec<Index<json::Node>> =
            skeleton.children(index).map(|child| nodes[child]).collect();
        if !children.is_empty() {
            builder.node_mut(node).children = Some(children);
        }
    }

    tracing::debug!(
        "Added {} joint nodes ({} roots)",
        nodes.len(),
        skeleton.roots().count()
    );
    nodes
}

/// The single skin shared by every mesh node
pub(crate) fn add_skin(
    builder: &mut SceneBuilder,
    skeleton: &Skeleton,
    joint_nodes: &[Index<json::Node>],
) -> Index<json::Skin> {
    let matrices: Vec<[f32; 16]> = skeleton.joints.iter().map(|j| j.inverse_bind).collect();
    let inverse_bind_matrices = builder.mat4(&matrices);

    builder.skin(json::Skin {
        name: Some("Skin".to_string()),
        inverse_bind_matrices: Some(inverse_bind_matrices),
        joints: joint_nodes.to_vec(),
        skeleton: None,
        extensions: Default::default(),
        extras: Default::default(),
    })
}
