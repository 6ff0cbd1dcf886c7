//! Engine assets to glTF scenes

use gltf::json;
use hashbrown::HashSet;
use rig_common::{Skeleton, SkinnedMesh};

use crate::animation::{add_clip, missing_joints, NamedAnimation};
use crate::error::Result;
use crate::mesh::{range_primitive, validate_geometry, SkinAttributes};
use crate::report::{ConversionReport, Warning};
use crate::scene::{Scene, SceneBuilder};
use crate::skeleton::{add_joint_nodes, add_skin, resolve_influences, validate_skeleton};
use crate::textures::MaterialTextures;

/// Resolve a material, warning when it has no texture
pub(crate) fn bind_material(
    builder: &mut SceneBuilder,
    name: &str,
    textures: &MaterialTextures,
    untextured: &mut HashSet<String>,
    report: &mut ConversionReport,
) -> json::Index<json::Material> {
    let png = textures.get(name);
    if png.is_none() && untextured.insert(name.to_string()) {
        report.warn(Warning::UntexturedMaterial {
            material: name.to_string(),
        });
    }
    builder.material(name, png)
}

/// Warn about bindings whose material never appeared
pub(crate) fn report_unused_textures<'a>(
    textures: &MaterialTextures,
    used: impl IntoIterator<Item = &'a str>,
    report: &mut ConversionReport,
) {
    let used: HashSet<&str> = used.into_iter().collect();
    let mut unused: Vec<&str> = textures.materials().filter(|m| !used.contains(m)).collect();
    unused.sort_unstable();
    for material in unused {
        report.warn(Warning::UnusedTexture {
            material: material.to_string(),
        });
    }
}

/// One node per range, skinned when skin data is given
fn add_mesh_nodes(
    builder: &mut SceneBuilder,
    mesh: &SkinnedMesh,
    textures: &MaterialTextures,
    skin: Option<(&SkinAttributes, json::Index<json::Skin>)>,
    report: &mut ConversionReport,
) {
    let mut untextured = HashSet::new();

    for range in &mesh.ranges {
        let material = bind_material(builder, &range.material, textures, &mut untextured, report);
        let primitive = range_primitive(builder, mesh, range, material, skin.map(|(attrs, _)| attrs));
        let mesh_index = builder.mesh(&range.material, vec![primitive]);
        builder.root_node(json::Node {
            name: Some(range.material.clone()),
            mesh: Some(mesh_index),
            skin: skin.map(|(_, index)| index),
            ..Default::default()
        });
    }

    report_unused_textures(
        textures,
        mesh.ranges.iter().map(|r| r.material.as_str()),
        report,
    );
}

/// Skinned mesh geometry alone: mesh nodes, no joints
pub fn convert_simple_skin(
    mesh: &SkinnedMesh,
    textures: &MaterialTextures,
    generator: &str,
) -> Result<(Scene, ConversionReport)> {
    validate_geometry(mesh)?;

    let mut report = ConversionReport::new();
    let mut builder = SceneBuilder::new(generator);
    add_mesh_nodes(&mut builder, mesh, textures, None, &mut report);

    tracing::info!(
        "Converted simple skin: {} ranges, {} vertices",
        mesh.ranges.len(),
        mesh.vertices.len()
    );
    Ok((builder.finish("Scene"), report))
}

/// Mesh, skeleton and clips as one skinned scene
///
/// Every input is validated before anything is built.
pub fn convert_skinned_model(
    mesh: &SkinnedMesh,
    skeleton: &Skeleton,
    animations: &[NamedAnimation],
    textures: &MaterialTextures,
    generator: &str,
) -> Result<(Scene, ConversionReport)> {
    validate_geometry(mesh)?;
    validate_skeleton(skeleton)?;
    let skin_attributes = resolve_influences(mesh, skeleton)?;

    let mut report = ConversionReport::new();
    let lookup = skeleton.name_lookup();
    for clip in animations {
        let missing = missing_joints(&clip.animation, &lookup);
        if !missing.is_empty() {
            report.warn(Warning::Compatibility {
                animation: clip.name.clone(),
                missing_joints: missing,
            });
        }
    }

    let mut builder = SceneBuilder::new(generator);
    let joint_nodes = add_joint_nodes(&mut builder, skeleton);
    let skin = add_skin(&mut builder, skeleton, &joint_nodes);
    add_mesh_nodes(
        &mut builder,
        mesh,
        textures,
        Some((&skin_attributes, skin)),
        &mut report,
    );

    let mut clips = 0;
    for clip in animations {
        if add_clip(&mut builder, clip, &lookup, &joint_nodes)? {
            clips += 1;
        }
    }

    tracing::info!(
        "Converted skinned model: {} ranges, {} joints, {} clips",
        mesh.ranges.len(),
        skeleton.len(),
        clips
    );
    Ok((builder.finish("Scene"), report))
}
