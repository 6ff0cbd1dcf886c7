//! Level geometry containers to glTF
//!
//! Each model becomes a top-level node with its own mesh. No skin and no
//! animation.

use glam::Mat4;
use gltf::json;
use hashbrown::HashSet;
use json::mesh::Semantic;
use rig_common::{MapGeometry, MapModel};

use crate::convert::{bind_material, report_unused_textures};
use crate::error::{ConvertError, Result};
use crate::report::ConversionReport;
use crate::scene::{primitive, Scene, SceneBuilder};
use crate::textures::MaterialTextures;

fn model_mesh(
    builder: &mut SceneBuilder,
    model: &MapModel,
    textures: &MaterialTextures,
    untextured: &mut HashSet<String>,
    report: &mut ConversionReport,
) -> Result<Option<json::Index<json::Mesh>>> {
    let submeshes: Vec<_> = model
        .submeshes
        .iter()
        .filter(|s| s.index_count > 0)
        .collect();
    if submeshes.is_empty() || model.vertices.is_empty() {
        tracing::debug!("Model '{}' has no geometry", model.name);
        return Ok(None);
    }

    let positions: Vec<[f32; 3]> = model.vertices.iter().map(|v| v.position).collect();
    let normals: Vec<[f32; 3]> = model.vertices.iter().map(|v| v.normal).collect();
    let uvs: Vec<[f32; 2]> = model.vertices.iter().map(|v| v.uv).collect();
    let attributes = [
        (Semantic::Positions, builder.positions(&positions)),
        (Semantic::Normals, builder.vec3(&normals)),
        (Semantic::TexCoords(0), builder.vec2(&uvs)),
    ];

    let mut primitives = Vec::with_capacity(submeshes.len());
    for submesh in submeshes {
        let indices = model.submesh_indices(submesh).ok_or_else(|| {
            ConvertError::validation(format!(
                "Model '{}' submesh '{}' lies outside its index buffer",
                model.name, submesh.material
            ))
        })?;
        if indices.len() % 3 != 0 {
            return Err(ConvertError::validation(format!(
                "Model '{}' submesh '{}' index count {} is not a multiple of 3",
                model.name,
                submesh.material,
                indices.len()
            )));
        }

        let material = bind_material(builder, &submesh.material, textures, untextured, report);
        let indices = builder.indices(indices);
        primitives.push(primitive(&attributes, indices, material));
    }

    Ok(Some(builder.mesh(&model.name, primitives)))
}

pub fn convert_map_geometry(
    map: &MapGeometry,
    textures: &MaterialTextures,
    generator: &str,
) -> Result<(Scene, ConversionReport)> {
    let mut report = ConversionReport::new();
    let mut builder = SceneBuilder::new(generator);
    let mut untextured = HashSet::new();

    for model in &map.models {
        let mesh = model_mesh(&mut builder, model, textures, &mut untextured, &mut report)?;
        let matrix = (Mat4::from_cols_array(&model.transform) != Mat4::IDENTITY)
            .then_some(model.transform);

        builder.root_node(json::Node {
            name: Some(model.name.clone()),
            mesh,
            matrix,
            ..Default::default()
        });
    }

    report_unused_textures(
        textures,
        map.models
            .iter()
            .flat_map(|m| m.submeshes.iter().map(|s| s.material.as_str())),
        &mut report,
    );

    tracing::info!(
        "Converted map geometry: {} models, {} materials",
        map.models.len(),
        distinct_materials(&map.models)
    );
    Ok((builder.finish("Map"), report))
}

fn distinct_materials(models: &[MapModel]) -> usize {
    models
        .iter()
        .flat_map(|m| m.submeshes.iter().map(|s| s.material.as_str()))
        .collect::<HashSet<_>>()
        .len()
}
