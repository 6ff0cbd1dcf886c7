//! Rebuild a skinned mesh from static geometry and a weight table

use hashbrown::HashMap;
use rig_common::{SkinnedMesh, SkinnedVertex, StaticGeometry, VertexWeights};

use crate::config::{OrphanPolicy, WeightPolicy};
use crate::error::{ConvertError, Result};
use crate::report::{ConversionReport, Warning};

const ROOT_BINDING: VertexWeights = VertexWeights {
    bone_indices: [0; 4],
    weights: [1.0, 0.0, 0.0, 0.0],
};

/// Tally of the fixes applied to a weight table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct WeightFixes {
    renormalized: usize,
    orphans: usize,
}

/// Clamp, renormalize and rebind weights according to the policy
fn normalize_weights(
    weights: &[VertexWeights],
    policy: &WeightPolicy,
) -> Result<(Vec<VertexWeights>, WeightFixes)> {
    let mut fixes = WeightFixes::default();
    let mut normalized = Vec::with_capacity(weights.len());

    for (v, entry) in weights.iter().enumerate() {
        let mut entry = *entry;
        for w in &mut entry.weights {
            if !w.is_finite() || *w < 0.0 {
                *w = 0.0;
            }
        }

        let sum = entry.sum();
        if sum <= 0.0 {
            if policy.orphan_policy == OrphanPolicy::Reject {
                return Err(ConvertError::validation(format!(
                    "Vertex {v} has no weight"
                )));
            }
            fixes.orphans += 1;
            normalized.push(ROOT_BINDING);
            continue;
        }

        if (sum - 1.0).abs() > f64::from(policy.tolerance) {
            if !policy.renormalize {
                return Err(ConvertError::validation(format!(
                    "Vertex {v} weights sum to {sum}, outside tolerance {}",
                    policy.tolerance
                )));
            }
            for w in &mut entry.weights {
                *w = (f64::from(*w) / sum) as f32;
            }
            fixes.renormalized += 1;
        }
        normalized.push(entry);
    }

    Ok((normalized, fixes))
}

/// Build a skinned mesh with one contiguous range per submesh
///
/// A vertex used by two submeshes is duplicated into both ranges; vertices
/// no submesh uses are dropped.
pub fn synthesize_legacy_skin(
    geometry: &StaticGeometry,
    weights: &[VertexWeights],
    policy: &WeightPolicy,
) -> Result<(SkinnedMesh, ConversionReport)> {
    if geometry.vertices.len() != weights.len() {
        return Err(ConvertError::Mismatch {
            expected: geometry.vertices.len(),
            actual: weights.len(),
        });
    }

    let (weights, fixes) = normalize_weights(weights, policy)?;
    let mut report = ConversionReport::new();
    if fixes.orphans > 0 {
        report.warn(Warning::OrphanVertices {
            vertices: fixes.orphans,
        });
    }
    if fixes.renormalized > 0 {
        report.warn(Warning::RenormalizedWeights {
            vertices: fixes.renormalized,
        });
    }

    let mut mesh = SkinnedMesh::new();
    let mut used = vec![false; geometry.vertices.len()];

    for submesh in &geometry.submeshes {
        if submesh.indices.is_empty() {
            tracing::debug!("Skipping empty submesh '{}'", submesh.material);
            continue;
        }
        if submesh.indices.len() % 3 != 0 {
            return Err(ConvertError::validation(format!(
                "Submesh '{}' index count {} is not a multiple of 3",
                submesh.material,
                submesh.indices.len()
            )));
        }

        let mut remap: HashMap<u32, u32> = HashMap::new();
        let mut vertices = Vec::new();
        let mut indices = Vec::with_capacity(submesh.indices.len());

        for &index in &submesh.indices {
            let Some(source) = geometry.vertices.get(index as usize) else {
                return Err(ConvertError::validation(format!(
                    "Submesh '{}' index {} is outside {} vertices",
                    submesh.material,
                    index,
                    geometry.vertices.len()
                )));
            };
            let local = *remap.entry(index).or_insert_with(|| {
                let skin = weights[index as usize];
                vertices.push(SkinnedVertex {
                    position: source.position,
                    normal: source.normal,
                    uv: source.uv,
                    bone_indices: skin.bone_indices,
                    weights: skin.weights,
                });
                (vertices.len() - 1) as u32
            });
            used[index as usize] = true;
            indices.push(local);
        }

        mesh.push_submesh(submesh.material.clone(), &vertices, &indices);
    }

    let dropped = used.iter().filter(|u| !**u).count();
    if dropped > 0 {
        report.warn(Warning::DroppedVertices { vertices: dropped });
    }

    tracing::info!(
        "Synthesized skin for '{}': {} ranges, {} vertices",
        geometry.name,
        mesh.ranges.len(),
        mesh.vertices.len()
    );
    Ok((mesh, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rig_common::{StaticSubmesh, StaticVertex};

    fn quad() -> StaticGeometry {
        let vertex = |x: f32, y: f32| StaticVertex {
            position: [x, y, 0.0],
            normal: [0.0, 0.0, 1.0],
            uv: [x, y],
        };
        StaticGeometry {
            name: "crate".to_string(),
            vertices: vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(1.0, 1.0), vertex(0.0, 1.0)],
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

    fn weights(values: &[[f32; 4]]) -> Vec<VertexWeights> {
        values
            .iter()
            .map(|&w| VertexWeights {
                bone_indices: [1, 2, 0, 0],
                weights: w,
            })
            .collect()
    }

    #[test]
    fn test_count_mismatch() {
        let err = synthesize_legacy_skin(&quad(), &weights(&[[1.0, 0.0, 0.0, 0.0]]), &WeightPolicy::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Mismatch);
        assert!(err.to_string().contains("1 vertices"));
    }

    #[test]
    fn test_renormalize_and_orphans() {
        let table = weights(&[
            [0.5, 0.5, 0.0, 0.0],
            [2.0, 2.0, 0.0, 0.0],
            [0.0; 4],
            [0.3, -0.1, 0.0, 0.0],
        ]);
        let (mesh, report) = synthesize_legacy_skin(&quad(), &table, &WeightPolicy::default()).unwrap();

        for vertex in &mesh.vertices {
            let sum: f32 = vertex.weights.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "sum {sum}");
        }
        // Vertex 2 is shared, so it appears once per range
        let orphans: Vec<&SkinnedVertex> = mesh
            .vertices
            .iter()
            .filter(|v| v.position == [1.0, 1.0, 0.0])
            .collect();
        assert_eq!(orphans.len(), 2);
        assert!(orphans
            .iter()
            .all(|v| v.bone_indices == [0; 4] && v.weights == [1.0, 0.0, 0.0, 0.0]));

        assert!(report.warnings.contains(&Warning::OrphanVertices { vertices: 1 }));
        assert!(report
            .warnings
            .contains(&Warning::RenormalizedWeights { vertices: 2 }));
    }

    #[test]
    fn test_huge_and_infinite_weights() {
        let table = weights(&[
            [f32::INFINITY, 0.5, 0.0, 0.0],
            [3e38, 3e38, 0.0, 0.0],
            [f32::NEG_INFINITY, f32::NAN, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
        ]);
        let (mesh, report) = synthesize_legacy_skin(&quad(), &table, &WeightPolicy::default()).unwrap();

        for vertex in &mesh.vertices {
            assert!(vertex.weights.iter().all(|w| w.is_finite()));
            let sum: f32 = vertex.weights.iter().sum();
            assert!((sum - 1.0).abs() < 1e-4, "sum {sum}");
        }
        let first = mesh.vertices.iter().find(|v| v.position == [0.0, 0.0, 0.0]).unwrap();
        assert_eq!(first.weights, [0.0, 1.0, 0.0, 0.0]);
        let second = mesh.vertices.iter().find(|v| v.position == [1.0, 0.0, 0.0]).unwrap();
        assert!((second.weights[0] - 0.5).abs() < 1e-6);
        assert!(report.warnings.contains(&Warning::OrphanVertices { vertices: 1 }));
    }

    #[test]
    fn test_strict_policies() {
        let strict_orphans = WeightPolicy {
            orphan_policy: OrphanPolicy::Reject,
            ..Default::default()
        };
        let table = weights(&[[1.0, 0.0, 0.0, 0.0], [0.0; 4], [1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]]);
        let err = synthesize_legacy_skin(&quad(), &table, &strict_orphans).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let no_renormalize = WeightPolicy {
            renormalize: false,
            ..Default::default()
        };
        let table = weights(&[[1.0, 0.0, 0.0, 0.0], [0.6, 0.6, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0, 0.0]]);
        let err = synthesize_legacy_skin(&quad(), &table, &no_renormalize).unwrap_err();
        assert!(err.to_string().contains("outside tolerance"));
    }

    #[test]
    fn test_ranges_are_contiguous() {
        let table = weights(&[[1.0, 0.0, 0.0, 0.0]; 4]);
        let (mesh, report) = synthesize_legacy_skin(&quad(), &table, &WeightPolicy::default()).unwrap();

        assert!(report.is_clean());
        assert_eq!(mesh.ranges.len(), 2);
        assert_eq!(mesh.ranges[0].material, "Wood");
        assert_eq!(mesh.ranges[1].start_vertex, 3);
        assert_eq!(mesh.ranges[1].vertex_count, 3);
        assert_eq!(mesh.indices, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(mesh.vertices[1].uv, [1.0, 0.0]);
        assert_eq!(mesh.vertices[1].bone_indices, [1, 2, 0, 0]);
    }

    #[test]
    fn test_unused_vertices_are_dropped() {
        let mut geometry = quad();
        geometry.submeshes.truncate(1);
        let table = weights(&[[1.0, 0.0, 0.0, 0.0]; 4]);
        let (mesh, report) = synthesize_legacy_skin(&geometry, &table, &WeightPolicy::default()).unwrap();

        assert_eq!(mesh.vertices.len(), 3);
        assert_eq!(report.warnings, vec![Warning::DroppedVertices { vertices: 1 }]);
    }
}
