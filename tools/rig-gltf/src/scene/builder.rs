use std::collections::BTreeMap;

use gltf::json;
use hashbrown::HashMap;
use json::accessor::{ComponentType, GenericComponentType, Type};
use json::buffer::Target;
use json::image::MimeType;
use json::validation::Checked::Valid;
use json::validation::USize64;
use json::Index;

use super::Scene;

/// Incrementally builds a glTF document backed by one buffer
///
/// Every buffer view starts on a 4-byte boundary.
pub struct SceneBuilder {
    root: json::Root,
    buffer: Vec<u8>,
    materials: HashMap<String, Index<json::Material>>,
    scene_nodes: Vec<Index<json::Node>>,
}

impl SceneBuilder {
    pub fn new(generator: &str) -> Self {
        let mut root = json::Root::default();
        root.asset.generator = Some(generator.to_string());
        root.push(json::Buffer {
            byte_length: USize64(0),
            name: None,
            uri: None,
            extensions: Default::default(),
            extras: Default::default(),
        });

        Self {
            root,
            buffer: Vec::new(),
            materials: HashMap::new(),
            scene_nodes: Vec::new(),
        }
    }

    fn align_4(&mut self) {
        while self.buffer.len() % 4 != 0 {
            self.buffer.push(0);
        }
    }

    fn push_view(&mut self, bytes: &[u8], target: Option<Target>) -> Index<json::buffer::View> {
        self.align_4();
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);

        self.root.push(json::buffer::View {
            buffer: Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some(offset.into()),
            byte_stride: None,
            name: None,
            target: target.map(Valid),
            extensions: Default::default(),
            extras: Default::default(),
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn push_accessor(
        &mut self,
        bytes: &[u8],
        target: Option<Target>,
        count: usize,
        component: ComponentType,
        type_: Type,
        bounds: Option<(Vec<f32>, Vec<f32>)>,
        normalized: bool,
    ) -> Index<json::Accessor> {
        let view = self.push_view(bytes, target);
        let to_value = |values: Vec<f32>| {
            json::Value::Array(values.into_iter().map(json::Value::from).collect())
        };
        let (min, max) = match bounds {
            Some((min, max)) => (Some(to_value(min)), Some(to_value(max))),
            None => (None, None),
        };

        self.root.push(json::Accessor {
            buffer_view: Some(view),
            byte_offset: Some(USize64(0)),
            count: count.into(),
            component_type: Valid(GenericComponentType(component)),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized,
            sparse: None,
            extensions: Default::default(),
            extras: Default::default(),
        })
    }

    /// POSITION accessor; carries the min/max glTF requires
    pub fn positions(&mut self, positions: &[[f32; 3]]) -> Index<json::Accessor> {
        let bounds = vec3_bounds(positions);
        self.push_accessor(
            bytemuck::cast_slice(positions),
            Some(Target::ArrayBuffer),
            positions.len(),
            ComponentType::F32,
            Type::Vec3,
            Some(bounds),
            false,
        )
    }

    pub fn vec3(&mut self, values: &[[f32; 3]]) -> Index<json::Accessor> {
        self.push_accessor(
            bytemuck::cast_slice(values),
            Some(Target::ArrayBuffer),
            values.len(),
            ComponentType::F32,
            Type::Vec3,
            None,
            false,
        )
    }

    pub fn vec2(&mut self, values: &[[f32; 2]]) -> Index<json::Accessor> {
        self.push_accessor(
            bytemuck::cast_slice(values),
            Some(Target::ArrayBuffer),
            values.len(),
            ComponentType::F32,
            Type::Vec2,
            None,
            false,
        )
    }

    pub fn vec4(&mut self, values: &[[f32; 4]]) -> Index<json::Accessor> {
        self.push_accessor(
            bytemuck::cast_slice(values),
            Some(Target::ArrayBuffer),
            values.len(),
            ComponentType::F32,
            Type::Vec4,
            None,
            false,
        )
    }

    /// JOINTS_0 accessor, u8 components when every joint index fits
    pub fn joints(&mut self, joints: &[[u16; 4]], wide: bool) -> Index<json::Accessor> {
        if wide {
            return self.push_accessor(
                bytemuck::cast_slice(joints),
                Some(Target::ArrayBuffer),
                joints.len(),
                ComponentType::U16,
                Type::Vec4,
                None,
                false,
            );
        }
        let narrow: Vec<u8> = joints.iter().flatten().map(|&j| j as u8).collect();
        self.push_accessor(
            &narrow,
            Some(Target::ArrayBuffer),
            joints.len(),
            ComponentType::U8,
            Type::Vec4,
            None,
            false,
        )
    }

    /// Triangle indices, u16 when every index fits
    pub fn indices(&mut self, indices: &[u32]) -> Index<json::Accessor> {
        let fits_u16 = indices.iter().all(|&i| i <= u16::MAX as u32);
        if fits_u16 {
            let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
            self.push_accessor(
                bytemuck::cast_slice(&narrow),
                Some(Target::ElementArrayBuffer),
                indices.len(),
                ComponentType::U16,
                Type::Scalar,
                None,
                false,
            )
        } else {
            self.push_accessor(
                bytemuck::cast_slice(indices),
                Some(Target::ElementArrayBuffer),
                indices.len(),
                ComponentType::U32,
                Type::Scalar,
                None,
                false,
            )
        }
    }

    /// Keyframe times; animation inputs require min/max
    pub fn times(&mut self, times: &[f32]) -> Index<json::Accessor> {
        let min = times.iter().copied().fold(f32::INFINITY, f32::min);
        let max = times.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        self.push_accessor(
            bytemuck::cast_slice(times),
            None,
            times.len(),
            ComponentType::F32,
            Type::Scalar,
            Some((vec![min], vec![max])),
            false,
        )
    }

    /// Column-major 4x4 matrices
    pub fn mat4(&mut self, matrices: &[[f32; 16]]) -> Index<json::Accessor> {
        self.push_accessor(
            bytemuck::cast_slice(matrices),
            None,
            matrices.len(),
            ComponentType::F32,
            Type::Mat4,
            None,
            false,
        )
    }

    /// Material by name, created once; a texture is embedded on creation
    pub fn material(&mut self, name: &str, png: Option<&[u8]>) -> Index<json::Material> {
        if let Some(&index) = self.materials.get(name) {
            return index;
        }

        let base_color_texture = png.map(|bytes| {
            let view = self.push_view(bytes, None);
            let image = self.root.push(json::Image {
                buffer_view: Some(view),
                mime_type: Some(MimeType("image/png".to_string())),
                name: Some(name.to_string()),
                uri: None,
                extensions: Default::default(),
                extras: Default::default(),
            });
            let texture = self.root.push(json::Texture {
                name: Some(name.to_string()),
                sampler: None,
                source: image,
                extensions: Default::default(),
                extras: Default::default(),
            });
            json::texture::Info {
                index: texture,
                tex_coord: 0,
                extensions: Default::default(),
                extras: Default::default(),
            }
        });

        let index = self.root.push(json::Material {
            name: Some(name.to_string()),
            pbr_metallic_roughness: json::material::PbrMetallicRoughness {
                base_color_texture,
                ..Default::default()
            },
            ..Default::default()
        });
        self.materials.insert(name.to_string(), index);
        index
    }

    pub fn mesh(&mut self, name: &str, primitives: Vec<json::mesh::Primitive>) -> Index<json::Mesh> {
        self.root.push(json::Mesh {
            name: Some(name.to_string()),
            primitives,
            weights: None,
            extensions: Default::default(),
            extras: Default::default(),
        })
    }

    pub fn node(&mut self, node: json::Node) -> Index<json::Node> {
        self.root.push(node)
    }

    /// Add a node and list it at the top level of the scene
    pub fn root_node(&mut self, node: json::Node) -> Index<json::Node> {
        let index = self.root.push(node);
        self.scene_nodes.push(index);
        index
    }

    pub fn node_mut(&mut self, index: Index<json::Node>) -> &mut json::Node {
        &mut self.root.nodes[index.value()]
    }

    pub fn skin(&mut self, skin: json::Skin) -> Index<json::Skin> {
        self.root.push(skin)
    }

    pub fn animation(&mut self, animation: json::Animation) -> Index<json::Animation> {
        self.root.push(animation)
    }

    pub fn finish(mut self, scene_name: &str) -> Scene {
        let scene = self.root.push(json::Scene {
            name: Some(scene_name.to_string()),
            nodes: std::mem::take(&mut self.scene_nodes),
            extensions: Default::default(),
            extras: Default::default(),
        });
        self.root.scene = Some(scene);

        if self.buffer.is_empty() {
            self.root.buffers.clear();
        } else {
            self.align_4();
            self.root.buffers[0].byte_length = self.buffer.len().into();
        }

        Scene {
            root: self.root,
            buffer: self.buffer,
        }
    }
}

/// Triangle-list primitive with the given attributes
pub(crate) fn primitive(
    attributes: &[(json::mesh::Semantic, Index<json::Accessor>)],
    indices: Index<json::Accessor>,
    material: Index<json::Material>,
) -> json::mesh::Primitive {
    let attributes: BTreeMap<_, _> = attributes
        .iter()
        .map(|(semantic, accessor)| (Valid(semantic.clone()), *accessor))
        .collect();

    json::mesh::Primitive {
        attributes,
        indices: Some(indices),
        material: Some(material),
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
        extensions: Default::default(),
        extras: Default::default(),
    }
}

fn vec3_bounds(values: &[[f32; 3]]) -> (Vec<f32>, Vec<f32>) {
    let bounds = rig_common::Aabb::from_points(values);
    (bounds.min.to_vec(), bounds.max.to_vec())
}
