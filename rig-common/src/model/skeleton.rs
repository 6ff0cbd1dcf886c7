//! Skeleton model: a flat joint arena with integer parent links

use glam::{Mat4, Quat, Vec3};
use hashbrown::HashMap;

/// Local TRS transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: [f32; 3],
    /// Quaternion as [x, y, z, w]
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
}

impl Transform {
    pub const IDENTITY: Self = Self {
        translation: [0.0; 3],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    };

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            Vec3::from_array(self.scale),
            Quat::from_array(self.rotation),
            Vec3::from_array(self.translation),
        )
    }

    pub fn from_mat4(matrix: &Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self {
            translation: translation.to_array(),
            rotation: rotation.to_array(),
            scale: scale.to_array(),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One joint of a skeleton
#[derive(Debug, Clone, PartialEq)]
pub struct Joint {
    pub name: String,
    /// Stable id carried through the engine files
    pub id: u16,
    /// Index of the parent joint in [`Skeleton::joints`], `None` for roots
    pub parent: Option<usize>,
    /// Bind pose relative to the parent
    pub local: Transform,
    /// Inverse bind matrix, 4x4 column-major
    pub inverse_bind: [f32; 16],
}

impl Joint {
    pub fn new(name: impl Into<String>, id: u16, parent: Option<usize>, local: Transform) -> Self {
        Self {
            name: name.into(),
            id,
            parent,
            local,
            inverse_bind: Mat4::IDENTITY.to_cols_array(),
        }
    }
}

/// Joint hierarchy plus the influence table used by vertex bone indices
///
/// Joints form a forest: any number of roots, parents referenced by index.
/// An empty influence table maps bone index `n` straight to joint `n`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Skeleton {
    pub joints: Vec<Joint>,
    pub influences: Vec<u16>,
}

impl Skeleton {
    pub fn new(joints: Vec<Joint>) -> Self {
        Self {
            joints,
            influences: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Name to index lookup table
    ///
    /// Later duplicates do not replace earlier entries.
    pub fn name_lookup(&self) -> HashMap<&str, usize> {
        let mut lookup = HashMap::with_capacity(self.joints.len());
        for (index, joint) in self.joints.iter().enumerate() {
            lookup.entry(joint.name.as_str()).or_insert(index);
        }
        lookup
    }

    /// First joint name that occurs more than once
    pub fn duplicate_name(&self) -> Option<&str> {
        let mut seen = HashMap::with_capacity(self.joints.len());
        self.joints
            .iter()
            .map(|j| j.name.as_str())
            .find(|name| seen.insert(*name, ()).is_some())
    }

    pub fn roots(&self) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(|(_, j)| j.parent.is_none())
            .map(|(i, _)| i)
    }

    pub fn children(&self, parent: usize) -> impl Iterator<Item = usize> + '_ {
        self.joints
            .iter()
            .enumerate()
            .filter(move |(_, j)| j.parent == Some(parent))
            .map(|(i, _)| i)
    }

    /// Model-space bind matrix of every joint
    ///
    /// Returns `None` when a parent index is out of range or the parent links
    /// contain a cycle.
    pub fn world_matrices(&self) -> Option<Vec<Mat4>> {
        let count = self.joints.len();
        let mut world: Vec<Option<Mat4>> = vec![None; count];
        let mut chain = Vec::with_capacity(count);

        for start in 0..count {
            chain.clear();
            let mut cursor = Some(start);
            while let Some(index) = cursor {
                if world[index].is_some() {
                    break;
                }
                if chain.len() == count {
                    return None;
                }
                chain.push(index);
                cursor = match self.joints[index].parent {
                    Some(parent) if parent < count => Some(parent),
                    Some(_) => return None,
                    None => None,
                };
            }

            for &index in chain.iter().rev() {
                let joint = &self.joints[index];
                let local = joint.local.to_mat4();
                world[index] = Some(match joint.parent {
                    Some(parent) => world[parent]? * local,
                    None => local,
                });
            }
        }

        world.into_iter().collect()
    }

    /// True when every parent index is valid and the links are acyclic
    pub fn is_forest(&self) -> bool {
        self.world_matrices().is_some()
    }

    /// Recompute every inverse bind matrix from the accumulated bind pose
    ///
    /// Returns `false` (leaving the skeleton untouched) if the hierarchy is
    /// not a forest.
    pub fn derive_inverse_binds(&mut self) -> bool {
        let Some(world) = self.world_matrices() else {
            return false;
        };
        for (joint, matrix) in self.joints.iter_mut().zip(world) {
            joint.inverse_bind = matrix.inverse().to_cols_array();
        }
        true
    }

    /// Map a vertex bone index to a joint index
    pub fn resolve_influence(&self, bone: u16) -> Option<usize> {
        let joint = if self.influences.is_empty() {
            bone as usize
        } else {
            *self.influences.get(bone as usize)? as usize
        };
        (joint < self.joints.len()).then_some(joint)
    }
}
