//! Engine-side data model
//!
//! Models are built once per conversion from parsed input and are not
//! mutated while a conversion runs.

mod animation;
mod geometry;
mod map;
mod skeleton;
mod static_geometry;

pub use animation::{Animation, Keyframe, Track};
pub use geometry::{Aabb, SkinnedMesh, SkinnedVertex, SubmeshRange};
pub use map::{MapGeometry, MapModel, MapSubmesh};
pub use skeleton::{Joint, Skeleton, Transform};
pub use static_geometry::{StaticGeometry, StaticSubmesh, StaticVertex, VertexWeights};
