//! Binary serialization trait for format headers.
//!
//! Every header in [`crate::formats`] implements `BinarySerializable` so
//! generic code can handle them uniformly. The type-specific `to_bytes()`
//! methods still return fixed-size arrays.

/// Trait for binary-serializable format headers.
///
/// Uses `Vec<u8>` for the return type because `[u8; Self::SIZE]` cannot be
/// named in a trait signature on stable Rust.
///
/// # Example
///
/// ```
/// use rig_common::formats::{BinarySerializable, SkeletonHeader};
///
/// let header = SkeletonHeader::new(24, 0);
///
/// let bytes = header.serialize();
/// let parsed = SkeletonHeader::deserialize(&bytes).unwrap();
/// assert_eq!(parsed.joint_count, 24);
/// ```
pub trait BinarySerializable: Sized {
    /// Size of the serialized header in bytes.
    const SIZE: usize;

    fn serialize(&self) -> Vec<u8>;

    /// Returns `None` if the byte slice is too short.
    fn deserialize(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_binary_serializable {
    ($($header:ty),* $(,)?) => {
        $(
            impl BinarySerializable for $header {
                const SIZE: usize = <$header>::SIZE;

                fn serialize(&self) -> Vec<u8> {
                    self.to_bytes().to_vec()
                }

                fn deserialize(bytes: &[u8]) -> Option<Self> {
                    Self::from_bytes(bytes)
                }
            }
        )*
    };
}

impl_binary_serializable!(
    super::SkinnedMeshHeader,
    super::RangeRecord,
    super::VertexBlockHeader,
    super::SkeletonHeader,
    super::AnimationHeader,
    super::StaticObjectHeader,
    super::WeightsHeader,
    super::MapGeometryHeader,
);
