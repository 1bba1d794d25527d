//! Point identifiers and simplex handles.

use std::convert::TryInto;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identifies a point of a triangulator.
///
/// Real points added by the caller receive the ids `0, 1, 2, ...` in insertion order.
/// Dummy points created internally for the enclosing cage receive negative ids
/// `-1, -2, -3, ...`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct PointId(i32);

impl PointId {
    pub(crate) fn real(index: usize) -> Self {
        PointId(
            index
                .try_into()
                .expect("Index too big - at most 2^31 points supported"),
        )
    }

    pub(crate) fn dummy(index: usize) -> Self {
        let index: i32 = index
            .try_into()
            .expect("Index too big - at most 2^31 dummy points supported");
        PointId(-1 - index)
    }

    /// Returns `true` if this id refers to a dummy point of the enclosing cage.
    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.0 < 0
    }

    /// Returns the index of the point within the real points or within the dummy points,
    /// depending on [Self::is_dummy].
    #[inline]
    pub fn index(&self) -> usize {
        if self.0 < 0 {
            (-1 - self.0) as usize
        } else {
            self.0 as usize
        }
    }

    /// Returns the signed raw id.
    pub fn raw(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Debug for PointId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_dummy() {
            write!(f, "DummyPoint({})", self.0)
        } else {
            write!(f, "Point({})", self.0)
        }
    }
}

/// Internal type definition that is only exposed for documentation purposes.
///
/// Use the aliases [FixedTriangleHandle] and [FixedTetrahedronHandle] instead.
///
/// A handle stays valid until its simplex is removed. Accessing a removed simplex with a
/// stale handle is detected by comparing generations, a new simplex reusing the slot
/// never aliases the old handle.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct FixedHandleImpl<Type> {
    index: u32,
    generation: u32,
    ty: Type,
}

impl<Type> std::fmt::Debug for FixedHandleImpl<Type> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedHandle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

impl<Type: Default> FixedHandleImpl<Type> {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index
                .try_into()
                .expect("Index too big - at most 2^32 elements supported"),
            generation,
            ty: Type::default(),
        }
    }

    /// Returns the slot index of this handle.
    ///
    /// Indices are dense while no simplex has been removed but may be reused afterwards.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
/// Marker type for triangle handles.
pub struct TriangleTag;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
/// Marker type for tetrahedron handles.
pub struct TetrahedronTag;

/// Refers to a triangle of a planar triangulation.
pub type FixedTriangleHandle = FixedHandleImpl<TriangleTag>;

/// Refers to a tetrahedron of a tetrahedralization.
pub type FixedTetrahedronHandle = FixedHandleImpl<TetrahedronTag>;

#[cfg(test)]
mod test {
    use super::{FixedTriangleHandle, PointId};

    #[test]
    fn test_point_ids() {
        let real = PointId::real(7);
        assert!(!real.is_dummy());
        assert_eq!(real.index(), 7);
        assert_eq!(real.raw(), 7);

        let dummy = PointId::dummy(0);
        assert!(dummy.is_dummy());
        assert_eq!(dummy.raw(), -1);
        assert_eq!(dummy.index(), 0);
        assert_eq!(PointId::dummy(3).raw(), -4);
        assert!(dummy < real);
        assert_eq!(format!("{:?}", dummy), "DummyPoint(-1)");
    }

    #[test]
    fn test_handles_compare_generation() {
        let first = FixedTriangleHandle::new(3, 0);
        let reused = FixedTriangleHandle::new(3, 1);
        assert_eq!(first.index(), reused.index());
        assert_ne!(first, reused);
    }
}
