use num_traits::{Num, Signed};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A coordinate type that can be used with a triangulator.
///
/// Internally, every geometric decision is made after converting the coordinates into `f64`.
/// Using `f32` only reduces the storage needed for the caller's points.
///
/// This type should usually be either `f32` or `f64`.
pub trait MeshNum:
    Num + PartialOrd + Into<f64> + From<f32> + Copy + Signed + std::fmt::Debug
{
}

impl<T> MeshNum for T where
    T: Num + PartialOrd + Into<f64> + From<f32> + Copy + Signed + std::fmt::Debug
{
}

/// A two dimensional point.
///
/// This is the basic type used for defining positions of planar meshes.
#[derive(Debug, PartialEq, Eq, PartialOrd, Clone, Copy, Default, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Point2<S> {
    /// The point's x coordinate
    pub x: S,
    /// The point's y coordinate
    pub y: S,
}

impl<S> Point2<S> {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: S, y: S) -> Self {
        Point2 { x, y }
    }
}

impl<S: MeshNum> Point2<S> {
    /// Returns the squared distance of this point and another point.
    #[inline]
    pub fn distance_2(&self, other: Self) -> S {
        self.sub(other).length2()
    }

    pub(crate) fn to_f64(self) -> Point2<f64> {
        Point2::new(self.x.into(), self.y.into())
    }

    pub(crate) fn mul(&self, factor: S) -> Self {
        Point2 {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub(crate) fn add(&self, other: Self) -> Self {
        Point2 {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    pub(crate) fn length2(&self) -> S {
        self.x * self.x + self.y * self.y
    }

    pub(crate) fn sub(&self, other: Self) -> Self {
        Point2 {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    pub(crate) fn dot(&self, other: Self) -> S {
        self.x * other.x + self.y * other.y
    }
}

impl<S: MeshNum> From<Point2<S>> for [S; 2] {
    #[inline]
    fn from(point: Point2<S>) -> Self {
        [point.x, point.y]
    }
}

impl<S: MeshNum> From<Point2<S>> for (S, S) {
    #[inline]
    fn from(point: Point2<S>) -> (S, S) {
        (point.x, point.y)
    }
}

impl<S: MeshNum> From<[S; 2]> for Point2<S> {
    #[inline]
    fn from(source: [S; 2]) -> Self {
        Self::new(source[0], source[1])
    }
}

impl<S: MeshNum> From<(S, S)> for Point2<S> {
    #[inline]
    fn from(source: (S, S)) -> Self {
        Self::new(source.0, source.1)
    }
}

/// A three dimensional point.
///
/// Used as position type of tetrahedralizations.
#[derive(Debug, PartialEq, Eq, PartialOrd, Clone, Copy, Default, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct Point3<S> {
    /// The point's x coordinate
    pub x: S,
    /// The point's y coordinate
    pub y: S,
    /// The point's z coordinate
    pub z: S,
}

impl<S> Point3<S> {
    /// Creates a new point.
    #[inline]
    pub const fn new(x: S, y: S, z: S) -> Self {
        Point3 { x, y, z }
    }
}

impl<S: MeshNum> Point3<S> {
    /// Returns the squared distance of this point and another point.
    #[inline]
    pub fn distance_2(&self, other: Self) -> S {
        self.sub(other).length2()
    }

    pub(crate) fn to_f64(self) -> Point3<f64> {
        Point3::new(self.x.into(), self.y.into(), self.z.into())
    }

    pub(crate) fn mul(&self, factor: S) -> Self {
        Point3 {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }

    pub(crate) fn add(&self, other: Self) -> Self {
        Point3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    pub(crate) fn length2(&self) -> S {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    pub(crate) fn sub(&self, other: Self) -> Self {
        Point3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }

    pub(crate) fn dot(&self, other: Self) -> S {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub(crate) fn cross(&self, other: Self) -> Self {
        Point3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }
}

impl<S: MeshNum> From<Point3<S>> for [S; 3] {
    #[inline]
    fn from(point: Point3<S>) -> Self {
        [point.x, point.y, point.z]
    }
}

impl<S: MeshNum> From<[S; 3]> for Point3<S> {
    #[inline]
    fn from(source: [S; 3]) -> Self {
        Self::new(source[0], source[1], source[2])
    }
}

impl<S: MeshNum> From<(S, S, S)> for Point3<S> {
    #[inline]
    fn from(source: (S, S, S)) -> Self {
        Self::new(source.0, source.1, source.2)
    }
}

/// An object with a planar position.
///
/// Points need to implement this trait to be added to a
/// [DelaunayTriangulation2](crate::DelaunayTriangulation2) or a
/// [ConstrainedTriangulation2](crate::ConstrainedTriangulation2).
pub trait HasPosition {
    /// The number type used by this coordinate type.
    type Scalar: MeshNum;

    /// Returns the position of this object.
    ///
    /// **Note**: It is assumed that the position doesn't change once it has been
    /// added to a triangulator. Failing this requirement leads to invalid results.
    fn position(&self) -> Point2<Self::Scalar>;
}

impl<S: MeshNum> HasPosition for Point2<S> {
    type Scalar = S;

    fn position(&self) -> Point2<S> {
        *self
    }
}

/// An object with a spatial position.
///
/// Points need to implement this trait to be added to a
/// [DelaunayTetrahedralization](crate::DelaunayTetrahedralization).
pub trait HasPosition3 {
    /// The number type used by this coordinate type.
    type Scalar: MeshNum;

    /// Returns the position of this object.
    ///
    /// The same stability requirement as for [HasPosition::position] applies.
    fn position(&self) -> Point3<Self::Scalar>;
}

impl<S: MeshNum> HasPosition3 for Point3<S> {
    type Scalar = S;

    fn position(&self) -> Point3<S> {
        *self
    }
}
