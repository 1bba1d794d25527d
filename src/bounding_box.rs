use crate::{Point2, Point3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An axis aligned bounding rectangle.
///
/// The bounding rectangle is the smallest rectangle that surrounds a set of points and
/// is aligned along both coordinate axes. Spatial indices of downstream mesh consumers use
/// it to bucket points and triangles.
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct BoundingBox2 {
    lower: Point2<f64>,
    upper: Point2<f64>,
}

impl Default for BoundingBox2 {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox2 {
    /// Creates an empty bounding rectangle.
    ///
    /// `lower` and `upper` are set to positive / negative infinity until the first point
    /// is added.
    pub fn new() -> Self {
        BoundingBox2 {
            lower: Point2::new(f64::INFINITY, f64::INFINITY),
            upper: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Creates a bounding rectangle that contains exactly one point.
    pub fn from_point(point: Point2<f64>) -> Self {
        BoundingBox2 {
            lower: point,
            upper: point,
        }
    }

    /// Creates the bounding rectangle of a set of points.
    pub fn from_points(points: impl IntoIterator<Item = Point2<f64>>) -> Self {
        let mut result = Self::new();
        for point in points {
            result.add_point(point);
        }
        result
    }

    /// Returns the corner with the smaller coordinates.
    pub fn lower(&self) -> Point2<f64> {
        self.lower
    }

    /// Returns the corner with the larger coordinates.
    pub fn upper(&self) -> Point2<f64> {
        self.upper
    }

    /// Returns `true` if no point has been added yet.
    pub fn is_empty(&self) -> bool {
        self.lower.x > self.upper.x
    }

    /// Enlarges this rectangle to contain a point.
    #[inline]
    pub fn add_point(&mut self, point: Point2<f64>) {
        self.lower = Point2::new(self.lower.x.min(point.x), self.lower.y.min(point.y));
        self.upper = Point2::new(self.upper.x.max(point.x), self.upper.y.max(point.y));
    }

    /// Checks if a point is contained. Points on the border are contained.
    #[inline]
    pub fn contains_point(&self, point: Point2<f64>) -> bool {
        self.lower.x <= point.x
            && self.lower.y <= point.y
            && self.upper.x >= point.x
            && self.upper.y >= point.y
    }

    /// Returns `true` if both rectangles share at least one point.
    pub fn intersects(&self, other: &BoundingBox2) -> bool {
        self.lower.x <= other.upper.x
            && other.lower.x <= self.upper.x
            && self.lower.y <= other.upper.y
            && other.lower.y <= self.upper.y
    }

    /// Center of the box.
    pub fn center(&self) -> Point2<f64> {
        self.lower.add(self.upper).mul(0.5)
    }

    /// Length of the diagonal from `lower` to `upper`.
    pub fn diagonal_length(&self) -> f64 {
        self.upper.sub(self.lower).length2().sqrt()
    }
}

/// An axis aligned bounding box.
///
/// *See also [BoundingBox2]*
#[derive(Clone, Copy, PartialEq, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct BoundingBox3 {
    lower: Point3<f64>,
    upper: Point3<f64>,
}

impl Default for BoundingBox3 {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundingBox3 {
    /// Creates an empty bounding box.
    pub fn new() -> Self {
        BoundingBox3 {
            lower: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            upper: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Creates a bounding box containing only `point`.
    pub fn from_point(point: Point3<f64>) -> Self {
        BoundingBox3 {
            lower: point,
            upper: point,
        }
    }

    /// Creates the smallest bounding box containing all `points`.
    pub fn from_points(points: impl IntoIterator<Item = Point3<f64>>) -> Self {
        let mut result = Self::new();
        for point in points {
            result.add_point(point);
        }
        result
    }

    /// Returns the corner with the smallest coordinates.
    pub fn lower(&self) -> Point3<f64> {
        self.lower
    }

    /// Returns the corner with the largest coordinates.
    pub fn upper(&self) -> Point3<f64> {
        self.upper
    }

    /// Returns `true` if no point has been added yet.
    pub fn is_empty(&self) -> bool {
        self.lower.x > self.upper.x
    }

    /// Extends the box to contain `point`.
    #[inline]
    pub fn add_point(&mut self, point: Point3<f64>) {
        self.lower = Point3::new(
            self.lower.x.min(point.x),
            self.lower.y.min(point.y),
            self.lower.z.min(point.z),
        );
        self.upper = Point3::new(
            self.upper.x.max(point.x),
            self.upper.y.max(point.y),
            self.upper.z.max(point.z),
        );
    }

    /// Returns `true` if `point` lies inside the box or on its border.
    #[inline]
    pub fn contains_point(&self, point: Point3<f64>) -> bool {
        self.lower.x <= point.x
            && self.lower.y <= point.y
            && self.lower.z <= point.z
            && self.upper.x >= point.x
            && self.upper.y >= point.y
            && self.upper.z >= point.z
    }

    /// Returns `true` if both boxes share at least one point.
    pub fn intersects(&self, other: &BoundingBox3) -> bool {
        self.lower.x <= other.upper.x
            && other.lower.x <= self.upper.x
            && self.lower.y <= other.upper.y
            && other.lower.y <= self.upper.y
            && self.lower.z <= other.upper.z
            && other.lower.z <= self.upper.z
    }

    /// Center of the box.
    pub fn center(&self) -> Point3<f64> {
        self.lower.add(self.upper).mul(0.5)
    }

    /// Length of the diagonal from `lower` to `upper`.
    pub fn diagonal_length(&self) -> f64 {
        self.upper.sub(self.lower).length2().sqrt()
    }
}
