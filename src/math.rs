use crate::predicates::{orient_2d, orient_3d};
use crate::{HasPosition, HasPosition3, InsertionError, MeshNum, Point2, Point3};

/// The smallest allowed coordinate value greater than zero that can be inserted into a
/// triangulator. This value is equal to 2<sup>-142</sup>.
///
/// The *absolute value* of any inserted vertex coordinate must be either zero or greater
/// than or equal to this value.
/// This is a requirement for preventing floating point underflow when calculating exact
/// geometric predicates.
///
/// *See also [validate_coordinate], [validate_vertex], [MAX_ALLOWED_VALUE], [mitigate_underflow]*

// Implementation note: These numbers come from the paper of Jonathan Richard Shewchuk:
// "The four predicates implemented for this report will not overflow nor underflow if
// their inputs have exponents in the range -[142, 201] and IEEE-745 double precision
// arithmetic is used."
// Source: Adaptive Precision Floating-Point Arithmetic and Fast Robust Geometric Predicates
pub const MIN_ALLOWED_VALUE: f64 = 1.793662034335766e-43; // 1.0 * 2^-142

/// The largest allowed coordinate value that can be inserted into a triangulator.
/// This value is equal to 2<sup>201</sup>.
///
/// *See also [validate_coordinate], [validate_vertex], [MIN_ALLOWED_VALUE]*
pub const MAX_ALLOWED_VALUE: f64 = 3.2138760885179806e60; // 1.0 * 2^201

/// Ratio below which a tetrahedron counts as sliver, see
/// [DelaunayTetrahedralization::is_sliver](crate::DelaunayTetrahedralization::is_sliver).
pub const DEFAULT_SLIVER_RATIO: f64 = 0.2;

/// Checks if a coordinate value is suitable for insertion into a triangulator.
///
/// Will return an error if and only if
///  - The absolute value of the coordinate is too small (See [MIN_ALLOWED_VALUE])
///  - The absolute value of the coordinate is too large (See [MAX_ALLOWED_VALUE])
///  - The coordinate is NaN (not a number)
///
/// Passing in any non-finite floating point number (e.g. `f32::NEG_INFINITY`) will
/// result in `Err(InsertionError::TooLarge)`.
///
/// *See also [mitigate_underflow]*
pub fn validate_coordinate<S: MeshNum>(value: S) -> Result<(), InsertionError> {
    let as_f64: f64 = value.into();
    if as_f64.is_nan() {
        Err(InsertionError::NAN)
    } else if as_f64.abs() < MIN_ALLOWED_VALUE && as_f64 != 0.0 {
        Err(InsertionError::TooSmall)
    } else if as_f64.abs() > MAX_ALLOWED_VALUE {
        Err(InsertionError::TooLarge)
    } else {
        Ok(())
    }
}

/// Checks if a planar vertex is suitable for insertion.
///
/// A vertex is considered suitable if all of its coordinates are valid. See
/// [validate_coordinate] for more information.
pub fn validate_vertex<V: HasPosition>(vertex: &V) -> Result<(), InsertionError> {
    let position = vertex.position();
    validate_coordinate(position.x)?;
    validate_coordinate(position.y)?;
    Ok(())
}

/// Checks if a spatial vertex is suitable for insertion.
///
/// *See also [validate_vertex]*
pub fn validate_vertex_3d<V: HasPosition3>(vertex: &V) -> Result<(), InsertionError> {
    let position = vertex.position();
    validate_coordinate(position.x)?;
    validate_coordinate(position.y)?;
    validate_coordinate(position.z)?;
    Ok(())
}

/// Prevents underflow issues of a position by setting any coordinate that is too small to zero.
///
/// A vertex added with a position returned by this function will never cause
/// [InsertionError::TooSmall].
/// Note that this method will _always_ round towards zero, even if rounding to
/// ±[MIN_ALLOWED_VALUE] would result in a smaller rounding error.
///
/// # Example
/// ```
/// use tessera::{DelaunayTriangulation2, InsertionError, Point2, TriangulationError};
///
/// let mut triangulation = DelaunayTriangulation2::<Point2<f64>>::new();
///
/// let invalid_position = Point2::new(1.0e-44, 42.0);
/// assert_eq!(
///     triangulation.add_point(invalid_position),
///     Err(TriangulationError::InvalidCoordinate(InsertionError::TooSmall))
/// );
///
/// let valid_position = tessera::mitigate_underflow(invalid_position);
/// assert!(triangulation.add_point(valid_position).is_ok());
/// assert_eq!(valid_position, Point2::new(0.0, 42.0));
/// ```
pub fn mitigate_underflow(position: Point2<f64>) -> Point2<f64> {
    Point2::new(
        mitigate_underflow_for_coordinate(position.x),
        mitigate_underflow_for_coordinate(position.y),
    )
}

fn mitigate_underflow_for_coordinate<S: MeshNum>(coordinate: S) -> S {
    if coordinate != S::zero() && coordinate.abs().into() < MIN_ALLOWED_VALUE {
        S::zero()
    } else {
        coordinate
    }
}

/// Returns the circumcenter and the *squared* circumradius of a triangle.
///
/// The denominator is taken from [orient_2d], the result is finite for every triangle
/// that is not exactly collinear.
pub fn circumcenter(positions: [Point2<f64>; 3]) -> (Point2<f64>, f64) {
    let [v0, v1, v2] = positions;
    let b = v1.sub(v0);
    let c = v2.sub(v0);

    let d = 2.0 * orient_2d(v0, v1, v2);
    let len_b = b.dot(b);
    let len_c = c.dot(c);
    let d_inv = 1.0 / d;

    let x = (len_b * c.y - len_c * b.y) * d_inv;
    let y = (-len_b * c.x + len_c * b.x) * d_inv;
    let result = Point2::new(x, y);
    (result.add(v0), x * x + y * y)
}

/// Returns the circumcenter and the *squared* circumradius of a tetrahedron.
///
/// The denominator is taken from [orient_3d], the result is finite for every tetrahedron
/// that is not exactly coplanar.
pub fn circumcenter_3d(positions: [Point3<f64>; 4]) -> (Point3<f64>, f64) {
    let [v0, v1, v2, v3] = positions;
    let a = v1.sub(v0);
    let b = v2.sub(v0);
    let c = v3.sub(v0);

    let b_cross_c = b.cross(c);
    // orient_3d is positive for (v0, v1, v2, v3) iff a . (b x c) is negative.
    let denominator = -2.0 * orient_3d(v0, v1, v2, v3);
    let offset = b_cross_c
        .mul(a.length2())
        .add(c.cross(a).mul(b.length2()))
        .add(a.cross(b).mul(c.length2()))
        .mul(1.0 / denominator);

    (v0.add(offset), offset.length2())
}

/// Unsigned area of a triangle.
pub fn triangle_area(positions: [Point2<f64>; 3]) -> f64 {
    let [v0, v1, v2] = positions;
    let b = v1.sub(v0);
    let c = v2.sub(v0);
    (b.x * c.y - b.y * c.x).abs() * 0.5
}

/// Centroid of a triangle.
pub fn triangle_centroid(positions: [Point2<f64>; 3]) -> Point2<f64> {
    let [v0, v1, v2] = positions;
    v0.add(v1).add(v2).mul(1.0 / 3.0)
}

/// Unsigned volume of a tetrahedron.
pub fn tetrahedron_volume(positions: [Point3<f64>; 4]) -> f64 {
    let [v0, v1, v2, v3] = positions;
    let a = v1.sub(v0);
    let b = v2.sub(v0);
    let c = v3.sub(v0);
    a.dot(b.cross(c)).abs() / 6.0
}

/// Distance of `query_point` to the infinite line through `p1` and `p2`.
pub fn distance_to_line(p1: Point2<f64>, p2: Point2<f64>, query_point: Point2<f64>) -> f64 {
    let dir = p2.sub(p1);
    let length = dir.length2().sqrt();
    let q = query_point.sub(p1);
    (dir.x * q.y - dir.y * q.x).abs() / length
}

/// Distance of `query_point` to the plane through `a`, `b` and `c`.
pub fn distance_to_plane(
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
    query_point: Point3<f64>,
) -> f64 {
    let normal = b.sub(a).cross(c.sub(a));
    normal.dot(query_point.sub(a)).abs() / normal.length2().sqrt()
}

fn distance_point_to_line_3d(from: Point3<f64>, to: Point3<f64>, query: Point3<f64>) -> f64 {
    let dir = to.sub(from);
    let cross = dir.cross(query.sub(from));
    (cross.length2() / dir.length2()).sqrt()
}

/// Distance between the infinite lines through `(p0, p1)` and `(q0, q1)`.
fn line_distance_3d(p0: Point3<f64>, p1: Point3<f64>, q0: Point3<f64>, q1: Point3<f64>) -> f64 {
    let d0 = p1.sub(p0);
    let d1 = q1.sub(q0);
    let normal = d0.cross(d1);
    let normal_length2 = normal.length2();
    if normal_length2 <= f64::EPSILON * d0.length2() * d1.length2() {
        // parallel
        return distance_point_to_line_3d(p0, p1, q0);
    }
    normal.dot(q0.sub(p0)).abs() / normal_length2.sqrt()
}

/// Returns the minimal distance between the lines of opposite edges divided by the
/// shortest edge length.
///
/// Well shaped tetrahedra have a ratio close to `1 / sqrt(2)`, slivers (four nearly
/// coplanar vertices spread around a circle) have a ratio close to zero.
pub fn sliver_ratio(positions: [Point3<f64>; 4]) -> f64 {
    let [v0, v1, v2, v3] = positions;
    let min_edge_length2 = [
        v0.distance_2(v1),
        v0.distance_2(v2),
        v0.distance_2(v3),
        v1.distance_2(v2),
        v1.distance_2(v3),
        v2.distance_2(v3),
    ]
    .into_iter()
    .fold(f64::INFINITY, f64::min);

    let min_edge_distance = line_distance_3d(v0, v1, v2, v3)
        .min(line_distance_3d(v0, v2, v1, v3))
        .min(line_distance_3d(v0, v3, v1, v2));

    min_edge_distance / min_edge_length2.sqrt()
}
