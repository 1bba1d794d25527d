//! Adaptive geometric predicates.
//!
//! Every predicate first evaluates its determinant in plain double precision and compares
//! the result against a static error bound derived from the magnitude of the input
//! coordinates. Only if the result is too close to zero to be trusted, the determinant is
//! re-evaluated with the exact adaptive arithmetic of the [robust] crate.
//!
//! The error bounds are the "A" bounds of Shewchuk's *Adaptive Precision Floating-Point
//! Arithmetic and Fast Robust Geometric Predicates*.

use crate::{LineSideInfo, PlaneSideInfo, Point2, Point3};
use tracing::trace;

const EPSILON: f64 = f64::EPSILON * 0.5;
const CCW_ERROR_BOUND: f64 = (3.0 + 16.0 * EPSILON) * EPSILON;
const O3D_ERROR_BOUND: f64 = (7.0 + 56.0 * EPSILON) * EPSILON;
const ICC_ERROR_BOUND: f64 = (10.0 + 96.0 * EPSILON) * EPSILON;
const ISP_ERROR_BOUND: f64 = (16.0 + 224.0 * EPSILON) * EPSILON;

fn to_robust_coord(point: Point2<f64>) -> robust::Coord<f64> {
    robust::Coord {
        x: point.x,
        y: point.y,
    }
}

fn to_robust_coord_3d(point: Point3<f64>) -> robust::Coord3D<f64> {
    robust::Coord3D {
        x: point.x,
        y: point.y,
        z: point.z,
    }
}

fn orient_2d_fast(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> Option<f64> {
    let det_left = (a.x - c.x) * (b.y - c.y);
    let det_right = (a.y - c.y) * (b.x - c.x);
    let det = det_left - det_right;

    let det_sum = if det_left > 0.0 {
        if det_right <= 0.0 {
            return Some(det);
        }
        det_left + det_right
    } else if det_left < 0.0 {
        if det_right >= 0.0 {
            return Some(det);
        }
        -det_left - det_right
    } else {
        return Some(det);
    };

    let error_bound = CCW_ERROR_BOUND * det_sum;
    (det >= error_bound || -det >= error_bound).then_some(det)
}

/// Returns a positive value if `a, b, c` are ordered counterclockwise, a negative value if
/// they are ordered clockwise and zero if they are collinear.
///
/// Only the sign of the result is exact.
pub fn orient_2d(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    orient_2d_fast(a, b, c).unwrap_or_else(|| {
        trace!("orient_2d: escalating to exact arithmetic");
        robust::orient2d(to_robust_coord(a), to_robust_coord(b), to_robust_coord(c))
    })
}

fn in_circle_fast(
    a: Point2<f64>,
    b: Point2<f64>,
    c: Point2<f64>,
    d: Point2<f64>,
) -> Option<f64> {
    let (adx, ady) = (a.x - d.x, a.y - d.y);
    let (bdx, bdy) = (b.x - d.x, b.y - d.y);
    let (cdx, cdy) = (c.x - d.x, c.y - d.y);

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;
    let alift = adx * adx + ady * ady;

    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let blift = bdx * bdx + bdy * bdy;

    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;
    let clift = cdx * cdx + cdy * cdy;

    let det = alift * (bdxcdy - cdxbdy) + blift * (cdxady - adxcdy) + clift * (adxbdy - bdxady);
    let permanent = (bdxcdy.abs() + cdxbdy.abs()) * alift
        + (cdxady.abs() + adxcdy.abs()) * blift
        + (adxbdy.abs() + bdxady.abs()) * clift;

    let error_bound = ICC_ERROR_BOUND * permanent;
    (det > error_bound || -det > error_bound).then_some(det)
}

/// Returns a positive value if `d` lies inside the circle through `a, b, c`, a negative
/// value if it lies outside and zero if all four points are co-circular.
///
/// `a, b, c` must be ordered counterclockwise, otherwise the sign is reversed.
pub fn in_circle(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>, d: Point2<f64>) -> f64 {
    in_circle_fast(a, b, c, d).unwrap_or_else(|| {
        trace!("in_circle: escalating to exact arithmetic");
        robust::incircle(
            to_robust_coord(a),
            to_robust_coord(b),
            to_robust_coord(c),
            to_robust_coord(d),
        )
    })
}

fn orient_3d_fast(
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
    d: Point3<f64>,
) -> Option<f64> {
    let (adx, ady, adz) = (a.x - d.x, a.y - d.y, a.z - d.z);
    let (bdx, bdy, bdz) = (b.x - d.x, b.y - d.y, b.z - d.z);
    let (cdx, cdy, cdz) = (c.x - d.x, c.y - d.y, c.z - d.z);

    let bdxcdy = bdx * cdy;
    let cdxbdy = cdx * bdy;
    let cdxady = cdx * ady;
    let adxcdy = adx * cdy;
    let adxbdy = adx * bdy;
    let bdxady = bdx * ady;

    let det = adz * (bdxcdy - cdxbdy) + bdz * (cdxady - adxcdy) + cdz * (adxbdy - bdxady);
    let permanent = (bdxcdy.abs() + cdxbdy.abs()) * adz.abs()
        + (cdxady.abs() + adxcdy.abs()) * bdz.abs()
        + (adxbdy.abs() + bdxady.abs()) * cdz.abs();

    let error_bound = O3D_ERROR_BOUND * permanent;
    (det > error_bound || -det > error_bound).then_some(det)
}

/// Returns a positive value if `d` lies below the plane through `a, b, c`, a negative value
/// if it lies above and zero if the four points are coplanar.
///
/// "Below" is defined such that `a, b, c` appear counterclockwise when viewed from above.
/// A tetrahedron `(a, b, c, d)` with a positive result is called *positively oriented*.
pub fn orient_3d(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>, d: Point3<f64>) -> f64 {
    orient_3d_fast(a, b, c, d).unwrap_or_else(|| {
        trace!("orient_3d: escalating to exact arithmetic");
        robust::orient3d(
            to_robust_coord_3d(a),
            to_robust_coord_3d(b),
            to_robust_coord_3d(c),
            to_robust_coord_3d(d),
        )
    })
}

fn in_sphere_fast(
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
    d: Point3<f64>,
    e: Point3<f64>,
) -> Option<f64> {
    let (aex, aey, aez) = (a.x - e.x, a.y - e.y, a.z - e.z);
    let (bex, bey, bez) = (b.x - e.x, b.y - e.y, b.z - e.z);
    let (cex, cey, cez) = (c.x - e.x, c.y - e.y, c.z - e.z);
    let (dex, dey, dez) = (d.x - e.x, d.y - e.y, d.z - e.z);

    let aexbey = aex * bey;
    let bexaey = bex * aey;
    let ab = aexbey - bexaey;
    let bexcey = bex * cey;
    let cexbey = cex * bey;
    let bc = bexcey - cexbey;
    let cexdey = cex * dey;
    let dexcey = dex * cey;
    let cd = cexdey - dexcey;
    let dexaey = dex * aey;
    let aexdey = aex * dey;
    let da = dexaey - aexdey;
    let aexcey = aex * cey;
    let cexaey = cex * aey;
    let ac = aexcey - cexaey;
    let bexdey = bex * dey;
    let dexbey = dex * bey;
    let bd = bexdey - dexbey;

    let abc = aez * bc - bez * ac + cez * ab;
    let bcd = bez * cd - cez * bd + dez * bc;
    let cda = cez * da + dez * ac + aez * cd;
    let dab = dez * ab + aez * bd + bez * da;

    let alift = aex * aex + aey * aey + aez * aez;
    let blift = bex * bex + bey * bey + bez * bez;
    let clift = cex * cex + cey * cey + cez * cez;
    let dlift = dex * dex + dey * dey + dez * dez;

    let det = (dlift * abc - clift * dab) + (blift * cda - alift * bcd);

    let (aez, bez, cez, dez) = (aez.abs(), bez.abs(), cez.abs(), dez.abs());
    let (aexbey, bexaey) = (aexbey.abs(), bexaey.abs());
    let (bexcey, cexbey) = (bexcey.abs(), cexbey.abs());
    let (cexdey, dexcey) = (cexdey.abs(), dexcey.abs());
    let (dexaey, aexdey) = (dexaey.abs(), aexdey.abs());
    let (aexcey, cexaey) = (aexcey.abs(), cexaey.abs());
    let (bexdey, dexbey) = (bexdey.abs(), dexbey.abs());

    let permanent = ((cexdey + dexcey) * bez + (dexbey + bexdey) * cez + (bexcey + cexbey) * dez)
        * alift
        + ((dexaey + aexdey) * cez + (aexcey + cexaey) * dez + (cexdey + dexcey) * aez) * blift
        + ((aexbey + bexaey) * dez + (bexdey + dexbey) * aez + (dexaey + aexdey) * bez) * clift
        + ((bexcey + cexbey) * aez + (cexaey + aexcey) * bez + (aexbey + bexaey) * cez) * dlift;

    let error_bound = ISP_ERROR_BOUND * permanent;
    (det > error_bound || -det > error_bound).then_some(det)
}

/// Returns a positive value if `e` lies inside the sphere through `a, b, c, d`, a negative
/// value if it lies outside and zero if all five points are co-spherical.
///
/// `(a, b, c, d)` must be positively oriented (see [orient_3d]), otherwise the sign is
/// reversed.
pub fn in_sphere(
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
    d: Point3<f64>,
    e: Point3<f64>,
) -> f64 {
    in_sphere_fast(a, b, c, d, e).unwrap_or_else(|| {
        trace!("in_sphere: escalating to exact arithmetic");
        robust::insphere(
            to_robust_coord_3d(a),
            to_robust_coord_3d(b),
            to_robust_coord_3d(c),
            to_robust_coord_3d(d),
            to_robust_coord_3d(e),
        )
    })
}

/// Returns on which side of the directed line `p1 -> p2` the query point lies.
pub fn side_query(p1: Point2<f64>, p2: Point2<f64>, query_point: Point2<f64>) -> LineSideInfo {
    LineSideInfo::from_determinant(orient_2d(p1, p2, query_point))
}

/// Returns on which side of the oriented plane through `a, b, c` the query point lies.
pub fn plane_side_query(
    a: Point3<f64>,
    b: Point3<f64>,
    c: Point3<f64>,
    query_point: Point3<f64>,
) -> PlaneSideInfo {
    PlaneSideInfo::from_determinant(orient_3d(a, b, c, query_point))
}

/// Returns `true` if `p` lies strictly inside the circumcircle of `v1, v2, v3`.
///
/// The vertex order does not matter. Returns `false` for collinear vertices.
pub fn contained_in_circumcircle(
    v1: Point2<f64>,
    v2: Point2<f64>,
    v3: Point2<f64>,
    p: Point2<f64>,
) -> bool {
    let orientation = orient_2d(v1, v2, v3);
    if orientation == 0.0 {
        return false;
    }
    in_circle(v1, v2, v3, p) * orientation.signum() > 0.0
}

/// Returns `true` if `p` lies strictly inside the circumsphere of `v0, v1, v2, v3`.
///
/// The vertex order does not matter. Returns `false` for coplanar vertices.
pub fn contained_in_circumsphere(vertices: [Point3<f64>; 4], p: Point3<f64>) -> bool {
    let [v0, v1, v2, v3] = vertices;
    let orientation = orient_3d(v0, v1, v2, v3);
    if orientation == 0.0 {
        return false;
    }
    in_sphere(v0, v1, v2, v3, p) * orientation.signum() > 0.0
}

/// Returns `true` if two segments cross in a single point that is interior to both.
pub fn segments_cross_properly(
    from0: Point2<f64>,
    to0: Point2<f64>,
    from1: Point2<f64>,
    to1: Point2<f64>,
) -> bool {
    let other_from = orient_2d(from0, to0, from1);
    let other_to = orient_2d(from0, to0, to1);
    let self_from = orient_2d(from1, to1, from0);
    let self_to = orient_2d(from1, to1, to0);

    other_from * other_to < 0.0 && self_from * self_to < 0.0
}

/// Returns `true` if the segment `from -> to` shares at least one point with the closed
/// triangle spanned by `triangle`.
pub fn segment_intersects_triangle(
    from: Point2<f64>,
    to: Point2<f64>,
    triangle: [Point2<f64>; 3],
) -> bool {
    let orientation = orient_2d(triangle[0], triangle[1], triangle[2]);
    if orientation == 0.0 {
        // Flat triangle: check against its edges instead.
        return (0..3).any(|i| {
            segments_intersect(from, to, triangle[i], triangle[(i + 1) % 3])
        });
    }

    let inside = |p: Point2<f64>| {
        (0..3).all(|i| orient_2d(triangle[i], triangle[(i + 1) % 3], p) * orientation >= 0.0)
    };
    if inside(from) || inside(to) {
        return true;
    }
    (0..3).any(|i| segments_intersect(from, to, triangle[i], triangle[(i + 1) % 3]))
}

/// Returns `true` if two closed segments share at least one point. Handles collinear and
/// degenerate segments.
pub fn segments_intersect(
    from0: Point2<f64>,
    to0: Point2<f64>,
    from1: Point2<f64>,
    to1: Point2<f64>,
) -> bool {
    let d0 = orient_2d(from0, to0, from1);
    let d1 = orient_2d(from0, to0, to1);
    let d2 = orient_2d(from1, to1, from0);
    let d3 = orient_2d(from1, to1, to0);

    if d0 * d1 < 0.0 && d2 * d3 < 0.0 {
        return true;
    }

    let on_segment = |from: Point2<f64>, to: Point2<f64>, p: Point2<f64>| {
        p.x >= from.x.min(to.x)
            && p.x <= from.x.max(to.x)
            && p.y >= from.y.min(to.y)
            && p.y <= from.y.max(to.y)
    };

    (d0 == 0.0 && on_segment(from0, to0, from1))
        || (d1 == 0.0 && on_segment(from0, to0, to1))
        || (d2 == 0.0 && on_segment(from1, to1, from0))
        || (d3 == 0.0 && on_segment(from1, to1, to0))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_utilities::{random_points_3d_with_seed, random_points_with_seed, SEED, SEED2};

    #[test]
    fn test_orientation_signs() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(1.0, 0.0);
        let c = Point2::new(0.0, 1.0);
        assert!(orient_2d(a, b, c) > 0.0);
        assert!(orient_2d(a, c, b) < 0.0);
        assert_eq!(orient_2d(a, b, Point2::new(2.0, 0.0)), 0.0);
        assert!(side_query(a, b, c).is_left());
        assert!(side_query(b, a, c).is_right());
        assert!(side_query(a, b, Point2::new(-3.0, 0.0)).is_on_line());

        let a3 = Point3::new(0.0, 0.0, 0.0);
        let b3 = Point3::new(1.0, 0.0, 0.0);
        let c3 = Point3::new(0.0, 1.0, 0.0);
        let below = Point3::new(0.0, 0.0, -1.0);
        let above = Point3::new(0.0, 0.0, 1.0);
        assert!(orient_3d(a3, b3, c3, below) > 0.0);
        assert!(orient_3d(a3, b3, c3, above) < 0.0);
        assert!(plane_side_query(a3, b3, c3, below).is_below());
        assert!(plane_side_query(a3, b3, c3, Point3::new(0.3, 0.3, 0.0)).is_on_plane());
    }

    #[test]
    fn test_in_circle_and_sphere() {
        let a = Point2::new(1.0, 0.0);
        let b = Point2::new(0.0, 1.0);
        let c = Point2::new(-1.0, 0.0);
        assert!(in_circle(a, b, c, Point2::new(0.0, 0.0)) > 0.0);
        assert!(in_circle(a, b, c, Point2::new(2.0, 0.0)) < 0.0);
        assert_eq!(in_circle(a, b, c, Point2::new(0.0, -1.0)), 0.0);
        assert!(contained_in_circumcircle(c, b, a, Point2::new(0.1, 0.1)));
        assert!(!contained_in_circumcircle(a, b, c, Point2::new(0.0, -1.0)));

        let t = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        assert!(orient_3d(t[0], t[1], t[2], t[3]) > 0.0);
        let center = Point3::new(0.5, 0.5, -0.5);
        assert!(in_sphere(t[0], t[1], t[2], t[3], center) > 0.0);
        assert!(in_sphere(t[0], t[1], t[2], t[3], Point3::new(3.0, 0.0, 0.0)) < 0.0);
        assert_eq!(in_sphere(t[0], t[1], t[2], t[3], Point3::new(1.0, 1.0, -1.0)), 0.0);
        assert!(contained_in_circumsphere([t[1], t[0], t[2], t[3]], center));
    }

    #[test]
    fn test_fast_filter_agrees_with_exact() {
        let points = random_points_with_seed(400, SEED);
        for chunk in points.chunks_exact(4) {
            let [a, b, c, d] = [chunk[0], chunk[1], chunk[2], chunk[3]];
            let exact = robust::orient2d(to_robust_coord(a), to_robust_coord(b), to_robust_coord(c));
            assert_eq!(orient_2d(a, b, c).signum(), exact.signum());
            let exact = robust::incircle(
                to_robust_coord(a),
                to_robust_coord(b),
                to_robust_coord(c),
                to_robust_coord(d),
            );
            assert_eq!(in_circle(a, b, c, d).signum(), exact.signum());
        }

        let points = random_points_3d_with_seed(500, SEED2);
        for chunk in points.chunks_exact(5) {
            let c: Vec<_> = chunk.iter().map(|p| to_robust_coord_3d(*p)).collect();
            let exact = robust::orient3d(c[0], c[1], c[2], c[3]);
            assert_eq!(
                orient_3d(chunk[0], chunk[1], chunk[2], chunk[3]).signum(),
                exact.signum()
            );
            let exact = robust::insphere(c[0], c[1], c[2], c[3], c[4]);
            assert_eq!(
                in_sphere(chunk[0], chunk[1], chunk[2], chunk[3], chunk[4]).signum(),
                exact.signum()
            );
        }
    }

    #[test]
    fn test_near_degenerate_escalates() {
        // Nearly collinear points where the double precision result is unreliable.
        let a = Point2::new(0.5, 0.5);
        let b = Point2::new(12.0, 12.0);
        let c = Point2::new(24.0, 24.0 + 16.0 * f64::EPSILON);
        assert!(orient_2d(a, b, c) > 0.0);
        assert!(orient_2d(a, c, b) < 0.0);
        assert_eq!(orient_2d(a, b, Point2::new(24.0, 24.0)), 0.0);
    }

    #[test]
    fn test_segments() {
        let (f0, t0) = (Point2::new(0., 0.), Point2::new(5., 5.0));
        let (f1, t1) = (Point2::new(-1.5, 1.), Point2::new(1.0, -1.5));
        let (f2, t2) = (Point2::new(0.5, 4.), Point2::new(0.5, -4.));

        assert!(!segments_intersect(f0, t0, f1, t1));
        assert!(segments_intersect(f0, t0, f2, t2));
        assert!(segments_intersect(f1, t1, f2, t2));
        assert!(segments_cross_properly(f0, t0, f2, t2));
        assert!(!segments_cross_properly(f0, t0, f1, t1));

        // Shared endpoint is an intersection but not a proper crossing.
        let (f3, t3) = (Point2::new(5.0, 5.0), Point2::new(7.0, 0.0));
        assert!(segments_intersect(f0, t0, f3, t3));
        assert!(!segments_cross_properly(f0, t0, f3, t3));

        // Collinear overlap
        assert!(segments_intersect(
            f0,
            t0,
            Point2::new(4.0, 4.0),
            Point2::new(6.0, 6.0)
        ));
        assert!(!segments_intersect(
            f0,
            t0,
            Point2::new(6.0, 6.0),
            Point2::new(7.0, 7.0)
        ));
    }

    #[test]
    fn test_segment_triangle() {
        let t = [
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(0.0, 4.0),
        ];
        // Crossing without endpoints inside.
        assert!(segment_intersects_triangle(
            Point2::new(-1.0, 1.0),
            Point2::new(5.0, 1.0),
            t
        ));
        // Fully inside.
        assert!(segment_intersects_triangle(
            Point2::new(0.5, 0.5),
            Point2::new(1.0, 1.0),
            t
        ));
        // Touching a vertex.
        assert!(segment_intersects_triangle(
            Point2::new(4.0, 0.0),
            Point2::new(6.0, -2.0),
            t
        ));
        assert!(!segment_intersects_triangle(
            Point2::new(3.0, 3.0),
            Point2::new(6.0, 6.0),
            t
        ));
    }
}
