use super::handles::{FixedTetrahedronHandle, FixedTriangleHandle, PointId};
use crate::math::{circumcenter, circumcenter_3d};
use crate::{Point2, Point3};

/// Vertex indices of each triangle edge. Edge `e` is opposite to vertex `e`.
///
/// For a counterclockwise triangle, each edge in this order is traversed counterclockwise.
pub const EDGE_VERTEX_MAP: [[usize; 2]; 3] = [[1, 2], [2, 0], [0, 1]];

/// Vertex indices of each tetrahedron face. Face `f` is opposite to vertex `f`.
///
/// Appending the opposite vertex to a face in this order yields an even permutation of the
/// tetrahedron's vertices, i.e. `(face[0], face[1], face[2], f)` keeps the orientation.
pub const FACE_VERTEX_MAP: [[usize; 3]; 4] = [[3, 2, 1], [3, 0, 2], [3, 1, 0], [0, 1, 2]];

/// A triangle of a planar triangulation.
///
/// Neighbor `i` lies across edge `i` (see [EDGE_VERTEX_MAP]).
#[derive(Debug, Clone)]
pub struct Triangle<F> {
    points: [PointId; 3],
    neighbors: [Option<FixedTriangleHandle>; 3],
    circumcenter: Point2<f64>,
    circumradius: f64,
    pub(crate) marked: bool,
    data: F,
}

impl<F> Triangle<F> {
    /// # Panics
    ///
    /// Panics if the circumradius is not a positive finite number.
    pub(crate) fn new(points: [PointId; 3], positions: [Point2<f64>; 3], data: F) -> Self {
        let (center, radius2) = circumcenter(positions);
        let circumradius = radius2.sqrt();
        assert!(
            circumradius.is_finite() && circumradius > 0.0,
            "Degenerate triangle {:?}",
            points
        );
        Self {
            points,
            neighbors: [None; 3],
            circumcenter: center,
            circumradius,
            marked: false,
            data,
        }
    }

    /// Returns the vertices in counterclockwise order.
    pub fn points(&self) -> [PointId; 3] {
        self.points
    }

    /// Returns vertex `index`.
    pub fn point(&self, index: usize) -> PointId {
        self.points[index]
    }

    /// Returns the neighbor across each edge.
    pub fn neighbors(&self) -> [Option<FixedTriangleHandle>; 3] {
        self.neighbors
    }

    /// Returns the neighbor across `edge`, `None` at the border of the cage.
    pub fn neighbor(&self, edge: usize) -> Option<FixedTriangleHandle> {
        self.neighbors[edge]
    }

    /// Returns the end points of an edge in counterclockwise order.
    pub fn edge(&self, edge: usize) -> [PointId; 2] {
        let [from, to] = EDGE_VERTEX_MAP[edge];
        [self.points[from], self.points[to]]
    }

    /// Center of the circumscribed circle.
    pub fn circumcenter(&self) -> Point2<f64> {
        self.circumcenter
    }

    /// Radius of the circumscribed circle.
    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }

    /// Returns `true` if any vertex is a dummy point.
    pub fn is_dummy(&self) -> bool {
        self.points.iter().any(PointId::is_dummy)
    }

    /// Returns `true` if `point` is a vertex of this simplex.
    pub fn has_point(&self, point: PointId) -> bool {
        self.points.contains(&point)
    }

    /// Returns the vertex index of `point`.
    pub fn index_of(&self, point: PointId) -> Option<usize> {
        self.points.iter().position(|p| *p == point)
    }

    /// Returns the index of the edge connecting `a` and `b`, regardless of direction.
    pub fn edge_index(&self, a: PointId, b: PointId) -> Option<usize> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        if ia == ib {
            return None;
        }
        Some(3 - ia - ib)
    }

    /// Returns the edge index across which `neighbor` lies.
    pub fn neighbor_index(&self, neighbor: FixedTriangleHandle) -> Option<usize> {
        self.neighbors.iter().position(|n| *n == Some(neighbor))
    }

    /// Returns the payload.
    pub fn data(&self) -> &F {
        &self.data
    }

    /// Returns the payload.
    pub fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }

    pub(crate) fn set_neighbor(&mut self, edge: usize, neighbor: Option<FixedTriangleHandle>) {
        self.neighbors[edge] = neighbor;
    }

    /// Swaps vertices 1 and 2, flipping the winding.
    pub(crate) fn flip(&mut self) {
        self.points.swap(1, 2);
        self.neighbors.swap(1, 2);
    }
}

/// A tetrahedron of a tetrahedralization.
///
/// Neighbor `i` lies across face `i` (see [FACE_VERTEX_MAP]).
#[derive(Debug, Clone)]
pub struct Tetrahedron<F> {
    points: [PointId; 4],
    neighbors: [Option<FixedTetrahedronHandle>; 4],
    circumcenter: Point3<f64>,
    circumradius: f64,
    pub(crate) marked: bool,
    data: F,
}

impl<F> Tetrahedron<F> {
    /// # Panics
    ///
    /// Panics if the circumradius is not a positive finite number.
    pub(crate) fn new(points: [PointId; 4], positions: [Point3<f64>; 4], data: F) -> Self {
        let (center, radius2) = circumcenter_3d(positions);
        let circumradius = radius2.sqrt();
        assert!(
            circumradius.is_finite() && circumradius > 0.0,
            "Degenerate tetrahedron {:?}",
            points
        );
        Self {
            points,
            neighbors: [None; 4],
            circumcenter: center,
            circumradius,
            marked: false,
            data,
        }
    }

    /// Returns the vertices of this positively oriented tetrahedron.
    pub fn points(&self) -> [PointId; 4] {
        self.points
    }

    /// Returns vertex `index`.
    pub fn point(&self, index: usize) -> PointId {
        self.points[index]
    }

    /// Returns the neighbor across each face.
    pub fn neighbors(&self) -> [Option<FixedTetrahedronHandle>; 4] {
        self.neighbors
    }

    /// Returns the neighbor across `face`, `None` at the border of the cage.
    pub fn neighbor(&self, face: usize) -> Option<FixedTetrahedronHandle> {
        self.neighbors[face]
    }

    /// Returns the vertices of a face, ordered such that they appear counterclockwise
    /// when viewed from outside of a positively oriented tetrahedron.
    pub fn face(&self, face: usize) -> [PointId; 3] {
        let [a, b, c] = FACE_VERTEX_MAP[face];
        [self.points[a], self.points[b], self.points[c]]
    }

    /// Center of the circumscribed sphere.
    pub fn circumcenter(&self) -> Point3<f64> {
        self.circumcenter
    }

    /// Radius of the circumscribed sphere.
    pub fn circumradius(&self) -> f64 {
        self.circumradius
    }

    /// Returns `true` if any vertex is a dummy point.
    pub fn is_dummy(&self) -> bool {
        self.points.iter().any(PointId::is_dummy)
    }

    /// Returns `true` if `point` is a vertex of this simplex.
    pub fn has_point(&self, point: PointId) -> bool {
        self.points.contains(&point)
    }

    /// Returns the vertex index of `point`.
    pub fn index_of(&self, point: PointId) -> Option<usize> {
        self.points.iter().position(|p| *p == point)
    }

    /// Returns the index of the face made of the given points, in any order.
    pub fn face_index(&self, face: [PointId; 3]) -> Option<usize> {
        let mut missing = None;
        for (index, point) in self.points.iter().enumerate() {
            if !face.contains(point) {
                if missing.is_some() {
                    return None;
                }
                missing = Some(index);
            }
        }
        missing
    }

    /// Returns the face index across which `neighbor` lies.
    pub fn neighbor_index(&self, neighbor: FixedTetrahedronHandle) -> Option<usize> {
        self.neighbors.iter().position(|n| *n == Some(neighbor))
    }

    /// Returns the payload.
    pub fn data(&self) -> &F {
        &self.data
    }

    /// Returns the payload.
    pub fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }

    pub(crate) fn set_neighbor(&mut self, face: usize, neighbor: Option<FixedTetrahedronHandle>) {
        self.neighbors[face] = neighbor;
    }

    /// Swaps vertices 2 and 3, flipping the orientation.
    pub(crate) fn flip(&mut self) {
        self.points.swap(2, 3);
        self.neighbors.swap(2, 3);
    }
}

#[cfg(test)]
mod test {
    use super::{Tetrahedron, Triangle, EDGE_VERTEX_MAP, FACE_VERTEX_MAP};
    use crate::handles::PointId;
    use crate::predicates::orient_3d;
    use crate::{Point2, Point3};
    use approx::assert_relative_eq;

    fn ids<const N: usize>() -> [PointId; N] {
        let mut result = [PointId::real(0); N];
        for (index, id) in result.iter_mut().enumerate() {
            *id = PointId::real(index);
        }
        result
    }

    #[test]
    fn test_triangle_edges() {
        let triangle = Triangle::new(
            ids::<3>(),
            [
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(0.0, 1.0),
            ],
            (),
        );
        assert_relative_eq!(triangle.circumradius(), 0.5f64.sqrt());
        for edge in 0..3 {
            let [a, b] = triangle.edge(edge);
            assert!(!EDGE_VERTEX_MAP[edge].contains(&edge));
            assert_eq!(triangle.edge_index(a, b), Some(edge));
            assert_eq!(triangle.edge_index(b, a), Some(edge));
        }
        assert_eq!(triangle.edge_index(PointId::real(0), PointId::real(5)), None);
        assert!(!triangle.is_dummy());
    }

    #[test]
    fn test_face_map_keeps_orientation() {
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        assert!(orient_3d(positions[0], positions[1], positions[2], positions[3]) > 0.0);
        for (face, [a, b, c]) in FACE_VERTEX_MAP.iter().copied().enumerate() {
            assert!(
                orient_3d(positions[a], positions[b], positions[c], positions[face]) > 0.0
            );
        }

        let tetrahedron = Tetrahedron::new(ids::<4>(), positions, ());
        for face in 0..4 {
            assert_eq!(tetrahedron.face_index(tetrahedron.face(face)), Some(face));
        }
    }

    #[test]
    fn test_flip() {
        let mut triangle = Triangle::new(
            ids::<3>(),
            [
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(0.0, 1.0),
            ],
            (),
        );
        let edge = triangle.edge_index(PointId::real(0), PointId::real(1));
        triangle.flip();
        assert_eq!(
            triangle.points(),
            [PointId::real(0), PointId::real(2), PointId::real(1)]
        );
        assert_ne!(
            triangle.edge_index(PointId::real(0), PointId::real(1)),
            edge
        );
    }

    #[test]
    #[should_panic]
    fn test_degenerate_triangle_panics() {
        Triangle::new(
            ids::<3>(),
            [
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(2.0, 0.0),
            ],
            (),
        );
    }
}
