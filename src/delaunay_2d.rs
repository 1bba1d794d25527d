use hashbrown::HashMap;
use tracing::debug;

use crate::error::{TriangulationError, ValidationError};
use crate::handles::{FixedTriangleHandle, PointId, TriangleTag};
use crate::math::{circumcenter, distance_to_line, triangle_area, validate_vertex};
use crate::mesh_core::{
    insert_in_passes, InsertionOutcome, RejectReason, RunState, SimplexArena, Triangle,
};
use crate::predicates::{in_circle, orient_2d};
use crate::{BoundingBox2, HasPosition, InsertionParameters, InsertionReport, Point2};

/// A two dimensional Delaunay triangulation built by incremental insertion.
///
/// Points are registered with [add_point](Self::add_point) and triangulated all at once by
/// [perform](Self::perform). The triangulation is enclosed by a square cage of four dummy
/// points, triangles touching the cage are reported as *dummy* triangles
/// (see [Triangle::is_dummy]). All other triangles form the Delaunay triangulation of the
/// real points.
///
/// Every triangle is stored counterclockwise.
///
/// # Type parameters
///  - `V: HasPosition`: the point type
///  - `F: Default`: payload stored on each triangle. Newly created triangles receive
///    `F::default()`.
///
/// # Example
///
/// ```
/// use tessera::{DelaunayTriangulation2, Point2};
///
/// # fn main() -> Result<(), tessera::TriangulationError> {
/// let mut triangulation = DelaunayTriangulation2::<Point2<f64>>::new();
/// triangulation.add_point(Point2::new(0.0, 0.0))?;
/// triangulation.add_point(Point2::new(10.0, 0.0))?;
/// triangulation.add_point(Point2::new(10.0, 10.0))?;
/// triangulation.add_point(Point2::new(0.0, 10.0))?;
///
/// let report = triangulation.perform()?;
/// assert!(report.is_complete());
/// assert_eq!(triangulation.num_real_triangles(), 2);
/// # Ok(()) }
/// ```
pub struct DelaunayTriangulation2<V, F = ()> {
    pub(crate) points: Vec<V>,
    pub(crate) positions: Vec<Point2<f64>>,
    pub(crate) dummy_positions: Vec<Point2<f64>>,
    pub(crate) inserted: Vec<bool>,
    pub(crate) triangles: SimplexArena<Triangle<F>, TriangleTag>,
    parameters: InsertionParameters,
    state: RunState,
    bounding_box: BoundingBox2,
    cage_size: f64,
}

#[derive(Debug, Clone, Copy)]
struct CavityEdge {
    triangle: FixedTriangleHandle,
    from: PointId,
    to: PointId,
    front: Option<FixedTriangleHandle>,
}

impl<V: HasPosition, F: Default> Default for DelaunayTriangulation2<V, F> {
    fn default() -> Self {
        Self::with_parameters(InsertionParameters::default())
    }
}

impl<V: HasPosition, F: Default> DelaunayTriangulation2<V, F> {
    /// Creates an empty triangulation with default [InsertionParameters].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty triangulation.
    pub fn with_parameters(parameters: InsertionParameters) -> Self {
        Self {
            points: Vec::new(),
            positions: Vec::new(),
            dummy_positions: Vec::new(),
            inserted: Vec::new(),
            triangles: SimplexArena::new(),
            parameters,
            state: RunState::Pending,
            bounding_box: BoundingBox2::new(),
            cage_size: 0.0,
        }
    }

    /// Registers a real point and returns its id.
    ///
    /// Ids are assigned in insertion order, starting at `0`.
    ///
    /// Fails if the point has an invalid coordinate (see [crate::validate_vertex]) or if
    /// [perform](Self::perform) has already been called.
    pub fn add_point(&mut self, point: V) -> Result<PointId, TriangulationError> {
        if self.state != RunState::Pending {
            return Err(TriangulationError::AlreadyPerformed);
        }
        validate_vertex(&point)?;
        let position = point.position().to_f64();
        let id = PointId::real(self.points.len());
        self.bounding_box.add_point(position);
        self.points.push(point);
        self.positions.push(position);
        Ok(id)
    }

    /// Triangulates all registered points.
    ///
    /// Builds the enclosing cage and inserts the points in passes of decreasing stride (see
    /// [InsertionParameters::with_insertion_strides]). Points that cannot be inserted, e.g.
    /// duplicates, are listed in the returned report.
    ///
    /// Requires at least two points. Can only be called once. A failed run leaves the
    /// triangulation in a failed state.
    pub fn perform(&mut self) -> Result<InsertionReport, TriangulationError> {
        if self.state != RunState::Pending {
            return Err(TriangulationError::AlreadyPerformed);
        }
        if self.points.len() < 2 {
            return Err(TriangulationError::NotEnoughPoints {
                required: 2,
                actual: self.points.len(),
            });
        }
        self.state = RunState::Failed;
        self.create_cage()?;

        let strides = self.parameters.insertion_strides().to_vec();
        let (report, inserted) =
            insert_in_passes(&strides, self.points.len(), |id| self.insert_point(id))?;
        self.inserted = inserted;
        self.state = RunState::Performed;

        debug!(
            inserted = report.inserted,
            skipped = report.skipped.len(),
            triangles = self.triangles.len(),
            "triangulation performed"
        );
        Ok(report)
    }

    fn create_cage(&mut self) -> Result<(), TriangulationError> {
        let half_diagonal = self.bounding_box.diagonal_length() * 0.5;
        let size = half_diagonal * self.parameters.cage_scale();
        if !size.is_finite() || size <= 0.0 {
            return Err(TriangulationError::DegenerateBounds);
        }
        let center = self.bounding_box.center();
        self.cage_size = size;
        self.dummy_positions = vec![
            center.add(Point2::new(-size, -size)),
            center.add(Point2::new(size, -size)),
            center.add(Point2::new(size, size)),
            center.add(Point2::new(-size, size)),
        ];

        let corner = PointId::dummy;
        let first = self.create_triangle([corner(0), corner(1), corner(3)]);
        let second = self.create_triangle([corner(2), corner(3), corner(1)]);
        self.triangles.get_mut(first).set_neighbor(0, Some(second));
        self.triangles.get_mut(second).set_neighbor(0, Some(first));

        debug!(size, center = ?center, "created enclosing cage");
        Ok(())
    }

    pub(crate) fn create_triangle(&mut self, points: [PointId; 3]) -> FixedTriangleHandle {
        let positions = points.map(|p| self.pos(p));
        self.triangles
            .insert(Triangle::new(points, positions, F::default()))
    }

    fn insert_point(&mut self, id: PointId) -> Result<InsertionOutcome, TriangulationError> {
        let position = self.pos(id);
        let start = match self.locate_conflicting_triangle(position) {
            Some(start) => start,
            None if self.is_vertex_position(position) => {
                return Ok(InsertionOutcome::Rejected(RejectReason::Duplicate));
            }
            None => return Err(TriangulationError::PointOutsideCage { point: id }),
        };

        let (cavity, boundary) = self.find_cavity(start, position);
        if let Err(reason) = self.check_cavity_boundary(&boundary, position) {
            for handle in &cavity {
                self.triangles.get_mut(*handle).marked = false;
            }
            return Ok(InsertionOutcome::Rejected(reason));
        }

        self.fill_cavity(id, &cavity, &boundary);
        Ok(InsertionOutcome::Inserted {
            cavity_size: cavity.len(),
        })
    }

    fn circumcircle_contains(&self, triangle: &Triangle<F>, position: Point2<f64>) -> bool {
        let [a, b, c] = triangle.points().map(|p| self.pos(p));
        in_circle(a, b, c, position) > 0.0
    }

    fn locate_conflicting_triangle(&self, position: Point2<f64>) -> Option<FixedTriangleHandle> {
        self.triangles
            .iter()
            .find(|(_, triangle)| self.circumcircle_contains(triangle, position))
            .map(|(handle, _)| handle)
    }

    fn is_vertex_position(&self, position: Point2<f64>) -> bool {
        self.triangles
            .iter()
            .any(|(_, triangle)| triangle.points().iter().any(|p| self.pos(*p) == position))
    }

    /// Collects all triangles whose circumcircle contains `position`, starting at `start`.
    ///
    /// The collected triangles are marked. Returns the cavity and its boundary edges.
    fn find_cavity(
        &mut self,
        start: FixedTriangleHandle,
        position: Point2<f64>,
    ) -> (Vec<FixedTriangleHandle>, Vec<CavityEdge>) {
        self.triangles.get_mut(start).marked = true;
        let mut cavity = vec![start];
        let mut stack = vec![start];
        let mut boundary = Vec::new();

        while let Some(current) = stack.pop() {
            for edge in 0..3 {
                let triangle = self.triangles.get(current);
                let front = triangle.neighbor(edge);
                if let Some(neighbor) = front {
                    let neighbor_triangle = self.triangles.get(neighbor);
                    if neighbor_triangle.marked {
                        continue;
                    }
                    if self.circumcircle_contains(neighbor_triangle, position) {
                        self.triangles.get_mut(neighbor).marked = true;
                        cavity.push(neighbor);
                        stack.push(neighbor);
                        continue;
                    }
                }
                let [from, to] = triangle.edge(edge);
                boundary.push(CavityEdge {
                    triangle: current,
                    from,
                    to,
                    front,
                });
            }
        }
        (cavity, boundary)
    }

    fn check_cavity_boundary(
        &self,
        boundary: &[CavityEdge],
        position: Point2<f64>,
    ) -> Result<(), RejectReason> {
        let tolerance = self.parameters.degeneracy_tolerance() * self.cage_size;
        for edge in boundary {
            let from = self.pos(edge.from);
            let to = self.pos(edge.to);
            if orient_2d(from, to, position) <= 0.0 {
                return Err(RejectReason::Degenerate);
            }
            if tolerance > 0.0 && distance_to_line(from, to, position) < tolerance {
                return Err(RejectReason::Degenerate);
            }
            let (_, radius2) = circumcenter([from, to, position]);
            if !radius2.is_finite() || radius2 <= 0.0 {
                return Err(RejectReason::Degenerate);
            }
        }
        Ok(())
    }

    fn fill_cavity(&mut self, id: PointId, cavity: &[FixedTriangleHandle], boundary: &[CavityEdge]) {
        for handle in cavity {
            self.triangles.remove(*handle);
        }

        let mut by_start = HashMap::with_capacity(boundary.len());
        let mut created = Vec::with_capacity(boundary.len());
        for edge in boundary {
            let handle = self.create_triangle([edge.from, edge.to, id]);
            self.triangles.get_mut(handle).set_neighbor(2, edge.front);
            if let Some(front) = edge.front {
                self.replace_neighbor(front, edge.triangle, Some(handle));
            }
            by_start.insert(edge.from, handle);
            created.push((handle, edge.to));
        }

        for (handle, to) in created {
            let next = match by_start.get(&to) {
                Some(next) => *next,
                None => panic!("Cavity boundary is not closed at {:?}", to),
            };
            self.triangles.get_mut(handle).set_neighbor(0, Some(next));
            self.triangles.get_mut(next).set_neighbor(1, Some(handle));
        }
    }

    /// Replaces the back reference of `triangle` to `old` by `new`.
    pub(crate) fn replace_neighbor(
        &mut self,
        triangle: FixedTriangleHandle,
        old: FixedTriangleHandle,
        new: Option<FixedTriangleHandle>,
    ) {
        let triangle = self.triangles.get_mut(triangle);
        match triangle.neighbor_index(old) {
            Some(edge) => triangle.set_neighbor(edge, new),
            None => panic!("Broken adjacency: {:?} is not a neighbor", old),
        }
    }
}

impl<V, F> DelaunayTriangulation2<V, F> {
    /// Returns `true` once [perform](Self::perform) has completed successfully.
    pub fn is_performed(&self) -> bool {
        self.state == RunState::Performed
    }

    /// Number of registered real points.
    pub fn num_points(&self) -> usize {
        self.points.len()
    }

    /// Returns a registered real point. Returns `None` for dummy or unknown ids.
    pub fn point(&self, id: PointId) -> Option<&V> {
        if id.is_dummy() {
            None
        } else {
            self.points.get(id.index())
        }
    }

    /// Returns the position of a real or dummy point.
    pub fn position(&self, id: PointId) -> Option<Point2<f64>> {
        if id.is_dummy() {
            self.dummy_positions.get(id.index()).copied()
        } else {
            self.positions.get(id.index()).copied()
        }
    }

    /// Returns all real points in insertion order.
    pub fn points(&self) -> &[V] {
        &self.points
    }

    /// Positions of the dummy points of the enclosing cage. Dummy point `i` has the id
    /// `-1 - i`.
    pub fn dummy_points(&self) -> &[Point2<f64>] {
        &self.dummy_positions
    }

    /// Returns `true` if the real point is part of the triangulation.
    pub fn is_inserted(&self, id: PointId) -> bool {
        !id.is_dummy() && self.inserted.get(id.index()).copied().unwrap_or(false)
    }

    /// Bounding box of all registered real points.
    pub fn bounding_box(&self) -> BoundingBox2 {
        self.bounding_box
    }

    /// Iterates over all triangles, including dummy triangles.
    pub fn triangles(&self) -> impl Iterator<Item = (FixedTriangleHandle, &Triangle<F>)> + '_ {
        self.triangles.iter()
    }

    /// Iterates over all triangles that don't touch the enclosing cage.
    pub fn real_triangles(
        &self,
    ) -> impl Iterator<Item = (FixedTriangleHandle, &Triangle<F>)> + '_ {
        self.triangles
            .iter()
            .filter(|(_, triangle)| !triangle.is_dummy())
    }

    /// Returns the number of triangles, including dummy triangles.
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the number of triangles that don't touch a dummy point.
    pub fn num_real_triangles(&self) -> usize {
        self.real_triangles().count()
    }

    /// Returns a triangle or `None` if the handle is stale.
    pub fn triangle(&self, handle: FixedTriangleHandle) -> Option<&Triangle<F>> {
        self.triangles.try_get(handle)
    }

    /// Returns the payload of a triangle.
    pub fn triangle_data_mut(&mut self, handle: FixedTriangleHandle) -> Option<&mut F> {
        self.triangles.try_get_mut(handle).map(Triangle::data_mut)
    }

    /// Returns the vertex positions of a triangle.
    pub fn triangle_positions(&self, handle: FixedTriangleHandle) -> Option<[Point2<f64>; 3]> {
        let triangle = self.triangles.try_get(handle)?;
        let mut result = [Point2::new(0.0, 0.0); 3];
        for (position, id) in result.iter_mut().zip(triangle.points()) {
            *position = self.position(id)?;
        }
        Some(result)
    }

    /// Returns the bounding box of a triangle.
    pub fn triangle_bounding_box(&self, handle: FixedTriangleHandle) -> Option<BoundingBox2> {
        self.triangle_positions(handle)
            .map(BoundingBox2::from_points)
    }

    /// Returns the (unsigned) area of a triangle.
    pub fn triangle_area(&self, handle: FixedTriangleHandle) -> Option<f64> {
        self.triangle_positions(handle).map(triangle_area)
    }

    /// Removes triangles from the triangulation.
    ///
    /// Neighbors of removed triangles lose their reference to them. Stale handles are
    /// ignored. Returns the number of removed triangles.
    pub fn delete_triangles(
        &mut self,
        handles: impl IntoIterator<Item = FixedTriangleHandle>,
    ) -> usize {
        let mut removed = 0;
        for handle in handles {
            let Some(triangle) = self.triangles.remove(handle) else {
                continue;
            };
            for neighbor in triangle.neighbors().into_iter().flatten() {
                if let Some(neighbor) = self.triangles.try_get_mut(neighbor) {
                    if let Some(edge) = neighbor.neighbor_index(handle) {
                        neighbor.set_neighbor(edge, None);
                    }
                }
            }
            removed += 1;
        }
        removed
    }

    /// Makes every triangle counterclockwise. Returns the number of flipped triangles.
    ///
    /// Triangles created by [perform](Self::perform) are already counterclockwise, calling
    /// this method again has no effect.
    pub fn reorder_triangles(&mut self) -> usize {
        let mut flipped = 0;
        let positions = &self.positions;
        let dummy_positions = &self.dummy_positions;
        let pos = |id: PointId| {
            if id.is_dummy() {
                dummy_positions[id.index()]
            } else {
                positions[id.index()]
            }
        };
        for (_, triangle) in self.triangles.iter_mut() {
            let [a, b, c] = triangle.points().map(pos);
            if orient_2d(a, b, c) < 0.0 {
                triangle.flip();
                flipped += 1;
            }
        }
        flipped
    }

    pub(crate) fn pos(&self, id: PointId) -> Point2<f64> {
        if id.is_dummy() {
            self.dummy_positions[id.index()]
        } else {
            self.positions[id.index()]
        }
    }

    /// Checks that no inserted real point lies strictly inside the circumcircle of any
    /// real triangle.
    ///
    /// Runs in quadratic time.
    pub fn check_delaunay(&self) -> Result<(), ValidationError> {
        for (handle, triangle) in self.real_triangles() {
            let [a, b, c] = triangle.points().map(|p| self.pos(p));
            for (index, position) in self.positions.iter().enumerate() {
                let id = PointId::real(index);
                if !self.is_inserted(id) || triangle.has_point(id) {
                    continue;
                }
                if in_circle(a, b, c, *position) > 0.0 {
                    return Err(ValidationError::DelaunayViolation {
                        simplex: handle.index(),
                        point: id,
                    });
                }
            }
        }
        Ok(())
    }

    /// Checks that neighbor references are mutual and refer to the shared edge.
    pub fn check_adjacency(&self) -> Result<(), ValidationError> {
        for (handle, triangle) in self.triangles.iter() {
            for edge in 0..3 {
                let Some(neighbor) = triangle.neighbor(edge) else {
                    continue;
                };
                let error = ValidationError::AsymmetricAdjacency {
                    simplex: handle.index(),
                    facet: edge,
                    neighbor: neighbor.index(),
                };
                let Some(neighbor_triangle) = self.triangles.try_get(neighbor) else {
                    return Err(error);
                };
                let Some(back) = neighbor_triangle.neighbor_index(handle) else {
                    return Err(error);
                };
                let [from, to] = triangle.edge(edge);
                if neighbor_triangle.edge(back) != [to, from] {
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Checks that every triangle is counterclockwise and has a positive circumradius.
    pub fn check_orientation(&self) -> Result<(), ValidationError> {
        for (handle, triangle) in self.triangles.iter() {
            let [a, b, c] = triangle.points().map(|p| self.pos(p));
            if orient_2d(a, b, c) <= 0.0 {
                return Err(ValidationError::InvertedSimplex {
                    simplex: handle.index(),
                });
            }
            let radius = triangle.circumradius();
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ValidationError::NonPositiveCircumradius {
                    simplex: handle.index(),
                });
            }
        }
        Ok(())
    }

    /// Runs all structural checks.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.check_orientation()?;
        self.check_adjacency()?;
        self.check_delaunay()
    }
}

#[cfg(test)]
mod test {
    use super::DelaunayTriangulation2;
    use crate::handles::PointId;
    use crate::test_utilities::{random_points_with_seed, square, SEED, SEED2};
    use crate::{InsertionParameters, Point2, TriangulationError};

    fn triangulate(points: Vec<Point2<f64>>) -> DelaunayTriangulation2<Point2<f64>> {
        let mut triangulation = DelaunayTriangulation2::new();
        for point in points {
            triangulation.add_point(point).unwrap();
        }
        let report = triangulation.perform().unwrap();
        assert!(report.is_complete());
        triangulation
    }

    #[test]
    fn test_square() -> Result<(), TriangulationError> {
        let mut triangulation = DelaunayTriangulation2::<Point2<f64>>::new();
        for point in square() {
            triangulation.add_point(point)?;
        }
        let report = triangulation.perform()?;
        assert_eq!(report.inserted, 4);

        let real: Vec<_> = triangulation.real_triangles().collect();
        assert_eq!(real.len(), 2);
        let (first_handle, first) = real[0];
        let (second_handle, second) = real[1];
        let shared: Vec<_> = first
            .points()
            .into_iter()
            .filter(|p| second.has_point(*p))
            .collect();
        assert_eq!(shared.len(), 2);
        let edge = first.edge_index(shared[0], shared[1]).unwrap();
        assert_eq!(first.neighbor(edge), Some(second_handle));
        assert!(second.neighbor_index(first_handle).is_some());
        // The shared edge is a diagonal, not a side.
        assert_eq!((shared[0].index() as i32 - shared[1].index() as i32).abs(), 2);

        triangulation.validate().unwrap();
        Ok(())
    }

    #[test]
    fn test_hexagon_with_center() {
        let mut points: Vec<_> = (0..6)
            .map(|i| {
                let angle = std::f64::consts::PI / 3.0 * i as f64;
                Point2::new(angle.cos(), angle.sin())
            })
            .collect();
        points.push(Point2::new(0.0, 0.0));
        let triangulation = triangulate(points);

        let center = PointId::real(6);
        let real: Vec<_> = triangulation.real_triangles().collect();
        assert_eq!(real.len(), 6);
        assert!(real.iter().all(|(_, triangle)| triangle.has_point(center)));
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_cocircular_square_with_center() {
        let mut points = square();
        points.push(Point2::new(5.0, 5.0));
        let triangulation = triangulate(points);
        assert_eq!(triangulation.num_real_triangles(), 4);
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_cocircular_points() {
        let points: Vec<_> = (0..12)
            .map(|i| {
                let angle = std::f64::consts::PI / 6.0 * i as f64;
                Point2::new(angle.cos() * 4.0, angle.sin() * 4.0)
            })
            .collect();
        let triangulation = triangulate(points);
        // A convex polygon with n vertices has n - 2 triangles.
        assert_eq!(triangulation.num_real_triangles(), 10);
        triangulation.check_orientation().unwrap();
        triangulation.check_adjacency().unwrap();
    }

    #[test]
    fn test_random_points() {
        let triangulation = triangulate(random_points_with_seed(400, SEED));
        assert_eq!(triangulation.num_points(), 400);
        for index in 0..400 {
            assert!(triangulation.is_inserted(PointId::real(index)));
        }
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_grid_points() {
        let mut points = Vec::new();
        for x in 0..12 {
            for y in 0..12 {
                points.push(Point2::new(x as f64, y as f64));
            }
        }
        let triangulation = triangulate(points);
        // Every grid cell is split into two triangles.
        assert_eq!(triangulation.num_real_triangles(), 2 * 11 * 11);
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_custom_strides_give_same_result() {
        let points = random_points_with_seed(150, SEED2);
        let default = triangulate(points.clone());

        let mut custom = DelaunayTriangulation2::<Point2<f64>>::with_parameters(
            InsertionParameters::new().with_insertion_strides(vec![1]),
        );
        for point in points {
            custom.add_point(point).unwrap();
        }
        custom.perform().unwrap();

        let mut expected: Vec<_> = default
            .real_triangles()
            .map(|(_, t)| {
                let mut points = t.points();
                points.sort();
                points
            })
            .collect();
        let mut actual: Vec<_> = custom
            .real_triangles()
            .map(|(_, t)| {
                let mut points = t.points();
                points.sort();
                points
            })
            .collect();
        expected.sort();
        actual.sort();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let mut triangulation = DelaunayTriangulation2::<Point2<f64>>::new();
        for point in square() {
            triangulation.add_point(point).unwrap();
        }
        let duplicate = triangulation.add_point(Point2::new(10.0, 0.0)).unwrap();
        let report = triangulation.perform().unwrap();
        assert_eq!(report.inserted, 4);
        assert_eq!(report.skipped, vec![duplicate]);
        assert!(!triangulation.is_inserted(duplicate));
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_point_close_to_cavity_boundary_is_rejected() {
        let parameters = InsertionParameters::new().with_degeneracy_tolerance(0.1);
        let mut triangulation = DelaunayTriangulation2::<Point2<f64>>::with_parameters(parameters);
        for point in square() {
            triangulation.add_point(point).unwrap();
        }
        // Lies within the tolerance of the supporting line of a cavity boundary edge.
        let close = triangulation.add_point(Point2::new(0.5, 0.5)).unwrap();
        let report = triangulation.perform().unwrap();

        assert_eq!(report.inserted, 4);
        assert_eq!(report.skipped, vec![PointId::real(4)]);
        assert!(!triangulation.is_inserted(close));
        assert_eq!(triangulation.num_real_triangles(), 2);
        for (_, triangle) in triangulation.triangles() {
            assert!(!triangle.marked);
            assert!(!triangle.points().contains(&close));
        }
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_preconditions() {
        let mut triangulation = DelaunayTriangulation2::<Point2<f64>>::new();
        triangulation.add_point(Point2::new(0.0, 0.0)).unwrap();
        assert_eq!(
            triangulation.perform(),
            Err(TriangulationError::NotEnoughPoints {
                required: 2,
                actual: 1
            })
        );
        assert_eq!(
            triangulation.add_point(Point2::new(f64::NAN, 0.0)),
            Err(TriangulationError::InvalidCoordinate(
                crate::InsertionError::NAN
            ))
        );

        triangulation.add_point(Point2::new(1.0, 0.0)).unwrap();
        triangulation.perform().unwrap();
        assert_eq!(
            triangulation.add_point(Point2::new(2.0, 0.0)),
            Err(TriangulationError::AlreadyPerformed)
        );
        assert_eq!(
            triangulation.perform(),
            Err(TriangulationError::AlreadyPerformed)
        );
    }

    #[test]
    fn test_collinear_points() {
        let points: Vec<_> = (0..5).map(|i| Point2::new(i as f64, 0.0)).collect();
        let triangulation = triangulate(points);
        // No real triangle spans collinear points, all triangles touch the cage.
        assert_eq!(triangulation.num_real_triangles(), 0);
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_coincident_points_fail() {
        let mut triangulation = DelaunayTriangulation2::<Point2<f64>>::new();
        triangulation.add_point(Point2::new(1.0, 1.0)).unwrap();
        triangulation.add_point(Point2::new(1.0, 1.0)).unwrap();
        assert_eq!(
            triangulation.perform(),
            Err(TriangulationError::DegenerateBounds)
        );
        assert!(!triangulation.is_performed());
    }

    #[test]
    fn test_delete_clears_neighbors() {
        let mut triangulation = triangulate(random_points_with_seed(30, SEED));
        let (handle, triangle) = triangulation.real_triangles().next().unwrap();
        let neighbors: Vec<_> = triangle.neighbors().into_iter().flatten().collect();
        assert_eq!(triangulation.delete_triangles([handle, handle]), 1);
        assert!(triangulation.triangle(handle).is_none());
        for neighbor in neighbors {
            let neighbor = triangulation.triangle(neighbor).unwrap();
            assert_eq!(neighbor.neighbor_index(handle), None);
        }
        triangulation.check_adjacency().unwrap();
    }

    #[test]
    fn test_reorder_is_idempotent() {
        let mut triangulation = triangulate(random_points_with_seed(50, SEED2));
        assert_eq!(triangulation.reorder_triangles(), 0);

        let handles: Vec<_> = triangulation.triangles().map(|(h, _)| h).take(5).collect();
        for handle in &handles {
            triangulation.triangles.get_mut(*handle).flip();
        }
        assert!(triangulation.check_orientation().is_err());
        assert_eq!(triangulation.reorder_triangles(), 5);
        let once: Vec<_> = triangulation.triangles().map(|(_, t)| t.points()).collect();
        assert_eq!(triangulation.reorder_triangles(), 0);
        let twice: Vec<_> = triangulation.triangles().map(|(_, t)| t.points()).collect();
        assert_eq!(once, twice);
        triangulation.validate().unwrap();
    }

    #[test]
    fn test_queries() {
        let triangulation = triangulate(square());
        assert_eq!(triangulation.dummy_points().len(), 4);
        assert_eq!(triangulation.position(PointId::real(2)), Some(Point2::new(10.0, 10.0)));
        assert!(triangulation.point(PointId::dummy(0)).is_none());
        assert!(triangulation.position(PointId::dummy(0)).is_some());

        let bbox = triangulation.bounding_box();
        assert_eq!(bbox.lower(), Point2::new(0.0, 0.0));
        assert_eq!(bbox.upper(), Point2::new(10.0, 10.0));

        let total: f64 = triangulation
            .real_triangles()
            .map(|(h, _)| triangulation.triangle_area(h).unwrap())
            .sum();
        assert_eq!(total, 100.0);

        let handle = triangulation.real_triangles().next().unwrap().0;
        let triangle_box = triangulation.triangle_bounding_box(handle).unwrap();
        assert!(bbox.contains_point(triangle_box.lower()));
        assert!(bbox.contains_point(triangle_box.upper()));

        // Every cage corner lies outside of the input bounding box.
        for corner in triangulation.dummy_points() {
            assert!(!bbox.contains_point(*corner));
        }

        let triangle_count = triangulation.num_triangles();
        assert!(triangle_count > triangulation.num_real_triangles());
    }
}
