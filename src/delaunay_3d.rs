use hashbrown::HashMap;
use tracing::debug;

use crate::error::{TriangulationError, ValidationError};
use crate::handles::{FixedTetrahedronHandle, PointId, TetrahedronTag};
use crate::math::{
    circumcenter_3d, distance_to_plane, sliver_ratio, tetrahedron_volume, validate_vertex_3d,
};
use crate::mesh_core::{
    insert_in_passes, InsertionOutcome, RejectReason, RunState, SimplexArena, Tetrahedron,
    FACE_VERTEX_MAP,
};
use crate::predicates::{in_sphere, orient_3d};
use crate::{BoundingBox3, HasPosition3, InsertionParameters, InsertionReport, Point3};

/// Splits the cube with corners `0..8` into five tetrahedra.
///
/// Corner `i` lies at `center + size * (±1, ±1, ±1)`, counterclockwise on the lower face
/// (`0..4`) followed by the upper face (`4..8`).
const TETRAHEDRA_IN_CUBE: [[usize; 4]; 5] = [
    [1, 3, 4, 0],
    [3, 6, 1, 2],
    [4, 1, 6, 5],
    [3, 4, 6, 7],
    [4, 1, 3, 6],
];

const CUBE_CORNERS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, 1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [1.0, -1.0, 1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

const FACE_DUMMY_OFFSET: f64 = 0.8;
const FACE_DUMMY_SPACING: f64 = 0.35;

/// A three dimensional Delaunay tetrahedralization built by incremental insertion.
///
/// Works like [DelaunayTriangulation2](crate::DelaunayTriangulation2): the points are
/// enclosed by a cube of eight dummy corners split into five tetrahedra. Before any real
/// point is inserted, a grid of dummy points is placed close to each cube face (see
/// [InsertionParameters::with_face_dummy_resolution]), which keeps the tetrahedra touching
/// the cage well shaped.
///
/// Every tetrahedron is positively oriented (see [crate::predicates::orient_3d]).
///
/// # Example
///
/// ```
/// use tessera::{DelaunayTetrahedralization, Point3};
///
/// # fn main() -> Result<(), tessera::TriangulationError> {
/// let mut tetrahedralization = DelaunayTetrahedralization::<Point3<f64>>::new();
/// tetrahedralization.add_point(Point3::new(0.0, 0.0, 0.0))?;
/// tetrahedralization.add_point(Point3::new(1.0, 0.0, 0.0))?;
/// tetrahedralization.add_point(Point3::new(0.0, 1.0, 0.0))?;
/// tetrahedralization.add_point(Point3::new(0.0, 0.0, 1.0))?;
///
/// tetrahedralization.perform()?;
/// assert_eq!(tetrahedralization.num_real_tetrahedra(), 1);
/// # Ok(()) }
/// ```
pub struct DelaunayTetrahedralization<V, F = ()> {
    points: Vec<V>,
    positions: Vec<Point3<f64>>,
    dummy_positions: Vec<Point3<f64>>,
    inserted: Vec<bool>,
    tetrahedra: SimplexArena<Tetrahedron<F>, TetrahedronTag>,
    parameters: InsertionParameters,
    state: RunState,
    bounding_box: BoundingBox3,
    cage_size: f64,
}

#[derive(Debug, Clone, Copy)]
struct CavityFace {
    tetrahedron: FixedTetrahedronHandle,
    points: [PointId; 3],
    front: Option<FixedTetrahedronHandle>,
}

fn sorted_edge(a: PointId, b: PointId) -> (PointId, PointId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn sorted_face(mut face: [PointId; 3]) -> [PointId; 3] {
    face.sort_unstable();
    face
}

impl<V: HasPosition3, F: Default> Default for DelaunayTetrahedralization<V, F> {
    fn default() -> Self {
        Self::with_parameters(InsertionParameters::default())
    }
}

impl<V: HasPosition3, F: Default> DelaunayTetrahedralization<V, F> {
    /// Creates an empty tetrahedralization with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tetrahedralization.
    pub fn with_parameters(parameters: InsertionParameters) -> Self {
        Self {
            points: Vec::new(),
            positions: Vec::new(),
            dummy_positions: Vec::new(),
            inserted: Vec::new(),
            tetrahedra: SimplexArena::new(),
            parameters,
            state: RunState::Pending,
            bounding_box: BoundingBox3::new(),
            cage_size: 0.0,
        }
    }

    /// Registers a real point and returns its id.
    ///
    /// *See [DelaunayTriangulation2::add_point](crate::DelaunayTriangulation2::add_point)*
    pub fn add_point(&mut self, point: V) -> Result<PointId, TriangulationError> {
        if self.state != RunState::Pending {
            return Err(TriangulationError::AlreadyPerformed);
        }
        validate_vertex_3d(&point)?;
        let position = point.position().to_f64();
        let id = PointId::real(self.points.len());
        self.bounding_box.add_point(position);
        self.points.push(point);
        self.positions.push(position);
        Ok(id)
    }

    /// Tetrahedralizes all registered points.
    ///
    /// *See [DelaunayTriangulation2::perform](crate::DelaunayTriangulation2::perform)*
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
        self.insert_face_dummies()?;

        let strides = self.parameters.insertion_strides().to_vec();
        let (report, inserted) =
            insert_in_passes(&strides, self.points.len(), |id| self.insert_point(id))?;
        self.inserted = inserted;
        self.state = RunState::Performed;

        debug!(
            inserted = report.inserted,
            skipped = report.skipped.len(),
            tetrahedra = self.tetrahedra.len(),
            "tetrahedralization performed"
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
        self.dummy_positions = CUBE_CORNERS
            .iter()
            .map(|&[x, y, z]| center.add(Point3::new(x, y, z).mul(size)))
            .collect();

        let mut created = Vec::with_capacity(TETRAHEDRA_IN_CUBE.len());
        for corners in TETRAHEDRA_IN_CUBE {
            let mut points = corners.map(PointId::dummy);
            let [a, b, c, d] = points.map(|p| self.pos(p));
            if orient_3d(a, b, c, d) < 0.0 {
                points.swap(2, 3);
            }
            created.push(self.create_tetrahedron(points));
        }
        self.connect_faces(&created);

        debug!(size, center = ?center, "created enclosing cage");
        Ok(())
    }

    /// Connects all tetrahedra in `handles` that share a face.
    fn connect_faces(&mut self, handles: &[FixedTetrahedronHandle]) {
        let mut open_faces: HashMap<[PointId; 3], (FixedTetrahedronHandle, usize)> =
            HashMap::new();
        for &handle in handles {
            for face in 0..4 {
                let key = sorted_face(self.tetrahedra.get(handle).face(face));
                if let Some((other, other_face)) = open_faces.remove(&key) {
                    self.tetrahedra
                        .get_mut(handle)
                        .set_neighbor(face, Some(other));
                    self.tetrahedra
                        .get_mut(other)
                        .set_neighbor(other_face, Some(handle));
                } else {
                    open_faces.insert(key, (handle, face));
                }
            }
        }
    }

    fn face_dummy_positions(&self) -> Vec<Point3<f64>> {
        let n = self.parameters.face_dummy_resolution() as i32;
        let center = self
            .dummy_positions
            .iter()
            .fold(Point3::new(0.0, 0.0, 0.0), |acc, p| acc.add(*p))
            .mul(1.0 / 8.0);
        let mut result = Vec::new();
        for face in 0..6 {
            for i in -n..=n {
                for j in -n..=n {
                    let u = FACE_DUMMY_SPACING * f64::from(i);
                    let v = FACE_DUMMY_SPACING * f64::from(j);
                    let offset = match face {
                        0 => Point3::new(FACE_DUMMY_OFFSET, u, v),
                        1 => Point3::new(-FACE_DUMMY_OFFSET, u, v),
                        2 => Point3::new(u, FACE_DUMMY_OFFSET, v),
                        3 => Point3::new(u, -FACE_DUMMY_OFFSET, v),
                        4 => Point3::new(u, v, FACE_DUMMY_OFFSET),
                        _ => Point3::new(u, v, -FACE_DUMMY_OFFSET),
                    };
                    result.push(center.add(offset.mul(self.cage_size)));
                }
            }
        }
        result
    }

    fn insert_face_dummies(&mut self) -> Result<(), TriangulationError> {
        let mut rejected = 0;
        for position in self.face_dummy_positions() {
            let id = PointId::dummy(self.dummy_positions.len());
            self.dummy_positions.push(position);
            if let InsertionOutcome::Rejected(_) = self.insert_point(id)? {
                rejected += 1;
            }
        }
        debug!(
            dummies = self.dummy_positions.len(),
            rejected, "inserted face dummy points"
        );
        Ok(())
    }

    fn create_tetrahedron(&mut self, points: [PointId; 4]) -> FixedTetrahedronHandle {
        let positions = points.map(|p| self.pos(p));
        self.tetrahedra
            .insert(Tetrahedron::new(points, positions, F::default()))
    }

    fn insert_point(&mut self, id: PointId) -> Result<InsertionOutcome, TriangulationError> {
        let position = self.pos(id);
        let start = match self.locate_conflicting_tetrahedron(position) {
            Some(start) => start,
            None if self.is_vertex_position(position) => {
                return Ok(InsertionOutcome::Rejected(RejectReason::Duplicate));
            }
            None => return Err(TriangulationError::PointOutsideCage { point: id }),
        };

        let (cavity, boundary) = self.find_cavity(start, position);
        if let Err(reason) = self.check_cavity_boundary(&boundary, position) {
            for handle in &cavity {
                self.tetrahedra.get_mut(*handle).marked = false;
            }
            return Ok(InsertionOutcome::Rejected(reason));
        }

        self.fill_cavity(id, &cavity, &boundary);
        Ok(InsertionOutcome::Inserted {
            cavity_size: cavity.len(),
        })
    }

    fn circumsphere_contains(&self, tetrahedron: &Tetrahedron<F>, position: Point3<f64>) -> bool {
        let [a, b, c, d] = tetrahedron.points().map(|p| self.pos(p));
        in_sphere(a, b, c, d, position) > 0.0
    }

    fn locate_conflicting_tetrahedron(
        &self,
        position: Point3<f64>,
    ) -> Option<FixedTetrahedronHandle> {
        self.tetrahedra
            .iter()
            .find(|(_, tetrahedron)| self.circumsphere_contains(tetrahedron, position))
            .map(|(handle, _)| handle)
    }

    fn is_vertex_position(&self, position: Point3<f64>) -> bool {
        self.tetrahedra.iter().any(|(_, tetrahedron)| {
            tetrahedron
                .points()
                .iter()
                .any(|p| self.pos(*p) == position)
        })
    }

    fn find_cavity(
        &mut self,
        start: FixedTetrahedronHandle,
        position: Point3<f64>,
    ) -> (Vec<FixedTetrahedronHandle>, Vec<CavityFace>) {
        self.tetrahedra.get_mut(start).marked = true;
        let mut cavity = vec![start];
        let mut stack = vec![start];
        let mut boundary = Vec::new();

        while let Some(current) = stack.pop() {
            for face in 0..4 {
                let tetrahedron = self.tetrahedra.get(current);
                let front = tetrahedron.neighbor(face);
                if let Some(neighbor) = front {
                    let neighbor_tetrahedron = self.tetrahedra.get(neighbor);
                    if neighbor_tetrahedron.marked {
                        continue;
                    }
                    if self.circumsphere_contains(neighbor_tetrahedron, position) {
                        self.tetrahedra.get_mut(neighbor).marked = true;
                        cavity.push(neighbor);
                        stack.push(neighbor);
                        continue;
                    }
                }
                boundary.push(CavityFace {
                    tetrahedron: current,
                    points: tetrahedron.face(face),
                    front,
                });
            }
        }
        (cavity, boundary)
    }

    fn check_cavity_boundary(
        &self,
        boundary: &[CavityFace],
        position: Point3<f64>,
    ) -> Result<(), RejectReason> {
        let tolerance = self.parameters.degeneracy_tolerance() * self.cage_size;
        for face in boundary {
            let [a, b, c] = face.points.map(|p| self.pos(p));
            if orient_3d(a, b, c, position) <= 0.0 {
                return Err(RejectReason::Degenerate);
            }
            if tolerance > 0.0 && distance_to_plane(a, b, c, position) < tolerance {
                return Err(RejectReason::Degenerate);
            }
            let (_, radius2) = circumcenter_3d([a, b, c, position]);
            if !radius2.is_finite() || radius2 <= 0.0 {
                return Err(RejectReason::Degenerate);
            }
        }
        Ok(())
    }

    fn fill_cavity(
        &mut self,
        id: PointId,
        cavity: &[FixedTetrahedronHandle],
        boundary: &[CavityFace],
    ) {
        for handle in cavity {
            self.tetrahedra.remove(*handle);
        }

        let mut open_edges: HashMap<(PointId, PointId), (FixedTetrahedronHandle, usize)> =
            HashMap::with_capacity(boundary.len() * 3 / 2);
        for face in boundary {
            let [a, b, c] = face.points;
            let handle = self.create_tetrahedron([a, b, c, id]);
            self.tetrahedra.get_mut(handle).set_neighbor(3, face.front);
            if let Some(front) = face.front {
                self.replace_neighbor(front, face.tetrahedron, Some(handle));
            }

            // Faces 0..3 of the new tetrahedron contain the new point and one edge of
            // the boundary face.
            for new_face in 0..3 {
                let [_, from, to] = FACE_VERTEX_MAP[new_face];
                let key = sorted_edge(face.points[from], face.points[to]);
                if let Some((other, other_face)) = open_edges.remove(&key) {
                    self.tetrahedra
                        .get_mut(handle)
                        .set_neighbor(new_face, Some(other));
                    self.tetrahedra
                        .get_mut(other)
                        .set_neighbor(other_face, Some(handle));
                } else {
                    open_edges.insert(key, (handle, new_face));
                }
            }
        }
        debug_assert!(open_edges.is_empty(), "Cavity boundary is not closed");
    }

    fn replace_neighbor(
        &mut self,
        tetrahedron: FixedTetrahedronHandle,
        old: FixedTetrahedronHandle,
        new: Option<FixedTetrahedronHandle>,
    ) {
        let tetrahedron = self.tetrahedra.get_mut(tetrahedron);
        match tetrahedron.neighbor_index(old) {
            Some(face) => tetrahedron.set_neighbor(face, new),
            None => panic!("Broken adjacency: {:?} is not a neighbor", old),
        }
    }
}

impl<V, F> DelaunayTetrahedralization<V, F> {
    /// Returns `true` once [perform](Self::perform) has completed successfully.
    pub fn is_performed(&self) -> bool {
        self.state == RunState::Performed
    }

    /// Returns the number of real points.
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
    pub fn position(&self, id: PointId) -> Option<Point3<f64>> {
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

    /// Positions of all dummy points: the eight cube corners followed by the face dummies.
    pub fn dummy_points(&self) -> &[Point3<f64>] {
        &self.dummy_positions
    }

    /// Returns `true` if a real point is a vertex of the tetrahedralization.
    pub fn is_inserted(&self, id: PointId) -> bool {
        !id.is_dummy() && self.inserted.get(id.index()).copied().unwrap_or(false)
    }

    /// Returns the bounding box of all real points.
    pub fn bounding_box(&self) -> BoundingBox3 {
        self.bounding_box
    }

    /// Iterates over all tetrahedra, including dummy tetrahedra.
    pub fn tetrahedra(
        &self,
    ) -> impl Iterator<Item = (FixedTetrahedronHandle, &Tetrahedron<F>)> + '_ {
        self.tetrahedra.iter()
    }

    /// Iterates over all tetrahedra that don't touch a dummy point.
    pub fn real_tetrahedra(
        &self,
    ) -> impl Iterator<Item = (FixedTetrahedronHandle, &Tetrahedron<F>)> + '_ {
        self.tetrahedra
            .iter()
            .filter(|(_, tetrahedron)| !tetrahedron.is_dummy())
    }

    /// Returns the number of tetrahedra, including dummy tetrahedra.
    pub fn num_tetrahedra(&self) -> usize {
        self.tetrahedra.len()
    }

    /// Returns the number of tetrahedra that don't touch a dummy point.
    pub fn num_real_tetrahedra(&self) -> usize {
        self.real_tetrahedra().count()
    }

    /// Looks up a tetrahedron. Returns `None` for stale handles.
    pub fn tetrahedron(&self, handle: FixedTetrahedronHandle) -> Option<&Tetrahedron<F>> {
        self.tetrahedra.try_get(handle)
    }

    /// Returns the payload of a tetrahedron.
    pub fn tetrahedron_data_mut(&mut self, handle: FixedTetrahedronHandle) -> Option<&mut F> {
        self.tetrahedra.try_get_mut(handle).map(Tetrahedron::data_mut)
    }

    /// Returns the vertex positions of a tetrahedron.
    pub fn tetrahedron_positions(
        &self,
        handle: FixedTetrahedronHandle,
    ) -> Option<[Point3<f64>; 4]> {
        let tetrahedron = self.tetrahedra.try_get(handle)?;
        let mut result = [Point3::new(0.0, 0.0, 0.0); 4];
        for (position, id) in result.iter_mut().zip(tetrahedron.points()) {
            *position = self.position(id)?;
        }
        Some(result)
    }

    /// Returns the bounding box of a tetrahedron.
    pub fn tetrahedron_bounding_box(&self, handle: FixedTetrahedronHandle) -> Option<BoundingBox3> {
        self.tetrahedron_positions(handle)
            .map(BoundingBox3::from_points)
    }

    /// Returns the (unsigned) volume of a tetrahedron.
    pub fn tetrahedron_volume(&self, handle: FixedTetrahedronHandle) -> Option<f64> {
        self.tetrahedron_positions(handle).map(tetrahedron_volume)
    }

    /// Returns `true` if the tetrahedron is a sliver.
    ///
    /// A tetrahedron is a sliver if the minimal distance between the lines through opposite
    /// edges, divided by the shortest edge length, is below `ratio`.
    /// [DEFAULT_SLIVER_RATIO](crate::DEFAULT_SLIVER_RATIO) is a reasonable default.
    ///
    /// Returns `None` for stale handles.
    pub fn is_sliver(&self, handle: FixedTetrahedronHandle, ratio: f64) -> Option<bool> {
        self.tetrahedron_positions(handle)
            .map(|positions| sliver_ratio(positions) < ratio)
    }

    /// Removes tetrahedra. Neighbors lose their reference to the removed tetrahedra.
    ///
    /// Returns the number of removed tetrahedra.
    pub fn delete_tetrahedra(
        &mut self,
        handles: impl IntoIterator<Item = FixedTetrahedronHandle>,
    ) -> usize {
        let mut removed = 0;
        for handle in handles {
            let Some(tetrahedron) = self.tetrahedra.remove(handle) else {
                continue;
            };
            for neighbor in tetrahedron.neighbors().into_iter().flatten() {
                if let Some(neighbor) = self.tetrahedra.try_get_mut(neighbor) {
                    if let Some(face) = neighbor.neighbor_index(handle) {
                        neighbor.set_neighbor(face, None);
                    }
                }
            }
            removed += 1;
        }
        removed
    }

    /// Makes every tetrahedron positively oriented. Returns the number of flipped
    /// tetrahedra.
    pub fn reorder_tetrahedra(&mut self) -> usize {
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
        for (_, tetrahedron) in self.tetrahedra.iter_mut() {
            let [a, b, c, d] = tetrahedron.points().map(pos);
            if orient_3d(a, b, c, d) < 0.0 {
                tetrahedron.flip();
                flipped += 1;
            }
        }
        flipped
    }

    fn pos(&self, id: PointId) -> Point3<f64> {
        if id.is_dummy() {
            self.dummy_positions[id.index()]
        } else {
            self.positions[id.index()]
        }
    }

    /// Checks that no inserted real point lies strictly inside the circumsphere of any real
    /// tetrahedron.
    ///
    /// Runs in quadratic time.
    pub fn check_delaunay(&self) -> Result<(), ValidationError> {
        for (handle, tetrahedron) in self.real_tetrahedra() {
            let [a, b, c, d] = tetrahedron.points().map(|p| self.pos(p));
            for (index, position) in self.positions.iter().enumerate() {
                let id = PointId::real(index);
                if !self.is_inserted(id) || tetrahedron.has_point(id) {
                    continue;
                }
                if in_sphere(a, b, c, d, *position) > 0.0 {
                    return Err(ValidationError::DelaunayViolation {
                        simplex: handle.index(),
                        point: id,
                    });
                }
            }
        }
        Ok(())
    }

    /// Checks that neighbor references are mutual and refer to the shared face.
    pub fn check_adjacency(&self) -> Result<(), ValidationError> {
        for (handle, tetrahedron) in self.tetrahedra.iter() {
            for face in 0..4 {
                let Some(neighbor) = tetrahedron.neighbor(face) else {
                    continue;
                };
                let error = ValidationError::AsymmetricAdjacency {
                    simplex: handle.index(),
                    facet: face,
                    neighbor: neighbor.index(),
                };
                let Some(neighbor_tetrahedron) = self.tetrahedra.try_get(neighbor) else {
                    return Err(error);
                };
                let Some(back) = neighbor_tetrahedron.neighbor_index(handle) else {
                    return Err(error);
                };
                if sorted_face(neighbor_tetrahedron.face(back))
                    != sorted_face(tetrahedron.face(face))
                {
                    return Err(error);
                }
            }
        }
        Ok(())
    }

    /// Checks that every tetrahedron is positively oriented and has a positive
    /// circumradius.
    pub fn check_orientation(&self) -> Result<(), ValidationError> {
        for (handle, tetrahedron) in self.tetrahedra.iter() {
            let [a, b, c, d] = tetrahedron.points().map(|p| self.pos(p));
            if orient_3d(a, b, c, d) <= 0.0 {
                return Err(ValidationError::InvertedSimplex {
                    simplex: handle.index(),
                });
            }
            let radius = tetrahedron.circumradius();
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
