#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constraint_recovery::{recover_segment, RecoveryOutcome};
use crate::domain::identify_domain;
use crate::error::{TriangulationError, ValidationError};
use crate::handles::{FixedTriangleHandle, PointId};
use crate::math::triangle_centroid;
use crate::predicates::segments_cross_properly;
use crate::{
    DelaunayTriangulation2, HasPosition, InsertionParameters, InsertionReport, Point2, Triangle,
};

/// Face type of a [ConstrainedTriangulation2].
///
/// Constrained triangulations store the domain of each triangle. They don't use the
/// configured face type directly but wrap it into `CdtFace<F>` first.
///
/// # Type parameters
/// F: The user configurable face type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct CdtFace<F> {
    domain: Option<u32>,
    data: F,
}

impl<F> CdtFace<F> {
    /// Returns the domain of this triangle, or `None` if it could not be identified.
    pub fn domain(&self) -> Option<u32> {
        self.domain
    }

    pub(crate) fn set_domain(&mut self, domain: Option<u32>) {
        self.domain = domain;
    }

    /// Returns the wrapped face data.
    pub fn data(&self) -> &F {
        &self.data
    }

    /// Returns the wrapped face data.
    pub fn data_mut(&mut self) -> &mut F {
        &mut self.data
    }
}

impl<F: Default> Default for CdtFace<F> {
    fn default() -> Self {
        CdtFace {
            domain: None,
            data: F::default(),
        }
    }
}

impl<F> AsRef<F> for CdtFace<F> {
    fn as_ref(&self) -> &F {
        self.data()
    }
}

impl<F> AsMut<F> for CdtFace<F> {
    fn as_mut(&mut self) -> &mut F {
        self.data_mut()
    }
}

/// Refers to a boundary segment of a [ConstrainedTriangulation2].
///
/// Segments are numbered in the order they were added.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct SegmentIndex(usize);

impl SegmentIndex {
    #[cfg(test)]
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the position of the segment in insertion order.
    pub fn index(&self) -> usize {
        self.0
    }
}

/// A mandatory edge between two real points.
///
/// The *front* side of the segment `from -> to` is its left side, i.e. the side its
/// normal `(-dy, dx)` points to. Triangles on the front side belong to the front domain,
/// triangles on the other side to the rear domain.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct BoundarySegment {
    points: [PointId; 2],
    front: u32,
    rear: u32,
    marked: bool,
}

impl BoundarySegment {
    /// Returns the start and end point.
    pub fn points(&self) -> [PointId; 2] {
        self.points
    }

    /// Domain left of the segment.
    pub fn front_domain(&self) -> u32 {
        self.front
    }

    /// Domain right of the segment.
    pub fn rear_domain(&self) -> u32 {
        self.rear
    }

    /// Returns `true` if the segment is an edge of the triangulation.
    pub fn is_marked(&self) -> bool {
        self.marked
    }

    fn connects(&self, a: PointId, b: PointId) -> bool {
        self.points == [a, b] || self.points == [b, a]
    }

    /// Returns the domain of a triangle with centroid `centroid` adjacent to this segment.
    fn domain_towards(&self, from: Point2<f64>, to: Point2<f64>, centroid: Point2<f64>) -> u32 {
        let direction = to.sub(from);
        let normal = Point2::new(-direction.y, direction.x);
        let midpoint = from.add(to).mul(0.5);
        if centroid.sub(midpoint).dot(normal) > 0.0 {
            self.front
        } else {
            self.rear
        }
    }
}

/// Looks up boundary segments by their end points.
///
/// Segments are hashed by the smaller of their point ids into a fixed number of buckets.
#[derive(Debug, Clone, Default)]
pub(crate) struct SegmentBucket {
    buckets: Vec<SmallVec<[SegmentIndex; 2]>>,
}

impl SegmentBucket {
    pub(crate) fn new(segments: &[BoundarySegment]) -> Self {
        let mut buckets = vec![SmallVec::new(); segments.len().max(1)];
        for (index, segment) in segments.iter().enumerate() {
            let [a, b] = segment.points;
            let bucket = Self::key(a, b) % buckets.len();
            buckets[bucket].push(SegmentIndex(index));
        }
        Self { buckets }
    }

    fn key(a: PointId, b: PointId) -> usize {
        a.min(b).index()
    }

    /// Returns the first segment connecting `a` and `b`, in any direction.
    pub(crate) fn find(
        &self,
        a: PointId,
        b: PointId,
        segments: &[BoundarySegment],
    ) -> Option<SegmentIndex> {
        if a.is_dummy() || b.is_dummy() || self.buckets.is_empty() {
            return None;
        }
        self.buckets[Self::key(a, b) % self.buckets.len()]
            .iter()
            .copied()
            .find(|index| segments[index.0].connects(a, b))
    }
}

/// Why a boundary segment could not be made an edge of the triangulation.
#[derive(Error, Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum UnresolvedReason {
    /// One of the end points was skipped during insertion, e.g. as duplicate.
    #[error("an end point is not part of the triangulation")]
    EndpointNotInserted,

    /// The segment passes exactly through another vertex.
    #[error("the segment passes through vertex {0:?}")]
    PassesThroughVertex(PointId),

    /// The segment crosses another boundary segment.
    #[error("the segment crosses boundary segment {0:?}")]
    CrossesSegment(SegmentIndex),

    /// The walk along the segment left the triangulation.
    #[error("the segment leaves the triangulation")]
    LeavesTriangulation,
}

/// A boundary segment that is not an edge of the final triangulation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UnresolvedSegment {
    /// The unresolved segment.
    pub segment: SegmentIndex,
    /// Why recovery failed.
    pub reason: UnresolvedReason,
}

/// Summarizes a [ConstrainedTriangulation2::perform] run.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct CdtReport {
    /// Point insertion report of the underlying Delaunay triangulation.
    pub insertion: InsertionReport,
    /// Segments that were already edges of the Delaunay triangulation.
    pub matched: usize,
    /// Segments that were inserted by local retriangulation.
    pub recovered: usize,
    /// Segments that are missing from the final triangulation.
    pub unresolved: Vec<UnresolvedSegment>,
}

impl CdtReport {
    /// Returns `true` if every boundary segment is an edge of the triangulation.
    ///
    /// Only complete runs guarantee that every real triangle is assigned to a domain.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// A two dimensional constrained triangulation with domain identification.
///
/// Points and *boundary segments* are registered first. [perform](Self::perform) then
/// - computes the Delaunay triangulation of all points,
/// - makes every boundary segment an edge, retriangulating the area around segments that
///   are not already part of the Delaunay triangulation, and
/// - assigns a *domain* to each triangle: triangles adjacent to a segment receive the
///   front or rear domain of that segment. Other triangles inherit the domain of their
///   neighbors, domains never spread across a boundary segment.
///
/// The result is not necessarily Delaunay close to recovered segments.
///
/// # Example
///
/// ```
/// use tessera::{ConstrainedTriangulation2, Point2};
///
/// # fn main() -> Result<(), tessera::TriangulationError> {
/// let mut cdt = ConstrainedTriangulation2::<Point2<f64>>::new();
/// let corners = [
///     cdt.add_point(Point2::new(0.0, 0.0))?,
///     cdt.add_point(Point2::new(10.0, 0.0))?,
///     cdt.add_point(Point2::new(10.0, 10.0))?,
///     cdt.add_point(Point2::new(0.0, 10.0))?,
/// ];
/// for i in 0..4 {
///     // Counterclockwise segments: the inside is in front.
///     cdt.add_boundary_segment(corners[i], corners[(i + 1) % 4], 1, 0)?;
/// }
///
/// let report = cdt.perform()?;
/// assert!(report.is_complete());
/// assert_eq!(cdt.triangles_in_domain(1).count(), 2);
/// # Ok(()) }
/// ```
pub struct ConstrainedTriangulation2<V, F = ()> {
    triangulation: DelaunayTriangulation2<V, CdtFace<F>>,
    segments: Vec<BoundarySegment>,
    bucket: SegmentBucket,
}

impl<V: HasPosition, F: Default> Default for ConstrainedTriangulation2<V, F> {
    fn default() -> Self {
        Self::with_parameters(InsertionParameters::default())
    }
}

impl<V: HasPosition, F: Default> ConstrainedTriangulation2<V, F> {
    /// Creates an empty triangulation with default parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty triangulation.
    pub fn with_parameters(parameters: InsertionParameters) -> Self {
        Self {
            triangulation: DelaunayTriangulation2::with_parameters(parameters),
            segments: Vec::new(),
            bucket: SegmentBucket::default(),
        }
    }

    /// Registers a real point and returns its id.
    pub fn add_point(&mut self, point: V) -> Result<PointId, TriangulationError> {
        self.triangulation.add_point(point)
    }

    /// Registers a boundary segment between two real points.
    ///
    /// `front` is the domain left of `from -> to`, `rear` the domain right of it.
    /// Segments must not intersect each other except at shared end points.
    pub fn add_boundary_segment(
        &mut self,
        from: PointId,
        to: PointId,
        front: u32,
        rear: u32,
    ) -> Result<SegmentIndex, TriangulationError> {
        if self.triangulation.is_performed() {
            return Err(TriangulationError::AlreadyPerformed);
        }
        for point in [from, to] {
            if self.triangulation.point(point).is_none() {
                return Err(TriangulationError::UnknownPoint(point));
            }
        }
        if from == to {
            return Err(TriangulationError::DegenerateSegment);
        }
        self.segments.push(BoundarySegment {
            points: [from, to],
            front,
            rear,
            marked: false,
        });
        Ok(SegmentIndex(self.segments.len() - 1))
    }

    /// Triangulates all points, inserts all boundary segments and identifies domains.
    pub fn perform(&mut self) -> Result<CdtReport, TriangulationError> {
        if self.triangulation.is_performed() {
            return Err(TriangulationError::AlreadyPerformed);
        }
        if self.segments.is_empty() {
            return Err(TriangulationError::NoBoundarySegments);
        }
        let insertion = self.triangulation.perform()?;

        self.bucket = SegmentBucket::new(&self.segments);
        let matched = self.fit_boundary();
        debug!(
            matched,
            segments = self.segments.len(),
            "fitted boundary segments"
        );

        let (recovered, unresolved) = self.recover_missing_segments();
        if recovered > 0 {
            self.fit_boundary();
        }

        let segments = &self.segments;
        let bucket = &self.bucket;
        let fill = identify_domain(&mut self.triangulation.triangles, |a, b| {
            bucket
                .find(a, b, segments)
                .map_or(false, |index| segments[index.0].marked)
        });
        if fill.untagged > 0 && unresolved.is_empty() {
            warn!(
                untagged = fill.untagged,
                "some triangles are not reachable from any boundary segment"
            );
        }

        Ok(CdtReport {
            insertion,
            matched,
            recovered,
            unresolved,
        })
    }

    /// Marks all boundary segments that are triangle edges and tags the adjacent
    /// triangles with the segment's domains.
    ///
    /// Returns the number of newly marked segments.
    fn fit_boundary(&mut self) -> usize {
        let mut newly_marked = 0;
        for handle in self.triangulation.triangles.handles() {
            for edge in 0..3 {
                let [from, to] = self.triangulation.triangles.get(handle).edge(edge);
                let Some(index) = self.bucket.find(from, to, &self.segments) else {
                    continue;
                };
                let segment = &mut self.segments[index.0];
                if !segment.marked {
                    segment.marked = true;
                    newly_marked += 1;
                }
                let segment = *segment;

                let positions = self.triangle_positions_unchecked(handle);
                let [start, end] = segment.points.map(|p| self.triangulation.pos(p));
                let domain = segment.domain_towards(start, end, triangle_centroid(positions));
                self.triangulation
                    .triangles
                    .get_mut(handle)
                    .data_mut()
                    .set_domain(Some(domain));
            }
        }
        newly_marked
    }

    fn recover_missing_segments(&mut self) -> (usize, Vec<UnresolvedSegment>) {
        let mut recovered = 0;
        let mut unresolved = Vec::new();
        for index in 0..self.segments.len() {
            if self.segments[index].marked {
                continue;
            }
            let [from, to] = self.segments[index].points;
            let segments = &self.segments;
            let bucket = &self.bucket;
            let result = recover_segment(&mut self.triangulation, from, to, |a, b| {
                bucket
                    .find(a, b, segments)
                    .filter(|segment| segments[segment.0].marked)
            });
            match result {
                Ok(RecoveryOutcome::AlreadyPresent) | Ok(RecoveryOutcome::Recovered { .. }) => {
                    self.segments[index].marked = true;
                    recovered += 1;
                }
                Err(reason) => {
                    warn!(?from, ?to, %reason, "unresolved boundary segment");
                    unresolved.push(UnresolvedSegment {
                        segment: SegmentIndex(index),
                        reason,
                    });
                }
            }
        }
        (recovered, unresolved)
    }
}

impl<V, F> ConstrainedTriangulation2<V, F> {
    fn triangle_positions_unchecked(&self, handle: FixedTriangleHandle) -> [Point2<f64>; 3] {
        self.triangulation
            .triangles
            .get(handle)
            .points()
            .map(|p| self.triangulation.pos(p))
    }

    /// Returns the underlying triangulation.
    pub fn triangulation(&self) -> &DelaunayTriangulation2<V, CdtFace<F>> {
        &self.triangulation
    }

    /// Returns `true` once [perform](Self::perform) has completed successfully.
    pub fn is_performed(&self) -> bool {
        self.triangulation.is_performed()
    }

    /// Returns the number of real points.
    pub fn num_points(&self) -> usize {
        self.triangulation.num_points()
    }

    /// Returns the position of a real or dummy point.
    pub fn position(&self, id: PointId) -> Option<Point2<f64>> {
        self.triangulation.position(id)
    }

    /// Returns all boundary segments in insertion order.
    pub fn segments(&self) -> &[BoundarySegment] {
        &self.segments
    }

    /// Returns a boundary segment.
    pub fn segment(&self, index: SegmentIndex) -> Option<&BoundarySegment> {
        self.segments.get(index.0)
    }

    /// Returns the number of boundary segments.
    pub fn num_segments(&self) -> usize {
        self.segments.len()
    }

    /// Returns the boundary segment connecting two points, in any direction.
    ///
    /// Only available after [perform](Self::perform).
    pub fn segment_between(&self, a: PointId, b: PointId) -> Option<SegmentIndex> {
        self.bucket.find(a, b, &self.segments)
    }

    /// Iterates over all triangles, including dummy triangles.
    pub fn triangles(
        &self,
    ) -> impl Iterator<Item = (FixedTriangleHandle, &Triangle<CdtFace<F>>)> + '_ {
        self.triangulation.triangles()
    }

    /// Iterates over all triangles that don't touch a dummy point.
    pub fn real_triangles(
        &self,
    ) -> impl Iterator<Item = (FixedTriangleHandle, &Triangle<CdtFace<F>>)> + '_ {
        self.triangulation.real_triangles()
    }

    /// Returns the number of real triangles.
    pub fn num_real_triangles(&self) -> usize {
        self.triangulation.num_real_triangles()
    }

    /// Looks up a triangle. Returns `None` for stale handles.
    pub fn triangle(&self, handle: FixedTriangleHandle) -> Option<&Triangle<CdtFace<F>>> {
        self.triangulation.triangle(handle)
    }

    /// Returns the user data of a triangle.
    pub fn triangle_data_mut(&mut self, handle: FixedTriangleHandle) -> Option<&mut F> {
        self.triangulation
            .triangle_data_mut(handle)
            .map(CdtFace::data_mut)
    }

    /// Returns the domain of a triangle.
    ///
    /// Returns `None` for stale handles and for triangles whose domain is unknown.
    pub fn domain_of(&self, handle: FixedTriangleHandle) -> Option<u32> {
        self.triangulation
            .triangle(handle)
            .and_then(|triangle| triangle.data().domain())
    }

    /// Iterates over all real triangles of a domain.
    pub fn triangles_in_domain(
        &self,
        domain: u32,
    ) -> impl Iterator<Item = (FixedTriangleHandle, &Triangle<CdtFace<F>>)> + '_ {
        self.real_triangles()
            .filter(move |(_, triangle)| triangle.data().domain() == Some(domain))
    }

    /// Returns all triangles with an edge that is crossed by a boundary segment.
    ///
    /// Empty for segments that are edges of the triangulation.
    pub fn triangles_crossing_segment(
        &self,
        index: SegmentIndex,
    ) -> Result<Vec<FixedTriangleHandle>, TriangulationError> {
        if !self.is_performed() {
            return Err(TriangulationError::NotPerformed);
        }
        let Some(segment) = self.segments.get(index.0) else {
            return Ok(Vec::new());
        };
        let [from, to] = segment.points.map(|p| self.triangulation.pos(p));
        Ok(self
            .triangulation
            .triangles()
            .filter(|(handle, _)| {
                let [a, b, c] = self.triangle_positions_unchecked(*handle);
                [(a, b), (b, c), (c, a)]
                    .into_iter()
                    .any(|(start, end)| segments_cross_properly(from, to, start, end))
            })
            .map(|(handle, _)| handle)
            .collect())
    }

    /// Removes triangles. *See [DelaunayTriangulation2::delete_triangles]*
    pub fn delete_triangles(
        &mut self,
        handles: impl IntoIterator<Item = FixedTriangleHandle>,
    ) -> usize {
        self.triangulation.delete_triangles(handles)
    }

    /// Makes every triangle counterclockwise. *See [DelaunayTriangulation2::reorder_triangles]*
    pub fn reorder_triangles(&mut self) -> usize {
        self.triangulation.reorder_triangles()
    }

    /// Checks that every real triangle has a domain.
    pub fn check_domain_coverage(&self) -> Result<(), ValidationError> {
        match self
            .real_triangles()
            .find(|(_, triangle)| triangle.data().domain().is_none())
        {
            Some((handle, _)) => Err(ValidationError::MissingDomain {
                simplex: handle.index(),
            }),
            None => Ok(()),
        }
    }

    /// Checks orientation, adjacency and domain coverage.
    ///
    /// The Delaunay property is not checked since recovered segments may violate it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.triangulation.check_orientation()?;
        self.triangulation.check_adjacency()?;
        self.check_domain_coverage()
    }
}

#[cfg(test)]
mod test {
    use super::{ConstrainedTriangulation2, SegmentIndex, UnresolvedReason};
    use crate::handles::PointId;
    use crate::math::triangle_centroid;
    use crate::test_utilities::{square, SEED};
    use crate::{Point2, TriangulationError, ValidationError};
    use rand::distributions::{Distribution, Uniform};
    use rand::SeedableRng;

    type Cdt = ConstrainedTriangulation2<Point2<f64>>;

    fn add_loop(cdt: &mut Cdt, points: &[Point2<f64>], front: u32, rear: u32) -> Vec<PointId> {
        let ids: Vec<_> = points.iter().map(|p| cdt.add_point(*p).unwrap()).collect();
        for i in 0..ids.len() {
            cdt.add_boundary_segment(ids[i], ids[(i + 1) % ids.len()], front, rear)
                .unwrap();
        }
        ids
    }

    fn centroid(cdt: &Cdt, points: [PointId; 3]) -> Point2<f64> {
        triangle_centroid(points.map(|p| cdt.position(p).unwrap()))
    }

    #[test]
    fn test_constrained_square() -> Result<(), TriangulationError> {
        let mut cdt = Cdt::new();
        add_loop(&mut cdt, &square(), 1, 0);
        let report = cdt.perform()?;

        assert!(report.is_complete());
        assert!(report.insertion.is_complete());
        assert_eq!(report.matched, 4);
        assert_eq!(report.recovered, 0);
        assert!(cdt.segments().iter().all(|s| s.is_marked()));

        assert_eq!(cdt.num_real_triangles(), 2);
        assert_eq!(cdt.triangles_in_domain(1).count(), 2);
        for (handle, triangle) in cdt.triangles() {
            let expected = if triangle.is_dummy() { 0 } else { 1 };
            assert_eq!(cdt.domain_of(handle), Some(expected));
        }
        cdt.validate().unwrap();
        Ok(())
    }

    #[test]
    fn test_clockwise_square_swaps_domains() -> Result<(), TriangulationError> {
        let mut cdt = Cdt::new();
        let mut points = square();
        points.reverse();
        add_loop(&mut cdt, &points, 0, 1);
        cdt.perform()?;
        assert_eq!(cdt.triangles_in_domain(1).count(), 2);
        assert_eq!(cdt.triangles_in_domain(0).count(), 0);
        Ok(())
    }

    #[test]
    fn test_recovered_segment() -> Result<(), TriangulationError> {
        let mut cdt = Cdt::new();
        let ids = [
            cdt.add_point(Point2::new(0.0, 5.0))?,
            cdt.add_point(Point2::new(10.0, 5.0))?,
            cdt.add_point(Point2::new(5.0, 4.0))?,
            cdt.add_point(Point2::new(5.0, 6.0))?,
        ];
        let segment = cdt.add_boundary_segment(ids[0], ids[1], 1, 2)?;
        let report = cdt.perform()?;

        assert_eq!(report.matched, 0);
        assert_eq!(report.recovered, 1);
        assert!(report.is_complete());
        assert_eq!(cdt.triangles_crossing_segment(segment)?, vec![]);
        assert_eq!(cdt.segment_between(ids[1], ids[0]), Some(segment));

        assert_eq!(cdt.num_real_triangles(), 2);
        for (handle, triangle) in cdt.real_triangles() {
            let expected = if triangle.has_point(ids[3]) { 1 } else { 2 };
            assert_eq!(cdt.domain_of(handle), Some(expected));
        }
        cdt.validate().unwrap();
        Ok(())
    }

    #[test]
    fn test_segment_through_vertex_is_unresolved() -> Result<(), TriangulationError> {
        let mut cdt = Cdt::new();
        let ids = [
            cdt.add_point(Point2::new(0.0, 0.0))?,
            cdt.add_point(Point2::new(10.0, 0.0))?,
            cdt.add_point(Point2::new(5.0, 0.0))?,
            cdt.add_point(Point2::new(5.0, 5.0))?,
            cdt.add_point(Point2::new(5.0, -5.0))?,
        ];
        cdt.add_boundary_segment(ids[0], ids[1], 1, 2)?;
        let report = cdt.perform()?;

        assert!(!report.is_complete());
        assert_eq!(report.unresolved.len(), 1);
        assert_eq!(report.unresolved[0].segment, SegmentIndex::new(0));
        assert_eq!(
            report.unresolved[0].reason,
            UnresolvedReason::PassesThroughVertex(ids[2])
        );
        assert!(!cdt.segments()[0].is_marked());
        assert!(matches!(
            cdt.check_domain_coverage(),
            Err(ValidationError::MissingDomain { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_crossing_segments_are_unresolved() -> Result<(), TriangulationError> {
        let mut cdt = Cdt::new();
        let ids = add_loop(&mut cdt, &square(), 1, 0);
        cdt.add_boundary_segment(ids[0], ids[2], 1, 1)?;
        cdt.add_boundary_segment(ids[1], ids[3], 1, 1)?;
        let report = cdt.perform()?;

        // Only one diagonal can be an edge.
        assert_eq!(report.matched, 5);
        assert_eq!(report.unresolved.len(), 1);
        assert!(matches!(
            report.unresolved[0].reason,
            UnresolvedReason::CrossesSegment(_)
        ));
        assert_eq!(cdt.triangles_in_domain(1).count(), 2);
        Ok(())
    }

    #[test]
    fn test_nested_domains() -> Result<(), TriangulationError> {
        let mut cdt = Cdt::new();
        add_loop(&mut cdt, &square(), 1, 0);
        let inner = [
            Point2::new(3.0, 3.0),
            Point2::new(7.0, 3.0),
            Point2::new(7.0, 7.0),
            Point2::new(3.0, 7.0),
        ];
        add_loop(&mut cdt, &inner, 2, 1);
        for point in [
            Point2::new(5.0, 5.0),
            Point2::new(1.5, 5.0),
            Point2::new(8.5, 5.0),
            Point2::new(5.0, 1.5),
            Point2::new(5.0, 8.5),
            Point2::new(4.0, 6.0),
        ] {
            cdt.add_point(point)?;
        }
        let report = cdt.perform()?;
        assert!(report.is_complete());
        assert_eq!(report.matched + report.recovered, 8);

        for (handle, triangle) in cdt.real_triangles() {
            let c = centroid(&cdt, triangle.points());
            let inside = c.x > 3.0 && c.x < 7.0 && c.y > 3.0 && c.y < 7.0;
            let expected = if inside { 2 } else { 1 };
            assert_eq!(cdt.domain_of(handle), Some(expected));
        }
        cdt.validate().unwrap();
        Ok(())
    }

    #[test]
    fn test_random_star_polygon() -> Result<(), TriangulationError> {
        let mut rng = rand::rngs::StdRng::from_seed(*SEED);
        let radius = Uniform::new(3.0, 5.0);
        let boundary: Vec<_> = (0..40)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 40.0;
                let r: f64 = radius.sample(&mut rng);
                Point2::new(r * angle.cos(), r * angle.sin())
            })
            .collect();

        let mut cdt = Cdt::new();
        add_loop(&mut cdt, &boundary, 1, 0);
        let interior = Uniform::new(-2.0, 2.0);
        for _ in 0..200 {
            let point = Point2::new(interior.sample(&mut rng), interior.sample(&mut rng));
            cdt.add_point(point)?;
        }

        let report = cdt.perform()?;
        assert!(report.is_complete());
        for index in 0..cdt.num_segments() {
            let segment = SegmentIndex::new(index);
            assert!(cdt.segment(segment).unwrap().is_marked());
            assert!(cdt.triangles_crossing_segment(segment)?.is_empty());
        }
        for (handle, triangle) in cdt.real_triangles() {
            let c = centroid(&cdt, triangle.points());
            if c.length2() < 2.9 * 2.9 {
                assert_eq!(cdt.domain_of(handle), Some(1));
            }
        }
        cdt.validate().unwrap();
        Ok(())
    }

    #[test]
    fn test_preconditions() -> Result<(), TriangulationError> {
        let mut cdt = Cdt::new();
        let a = cdt.add_point(Point2::new(0.0, 0.0))?;
        let b = cdt.add_point(Point2::new(1.0, 1.0))?;
        assert_eq!(
            cdt.add_boundary_segment(a, PointId::real(5), 0, 1),
            Err(TriangulationError::UnknownPoint(PointId::real(5)))
        );
        assert_eq!(
            cdt.add_boundary_segment(a, a, 0, 1),
            Err(TriangulationError::DegenerateSegment)
        );
        assert_eq!(cdt.perform(), Err(TriangulationError::NoBoundarySegments));
        assert_eq!(
            cdt.triangles_crossing_segment(SegmentIndex::new(0)),
            Err(TriangulationError::NotPerformed)
        );

        cdt.add_boundary_segment(a, b, 0, 1)?;
        cdt.perform()?;
        assert_eq!(
            cdt.add_boundary_segment(b, a, 0, 1),
            Err(TriangulationError::AlreadyPerformed)
        );
        assert_eq!(cdt.perform(), Err(TriangulationError::AlreadyPerformed));
        Ok(())
    }
}
