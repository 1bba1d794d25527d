use hashbrown::{HashMap, HashSet};
use tracing::trace;

use crate::cdt::{SegmentIndex, UnresolvedReason};
use crate::delaunay_2d::DelaunayTriangulation2;
use crate::handles::{FixedTriangleHandle, PointId};
use crate::predicates::{in_circle, side_query};
use crate::HasPosition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RecoveryOutcome {
    /// The segment already is an edge of the triangulation.
    AlreadyPresent,
    Recovered { removed: usize, created: usize },
}

/// Triangles crossed by a missing segment, in walking order.
///
/// `left` and `right` contain the vertices of the crossed edges lying left and right of
/// the directed segment, in the order they are encountered.
#[derive(Debug)]
struct ConflictRegion {
    triangles: Vec<FixedTriangleHandle>,
    left: Vec<PointId>,
    right: Vec<PointId>,
}

/// Inserts the segment `from -> to` as an edge of the triangulation.
///
/// All triangles crossed by the segment are removed. The two pseudo polygons on either
/// side of the segment are retriangulated such that the result is the constrained
/// Delaunay triangulation of the region.
///
/// `constraint_at` returns the boundary segment occupying an existing edge. Crossing
/// such an edge is never allowed.
pub(crate) fn recover_segment<V: HasPosition, F: Default>(
    triangulation: &mut DelaunayTriangulation2<V, F>,
    from: PointId,
    to: PointId,
    constraint_at: impl Fn(PointId, PointId) -> Option<SegmentIndex>,
) -> Result<RecoveryOutcome, UnresolvedReason> {
    if !triangulation.is_inserted(from) || !triangulation.is_inserted(to) {
        return Err(UnresolvedReason::EndpointNotInserted);
    }

    let region = match find_conflict_region(triangulation, from, to, &constraint_at)? {
        Some(region) => region,
        None => return Ok(RecoveryOutcome::AlreadyPresent),
    };
    let removed = region.triangles.len();
    let created = retriangulate(triangulation, from, to, region);
    trace!(?from, ?to, removed, created, "recovered boundary segment");
    Ok(RecoveryOutcome::Recovered { removed, created })
}

fn find_conflict_region<V, F>(
    triangulation: &DelaunayTriangulation2<V, F>,
    from: PointId,
    to: PointId,
    constraint_at: &impl Fn(PointId, PointId) -> Option<SegmentIndex>,
) -> Result<Option<ConflictRegion>, UnresolvedReason> {
    let a = triangulation.pos(from);
    let b = triangulation.pos(to);
    let direction = b.sub(a);
    let length2 = direction.length2();

    let mut start = None;
    for (handle, triangle) in triangulation.triangles() {
        let Some(index) = triangle.index_of(from) else {
            continue;
        };
        if triangle.has_point(to) {
            return Ok(None);
        }
        let [right, left] = triangle.edge(index);
        for vertex in [right, left] {
            let position = triangulation.pos(vertex);
            let projection = position.sub(a).dot(direction);
            if side_query(a, b, position).is_on_line() && projection > 0.0 && projection < length2
            {
                return Err(UnresolvedReason::PassesThroughVertex(vertex));
            }
        }
        if side_query(a, b, triangulation.pos(right)).is_right()
            && side_query(a, b, triangulation.pos(left)).is_left()
        {
            start = Some((handle, index, right, left));
        }
    }

    let (mut current, mut edge, mut right, mut left) =
        start.ok_or(UnresolvedReason::LeavesTriangulation)?;
    let mut region = ConflictRegion {
        triangles: vec![current],
        left: vec![left],
        right: vec![right],
    };

    for _ in 0..triangulation.num_triangles() {
        if let Some(segment) = constraint_at(right, left) {
            return Err(UnresolvedReason::CrossesSegment(segment));
        }
        let next = triangulation
            .triangle(current)
            .and_then(|triangle| triangle.neighbor(edge))
            .ok_or(UnresolvedReason::LeavesTriangulation)?;
        let next_triangle = triangulation
            .triangle(next)
            .ok_or(UnresolvedReason::LeavesTriangulation)?;
        region.triangles.push(next);

        let back = next_triangle
            .edge_index(right, left)
            .ok_or(UnresolvedReason::LeavesTriangulation)?;
        let opposite = next_triangle.point(back);
        if opposite == to {
            return Ok(Some(region));
        }

        let side = side_query(a, b, triangulation.pos(opposite));
        if side.is_on_line() {
            return Err(UnresolvedReason::PassesThroughVertex(opposite));
        }
        if side.is_left() {
            left = opposite;
            region.left.push(opposite);
        } else {
            right = opposite;
            region.right.push(opposite);
        }
        edge = next_triangle
            .edge_index(right, left)
            .ok_or(UnresolvedReason::LeavesTriangulation)?;
        current = next;
    }
    Err(UnresolvedReason::LeavesTriangulation)
}

fn retriangulate<V: HasPosition, F: Default>(
    triangulation: &mut DelaunayTriangulation2<V, F>,
    from: PointId,
    to: PointId,
    region: ConflictRegion,
) -> usize {
    let crossed: HashSet<FixedTriangleHandle> = region.triangles.iter().copied().collect();

    // Directed border edge -> (removed triangle, triangle outside of the region)
    let mut border = HashMap::new();
    for handle in &region.triangles {
        let triangle = triangulation.triangles.get(*handle);
        for edge in 0..3 {
            let outside = triangle.neighbor(edge);
            if outside.map_or(false, |outside| crossed.contains(&outside)) {
                continue;
            }
            let [u, v] = triangle.edge(edge);
            border.insert((u, v), (*handle, outside));
        }
    }
    for handle in &region.triangles {
        triangulation.triangles.remove(*handle);
    }

    let mut created = Vec::with_capacity(region.triangles.len());
    triangulate_pseudo_polygon(triangulation, from, to, &region.left, &mut created);
    let mut right = region.right;
    right.reverse();
    triangulate_pseudo_polygon(triangulation, to, from, &right, &mut created);

    let mut by_edge = HashMap::with_capacity(created.len() * 3);
    for handle in &created {
        let triangle = triangulation.triangles.get(*handle);
        for edge in 0..3 {
            let [u, v] = triangle.edge(edge);
            by_edge.insert((u, v), *handle);
        }
    }

    for handle in &created {
        for edge in 0..3 {
            let [u, v] = triangulation.triangles.get(*handle).edge(edge);
            if let Some(twin) = by_edge.get(&(v, u)) {
                triangulation
                    .triangles
                    .get_mut(*handle)
                    .set_neighbor(edge, Some(*twin));
            } else if let Some((removed, outside)) = border.get(&(u, v)).copied() {
                triangulation
                    .triangles
                    .get_mut(*handle)
                    .set_neighbor(edge, outside);
                if let Some(outside) = outside {
                    triangulation.replace_neighbor(outside, removed, Some(*handle));
                }
            } else {
                panic!("Retriangulated region is not closed at {:?}", [u, v]);
            }
        }
    }
    created.len()
}

/// Triangulates the pseudo polygon made of the base edge `a -> b` and `chain`.
///
/// All chain vertices lie left of `a -> b`. They are ordered from the vertex next to `a`
/// to the vertex next to `b`.
fn triangulate_pseudo_polygon<V: HasPosition, F: Default>(
    triangulation: &mut DelaunayTriangulation2<V, F>,
    a: PointId,
    b: PointId,
    chain: &[PointId],
    created: &mut Vec<FixedTriangleHandle>,
) {
    let mut stack = vec![(a, b, 0, chain.len())];
    while let Some((a, b, start, end)) = stack.pop() {
        if start == end {
            continue;
        }
        let pa = triangulation.pos(a);
        let pb = triangulation.pos(b);
        let mut best = start;
        for candidate in start + 1..end {
            let pc = triangulation.pos(chain[best]);
            if in_circle(pa, pb, pc, triangulation.pos(chain[candidate])) > 0.0 {
                best = candidate;
            }
        }
        let c = chain[best];
        created.push(triangulation.create_triangle([a, b, c]));
        stack.push((a, c, start, best));
        stack.push((c, b, best + 1, end));
    }
}
