use hashbrown::HashMap;
use tracing::debug;

use crate::cdt::CdtFace;
use crate::handles::{FixedTriangleHandle, PointId, TriangleTag};
use crate::mesh_core::{SimplexArena, Triangle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    /// Pushed on the stack. `cursor` is the next edge to look at.
    Visiting {
        cursor: usize,
        predecessor: Option<FixedTriangleHandle>,
    },
    Visited,
}

/// Result of a domain flood fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct DomainFill {
    pub seeds: usize,
    pub propagated: usize,
    /// Real triangles that could not be reached from any seed.
    pub untagged: usize,
}

/// Propagates the domain of every tagged triangle to all triangles reachable without
/// crossing a barrier edge.
///
/// Triangles that already carry a domain keep it and continue the fill with their own
/// domain. Triangles without an entry in the state map are unvisited.
pub(crate) fn identify_domain<F>(
    triangles: &mut SimplexArena<Triangle<CdtFace<F>>, TriangleTag>,
    is_barrier: impl Fn(PointId, PointId) -> bool,
) -> DomainFill {
    let seeds: Vec<_> = triangles
        .iter()
        .filter(|(_, triangle)| triangle.data().domain().is_some())
        .map(|(handle, _)| handle)
        .collect();

    let mut states: HashMap<FixedTriangleHandle, VisitState> =
        HashMap::with_capacity(triangles.len());
    let mut stack = Vec::new();
    let mut propagated = 0;

    for seed in &seeds {
        if states.contains_key(seed) {
            continue;
        }
        states.insert(
            *seed,
            VisitState::Visiting {
                cursor: 0,
                predecessor: None,
            },
        );
        stack.push(*seed);

        while let Some(current) = stack.last().copied() {
            let (cursor, predecessor) = match states.get(&current) {
                Some(VisitState::Visiting {
                    cursor,
                    predecessor,
                }) => (*cursor, *predecessor),
                _ => panic!("Triangle on the fill stack is not being visited"),
            };
            if cursor == 3 {
                states.insert(current, VisitState::Visited);
                stack.pop();
                continue;
            }
            states.insert(
                current,
                VisitState::Visiting {
                    cursor: cursor + 1,
                    predecessor,
                },
            );

            let triangle = triangles.get(current);
            let Some(neighbor) = triangle.neighbor(cursor) else {
                continue;
            };
            if Some(neighbor) == predecessor || states.contains_key(&neighbor) {
                continue;
            }
            let [from, to] = triangle.edge(cursor);
            if is_barrier(from, to) {
                continue;
            }

            let domain = triangle.data().domain();
            let face = triangles.get_mut(neighbor).data_mut();
            if face.domain().is_none() {
                face.set_domain(domain);
                propagated += 1;
            }
            states.insert(
                neighbor,
                VisitState::Visiting {
                    cursor: 0,
                    predecessor: Some(current),
                },
            );
            stack.push(neighbor);
        }
    }

    let untagged = triangles
        .iter()
        .filter(|(_, triangle)| !triangle.is_dummy() && triangle.data().domain().is_none())
        .count();

    debug!(
        seeds = seeds.len(),
        propagated, untagged, "domain identification finished"
    );
    DomainFill {
        seeds: seeds.len(),
        propagated,
        untagged,
    }
}
