use tracing::{debug, trace, warn};

use super::handles::PointId;

/// Summarizes the point insertion phase of a `perform()` run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InsertionReport {
    /// Number of real points that are part of the triangulation.
    pub inserted: usize,
    /// Real points that were rejected in every insertion pass, e.g. duplicates.
    pub skipped: Vec<PointId>,
}

impl InsertionReport {
    /// Returns `true` if every real point has been inserted.
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RejectReason {
    /// The point coincides with an existing vertex.
    Duplicate,
    /// The point lies on (or too close to) a cavity boundary facet, or a new simplex
    /// would be degenerate.
    Degenerate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum InsertionOutcome {
    Inserted { cavity_size: usize },
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunState {
    Pending,
    Performed,
    Failed,
}

/// Inserts the points `0..count` in passes of decreasing stride.
///
/// Pass `i` attempts every `strides[i]`-th point that was not inserted by an earlier pass.
/// Rejected points are attempted again by later passes. Returns the report and a flag per
/// point telling whether it has been inserted.
pub(crate) fn insert_in_passes<E>(
    strides: &[usize],
    count: usize,
    mut insert: impl FnMut(PointId) -> Result<InsertionOutcome, E>,
) -> Result<(InsertionReport, Vec<bool>), E> {
    let mut inserted = vec![false; count];
    let mut num_inserted = 0;
    let last_pass = strides.len().saturating_sub(1);

    for (pass, &stride) in strides.iter().enumerate() {
        let mut inserted_in_pass = 0;
        let mut rejected_in_pass = 0;
        for index in (0..count).step_by(stride.max(1)) {
            if inserted[index] {
                continue;
            }
            let id = PointId::real(index);
            match insert(id)? {
                InsertionOutcome::Inserted { cavity_size } => {
                    trace!(point = ?id, cavity_size, "inserted point");
                    inserted[index] = true;
                    inserted_in_pass += 1;
                }
                InsertionOutcome::Rejected(reason) => {
                    rejected_in_pass += 1;
                    if pass == last_pass {
                        warn!(point = ?id, ?reason, "skipping point");
                    }
                }
            }
        }
        num_inserted += inserted_in_pass;
        debug!(
            pass,
            stride,
            inserted = inserted_in_pass,
            rejected = rejected_in_pass,
            "insertion pass finished"
        );
    }

    let skipped = inserted
        .iter()
        .enumerate()
        .filter(|(_, inserted)| !**inserted)
        .map(|(index, _)| PointId::real(index))
        .collect();

    Ok((
        InsertionReport {
            inserted: num_inserted,
            skipped,
        },
        inserted,
    ))
}

#[cfg(test)]
mod test {
    use super::{insert_in_passes, InsertionOutcome, RejectReason};
    use crate::handles::PointId;

    #[test]
    fn test_pass_order_and_retry() {
        let mut order = Vec::new();
        let mut attempts_of_five = 0;
        let (report, inserted) = insert_in_passes::<()>(&[5, 2, 1], 8, |id| {
            order.push(id.index());
            if id.index() == 5 {
                attempts_of_five += 1;
                // Succeeds only in the second attempt.
                if attempts_of_five < 2 {
                    return Ok(InsertionOutcome::Rejected(RejectReason::Degenerate));
                }
            }
            if id.index() == 7 {
                return Ok(InsertionOutcome::Rejected(RejectReason::Duplicate));
            }
            Ok(InsertionOutcome::Inserted { cavity_size: 1 })
        })
        .unwrap();

        assert_eq!(order, vec![0, 5, 2, 4, 6, 1, 3, 5, 7]);
        assert_eq!(report.inserted, 7);
        assert_eq!(report.skipped, vec![PointId::real(7)]);
        assert!(!report.is_complete());
        assert_eq!(inserted.iter().filter(|i| **i).count(), 7);
    }
}
