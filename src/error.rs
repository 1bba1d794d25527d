use thiserror::Error;

use crate::handles::PointId;

/// The error type used for adding points to a triangulator.
///
/// Errors during insertion can only originate from an invalid vertex position. Vertices can
/// be checked for validity by using [crate::validate_vertex].
#[derive(Error, Copy, Clone, PartialOrd, Ord, PartialEq, Eq, Debug, Hash)]
pub enum InsertionError {
    /// A coordinate value was too small.
    ///
    /// The absolute value of any inserted vertex coordinate must either be zero or
    /// greater than or equal to [crate::MIN_ALLOWED_VALUE].
    #[error("coordinate is too small, absolute values must be zero or at least 2^-142")]
    TooSmall,

    /// A coordinate value was too large.
    ///
    /// The absolute value of any inserted vertex coordinate must be less than or equal to
    /// [crate::MAX_ALLOWED_VALUE].
    #[error("coordinate is too large, absolute values must be at most 2^201")]
    TooLarge,

    /// A coordinate value was NaN.
    #[error("coordinate is NaN")]
    NAN,
}

/// Errors returned by the triangulators when a caller contract is violated or a run
/// cannot be completed.
#[derive(Error, Clone, PartialEq, Debug)]
pub enum TriangulationError {
    /// Points or segments were added after `perform()`, or `perform()` was called twice.
    #[error("the triangulation has already been performed")]
    AlreadyPerformed,

    /// `perform()` was called with too few real points.
    #[error("at least {required} points are required, got {actual}")]
    NotEnoughPoints {
        /// Minimum number of real points.
        required: usize,
        /// Number of real points that were added.
        actual: usize,
    },

    /// A point had a coordinate that cannot be handled by the exact predicates.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(#[from] InsertionError),

    /// All points coincide, the enclosing cage would have zero extent.
    #[error("the input points have a degenerate bounding box")]
    DegenerateBounds,

    /// No simplex contains the point. Only possible if the point lies outside of the
    /// enclosing cage.
    #[error("point {point:?} is not contained in any simplex of the enclosing cage")]
    PointOutsideCage {
        /// The offending point.
        point: PointId,
    },

    /// A point id does not refer to a real point of this triangulator.
    #[error("unknown point {0:?}")]
    UnknownPoint(PointId),

    /// Both endpoints of a boundary segment are the same point.
    #[error("boundary segment endpoints must differ")]
    DegenerateSegment,

    /// A constrained triangulation requires at least one boundary segment.
    #[error("no boundary segments have been added")]
    NoBoundarySegments,

    /// The query requires a completed `perform()` run.
    #[error("the triangulation has not been performed yet")]
    NotPerformed,
}

/// Errors reported by the structural checkers, e.g.
/// [DelaunayTriangulation2::validate](crate::DelaunayTriangulation2::validate).
#[derive(Error, Clone, PartialEq, Debug)]
pub enum ValidationError {
    /// A real point lies strictly inside the circumcircle or circumsphere of a real simplex.
    #[error("point {point:?} lies inside the circumscribed ball of simplex {simplex}")]
    DelaunayViolation {
        /// Index of the violated simplex.
        simplex: usize,
        /// The point inside its circumscribed ball.
        point: PointId,
    },

    /// Two simplices disagree about being neighbors.
    #[error("simplex {simplex} lists {neighbor} as neighbor across facet {facet}, but not vice versa")]
    AsymmetricAdjacency {
        /// Index of the simplex listing the neighbor.
        simplex: usize,
        /// Facet index of the listing simplex.
        facet: usize,
        /// Index of the neighbor.
        neighbor: usize,
    },

    /// A triangle is not counterclockwise or a tetrahedron is not positively oriented.
    #[error("simplex {simplex} is not positively oriented")]
    InvertedSimplex {
        /// Index of the inverted simplex.
        simplex: usize,
    },

    /// The cached circumradius of a simplex is not a positive finite number.
    #[error("simplex {simplex} has a non-positive circumradius")]
    NonPositiveCircumradius {
        /// Index of the offending simplex.
        simplex: usize,
    },

    /// A real triangle of a constrained triangulation was not assigned to any domain.
    #[error("triangle {simplex} has no domain")]
    MissingDomain {
        /// Index of the untagged triangle.
        simplex: usize,
    },
}
