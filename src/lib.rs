//! # Tessera
//!
//! Incremental Delaunay triangulations for mesh generation.
//!
//! # Features
//! * A 2D Delaunay triangulation: [DelaunayTriangulation2]
//! * A 3D Delaunay tetrahedralization: [DelaunayTetrahedralization]
//! * A 2D constrained triangulation with domain identification: [ConstrainedTriangulation2]
//!   * Inserts mandatory boundary segments by local retriangulation
//!   * Tags each triangle with the domain it belongs to
//! * Uses exact geometric predicates to avoid floating point rounding issues
//!   (see [predicates])
//!
//! All triangulators follow the same life cycle: points are added with `add_point`, then
//! `perform()` triangulates all of them at once. Points are inserted one by one into an
//! enclosing cage of *dummy* points. Simplices touching a dummy point are reported as
//! dummy simplices and are not part of the resulting mesh.
//!
//! # Logging
//! Tessera reports its progress through the [tracing](https://docs.rs/tracing) facade.
//! Skipped points and unresolved boundary segments are logged as warnings.
//!
//! # Cargo features
//! - `serde`: Serialization for points, ids, handles, bounding boxes and parameters.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bounding_box;
mod cdt;
mod constraint_recovery;
mod delaunay_2d;
mod delaunay_3d;
mod domain;
mod error;
mod line_side_info;
mod math;
mod mesh_core;
mod parameters;
mod point;
pub mod predicates;

#[cfg(test)]
mod test_utilities;

pub use bounding_box::{BoundingBox2, BoundingBox3};
pub use cdt::{
    BoundarySegment, CdtFace, CdtReport, ConstrainedTriangulation2, SegmentIndex,
    UnresolvedReason, UnresolvedSegment,
};
pub use delaunay_2d::DelaunayTriangulation2;
pub use delaunay_3d::DelaunayTetrahedralization;
pub use error::{InsertionError, TriangulationError, ValidationError};
pub use line_side_info::{LineSideInfo, PlaneSideInfo};
pub use math::{
    circumcenter, circumcenter_3d, distance_to_line, distance_to_plane, mitigate_underflow,
    sliver_ratio, tetrahedron_volume, triangle_area, triangle_centroid, validate_coordinate,
    validate_vertex, validate_vertex_3d, DEFAULT_SLIVER_RATIO, MAX_ALLOWED_VALUE,
    MIN_ALLOWED_VALUE,
};
pub use mesh_core::{InsertionReport, Tetrahedron, Triangle, EDGE_VERTEX_MAP, FACE_VERTEX_MAP};
pub use parameters::InsertionParameters;
pub use point::{HasPosition, HasPosition3, MeshNum, Point2, Point3};

/// Handle types used for accessing simplices and points.
///
/// All handles are fixed: they stay valid as long as the referenced simplex exists and
/// can be stored by the caller.
pub mod handles {
    pub use crate::mesh_core::handles::{
        FixedHandleImpl, FixedTetrahedronHandle, FixedTriangleHandle, PointId, TetrahedronTag,
        TriangleTag,
    };
}
