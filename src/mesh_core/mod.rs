mod arena;
pub mod handles;
mod insertion;
mod simplex;

pub(crate) use arena::SimplexArena;
pub(crate) use insertion::{insert_in_passes, InsertionOutcome, RejectReason, RunState};
pub use insertion::InsertionReport;
pub use simplex::{Tetrahedron, Triangle, EDGE_VERTEX_MAP, FACE_VERTEX_MAP};
