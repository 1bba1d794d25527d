#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use smallvec::{smallvec, SmallVec};

const MIN_CAGE_SCALE: f64 = 1.1;

/// Controls how points are inserted by the triangulators.
///
/// The following parameters will be used by `Self::default` and [Self::new]:
/// * `insertion_strides`: `[50, 10, 1]`
/// * `cage_scale`: `1.5`
/// * `degeneracy_tolerance`: `0.0`
/// * `face_dummy_resolution`: `2` (only used for tetrahedralizations)
///
/// # Example
///
/// ```
/// use tessera::{DelaunayTriangulation2, InsertionParameters, Point2};
///
/// let parameters = InsertionParameters::new()
///     .with_insertion_strides(vec![16, 4, 1])
///     .with_cage_scale(2.0)
///     .with_degeneracy_tolerance(1e-12);
///
/// let triangulation = DelaunayTriangulation2::<Point2<f64>>::with_parameters(parameters);
/// # assert_eq!(triangulation.num_points(), 0);
/// ```
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde")
)]
pub struct InsertionParameters {
    insertion_strides: SmallVec<[usize; 4]>,
    cage_scale: f64,
    degeneracy_tolerance: f64,
    face_dummy_resolution: usize,
}

impl Default for InsertionParameters {
    fn default() -> Self {
        Self {
            insertion_strides: smallvec![50, 10, 1],
            cage_scale: 1.5,
            degeneracy_tolerance: 0.0,
            face_dummy_resolution: 2,
        }
    }
}

impl InsertionParameters {
    /// Creates a new set of `InsertionParameters`.
    ///
    /// Refer to the [struct definition](Self) for more information.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specifies the strides of the insertion passes.
    ///
    /// Pass `i` inserts every `strides[i]`-th point that has not been inserted yet. Inserting
    /// a sparse subset first keeps the average cavity small; the order has no effect on the
    /// resulting triangulation of points in general position.
    ///
    /// The last stride is always forced to `1` so that every point is attempted. Zero strides
    /// are ignored.
    pub fn with_insertion_strides(mut self, strides: Vec<usize>) -> Self {
        let mut strides: SmallVec<[usize; 4]> =
            strides.into_iter().filter(|stride| *stride > 0).collect();
        match strides.last_mut() {
            Some(last) => *last = 1,
            None => strides.push(1),
        }
        self.insertion_strides = strides;
        self
    }

    /// Specifies the size of the enclosing cage.
    ///
    /// The cage half-size is `cage_scale` times half the diagonal of the input bounding box.
    /// Values smaller than `1.1` are clamped to `1.1` so that every input point lies strictly
    /// inside the cage, even for collinear input.
    pub fn with_cage_scale(mut self, cage_scale: f64) -> Self {
        self.cage_scale = cage_scale.max(MIN_CAGE_SCALE);
        self
    }

    /// Specifies when a point is considered to be lying on a cavity boundary facet.
    ///
    /// The tolerance is relative to the cage half-size. A point closer than
    /// `tolerance * cage_size` to the supporting line (or plane) of any facet of its cavity
    /// is rejected for the current pass. A point exactly on the line is always rejected.
    ///
    /// Defaults to `0.0`, relying only on the exact predicates.
    pub fn with_degeneracy_tolerance(mut self, tolerance: f64) -> Self {
        self.degeneracy_tolerance = tolerance.max(0.0);
        self
    }

    /// Specifies the resolution of the dummy grid placed on each face of the enclosing cube
    /// of a tetrahedralization.
    ///
    /// Each face receives a `(2n + 1) x (2n + 1)` grid of dummy points.
    pub fn with_face_dummy_resolution(mut self, resolution: usize) -> Self {
        self.face_dummy_resolution = resolution;
        self
    }

    /// Strides of the insertion passes.
    pub fn insertion_strides(&self) -> &[usize] {
        &self.insertion_strides
    }

    /// Half size of the enclosing cage relative to the half diagonal of the input.
    pub fn cage_scale(&self) -> f64 {
        self.cage_scale
    }

    /// Relative distance under which a point counts as lying on a cavity facet.
    pub fn degeneracy_tolerance(&self) -> f64 {
        self.degeneracy_tolerance
    }

    /// Resolution of the dummy grid placed on each cage face in 3D.
    pub fn face_dummy_resolution(&self) -> usize {
        self.face_dummy_resolution
    }
}

#[cfg(test)]
mod test {
    use super::InsertionParameters;

    #[test]
    fn test_defaults() {
        let parameters = InsertionParameters::new();
        assert_eq!(parameters.insertion_strides(), &[50, 10, 1]);
        assert_eq!(parameters.cage_scale(), 1.5);
        assert_eq!(parameters.degeneracy_tolerance(), 0.0);
        assert_eq!(parameters.face_dummy_resolution(), 2);
    }

    #[test]
    fn test_last_stride_is_one() {
        let parameters = InsertionParameters::new().with_insertion_strides(vec![100, 0, 7]);
        assert_eq!(parameters.insertion_strides(), &[100, 1]);

        let parameters = InsertionParameters::new().with_insertion_strides(vec![]);
        assert_eq!(parameters.insertion_strides(), &[1]);
    }

    #[test]
    fn test_clamping() {
        let parameters = InsertionParameters::new()
            .with_cage_scale(0.5)
            .with_degeneracy_tolerance(-1.0);
        assert_eq!(parameters.cage_scale(), 1.1);
        assert_eq!(parameters.degeneracy_tolerance(), 0.0);
    }
}
