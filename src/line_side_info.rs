/// Describes on which side of a directed line `from -> to` a point lies.
///
/// A point is *left* of the line if `from, to, point` are ordered counterclockwise.
///
/// Created by [side_query](crate::predicates::side_query).
#[derive(Debug, Clone, Copy)]
pub struct LineSideInfo {
    signed_side: f64,
}

impl PartialEq for LineSideInfo {
    fn eq(&self, other: &LineSideInfo) -> bool {
        if self.is_on_line() || other.is_on_line() {
            self.is_on_line() && other.is_on_line()
        } else {
            self.is_left() == other.is_left()
        }
    }
}

impl LineSideInfo {
    #[inline]
    pub(crate) fn from_determinant(s: f64) -> LineSideInfo {
        LineSideInfo { signed_side: s }
    }

    /// Returns `true` if the point lies strictly left of the line.
    pub fn is_left(&self) -> bool {
        self.signed_side > 0.0
    }

    /// Returns `true` if the point lies strictly right of the line.
    pub fn is_right(&self) -> bool {
        self.signed_side < 0.0
    }

    /// Returns `true` if the point lies exactly on the line.
    #[inline]
    pub fn is_on_line(&self) -> bool {
        self.signed_side.abs() == 0.0
    }

    /// Returns the side with respect to the reversed line `to -> from`.
    pub fn reversed(self) -> LineSideInfo {
        LineSideInfo {
            signed_side: -self.signed_side,
        }
    }
}

/// Describes on which side of an oriented plane a point lies.
///
/// A plane through `a, b, c` is oriented such that `a, b, c` appear counterclockwise when
/// viewed from its *upper* side. A tetrahedron `(a, b, c, d)` is positively oriented if and
/// only if `d` lies below the plane through `a, b, c`.
///
/// Created by [plane_side_query](crate::predicates::plane_side_query).
#[derive(Debug, Clone, Copy)]
pub struct PlaneSideInfo {
    signed_side: f64,
}

impl PartialEq for PlaneSideInfo {
    fn eq(&self, other: &PlaneSideInfo) -> bool {
        if self.is_on_plane() || other.is_on_plane() {
            self.is_on_plane() && other.is_on_plane()
        } else {
            self.is_below() == other.is_below()
        }
    }
}

impl PlaneSideInfo {
    #[inline]
    pub(crate) fn from_determinant(s: f64) -> PlaneSideInfo {
        PlaneSideInfo { signed_side: s }
    }

    /// Returns `true` if the point lies strictly below the plane.
    pub fn is_below(&self) -> bool {
        self.signed_side > 0.0
    }

    /// Returns `true` if the point lies strictly above the plane.
    pub fn is_above(&self) -> bool {
        self.signed_side < 0.0
    }

    /// Returns `true` if the point lies exactly on the plane.
    #[inline]
    pub fn is_on_plane(&self) -> bool {
        self.signed_side.abs() == 0.0
    }

    /// Returns the opposite of this `PlaneSideInfo`.
    pub fn reversed(self) -> PlaneSideInfo {
        PlaneSideInfo {
            signed_side: -self.signed_side,
        }
    }
}
