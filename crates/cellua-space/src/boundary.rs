//! Per-axis boundary policies.

use crate::error::SpaceError;

/// How one axis of a universe treats coordinates.
///
/// # Examples
///
/// ```
/// use cellua_space::BoundaryPolicy;
///
/// let ring = BoundaryPolicy::looped(0, 9);
/// assert_eq!(ring.period(), Some(10));
/// assert_eq!(BoundaryPolicy::Infinite.bounds(), None);
/// assert_eq!(BoundaryPolicy::Finite { lo: -2, hi: 2 }.bounds(), Some((-2, 2)));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BoundaryPolicy {
    /// Unrestricted coordinates.
    #[default]
    Infinite,
    /// Coordinates restricted to `lo..=hi`. Everything outside is a
    /// permanently quiescent dead border.
    Finite {
        /// Lowest valid coordinate (inclusive).
        lo: i64,
        /// Highest valid coordinate (inclusive).
        hi: i64,
    },
    /// Coordinates wrap modulo `hi - lo + 1`.
    ///
    /// With `reflect: Some(axis)`, every odd number of wraps also mirrors
    /// the named axis, giving a non-orientable identification (a Möbius
    /// strip or Klein bottle).
    Loop {
        /// Lowest canonical coordinate (inclusive).
        lo: i64,
        /// Highest canonical coordinate (inclusive).
        hi: i64,
        /// Axis mirrored on each odd wrap, if any.
        reflect: Option<usize>,
    },
}

impl BoundaryPolicy {
    /// A plain loop over `lo..=hi`.
    pub fn looped(lo: i64, hi: i64) -> Self {
        Self::Loop {
            lo,
            hi,
            reflect: None,
        }
    }

    /// A loop over `lo..=hi` that mirrors `axis` on every odd wrap.
    pub fn looped_reflecting(lo: i64, hi: i64, axis: usize) -> Self {
        Self::Loop {
            lo,
            hi,
            reflect: Some(axis),
        }
    }

    /// Inclusive bounds, or `None` for an infinite axis.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match *self {
            Self::Infinite => None,
            Self::Finite { lo, hi } | Self::Loop { lo, hi, .. } => Some((lo, hi)),
        }
    }

    /// Whether this axis has a bounded coordinate range.
    pub fn is_bounded(&self) -> bool {
        self.bounds().is_some()
    }

    /// Loop period (`hi - lo + 1`), or `None` for non-looping axes.
    ///
    /// Returned as `i128` since a loop spanning the whole `i64` range has
    /// a period of `2^64`.
    pub fn period(&self) -> Option<i128> {
        match *self {
            Self::Loop { lo, hi, .. } => Some(hi as i128 - lo as i128 + 1),
            _ => None,
        }
    }

    /// The axis this policy mirrors on odd wraps.
    pub fn reflect_axis(&self) -> Option<usize> {
        match *self {
            Self::Loop { reflect, .. } => reflect,
            _ => None,
        }
    }

    /// Whether `value` is a canonical coordinate on this axis.
    pub fn contains(&self, value: i64) -> bool {
        match self.bounds() {
            None => true,
            Some((lo, hi)) => (lo..=hi).contains(&value),
        }
    }

    /// Check this policy in isolation, as axis `axis` of a `dimensions`-axis
    /// universe. Cross-axis constraints are checked by
    /// [`Topology::new`](crate::Topology::new).
    pub fn validate(&self, axis: usize, dimensions: usize) -> Result<(), SpaceError> {
        if let Some((lo, hi)) = self.bounds() {
            if lo > hi {
                return Err(SpaceError::InvalidBoundary {
                    axis,
                    reason: format!("lower bound {lo} exceeds upper bound {hi}"),
                });
            }
        }
        if let Some(target) = self.reflect_axis() {
            if target >= dimensions {
                return Err(SpaceError::InvalidBoundary {
                    axis,
                    reason: format!(
                        "reflected axis {target} does not exist in a {dimensions}-dimensional universe"
                    ),
                });
            }
            if target == axis {
                return Err(SpaceError::InvalidBoundary {
                    axis,
                    reason: "an axis cannot reflect itself".into(),
                });
            }
        }
        Ok(())
    }
}
