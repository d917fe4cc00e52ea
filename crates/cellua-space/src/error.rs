//! Error types for topology and neighborhood construction.

use cellua_core::Coord;
use std::fmt;

/// Errors arising from boundary, shape or region construction.
///
/// All of these are configuration problems: they are raised when a
/// universe or rule is set up, never while stepping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpaceError {
    /// A universe needs at least one axis.
    ZeroDimensions,
    /// A boundary policy is malformed.
    InvalidBoundary {
        /// Axis the policy was given for.
        axis: usize,
        /// What went wrong.
        reason: String,
    },
    /// A coordinate, offset or policy list has the wrong number of axes.
    DimensionMismatch {
        /// Number of axes expected.
        expected: usize,
        /// Number of axes supplied.
        actual: usize,
    },
    /// A neighborhood range exceeds the configured maximum.
    RangeTooLarge {
        /// Requested range.
        range: u32,
        /// Configured maximum.
        max: u32,
    },
    /// A neighborhood enumerates more offsets than the configured maximum.
    TooManyNeighbors {
        /// Lower bound on the number of offsets (enumeration stops early).
        count: usize,
        /// Configured maximum.
        max: usize,
    },
    /// A mask offset lies outside the shape's declared range.
    MaskOffsetOutOfRange {
        /// The offending offset.
        offset: Coord,
        /// The declared range.
        range: u32,
    },
    /// A symmetry group maps a neighborhood offset outside the neighborhood.
    SymmetryNotClosed {
        /// Offset whose image is missing.
        offset: Coord,
        /// The missing image.
        image: Coord,
    },
    /// A symmetry group has too many elements for this dimension count.
    GroupTooLarge {
        /// Number of dimensions.
        dimensions: usize,
        /// Maximum supported group order.
        max_order: usize,
    },
    /// A coordinate lies in the dead border of a finite axis.
    CoordOutOfBounds {
        /// The offending coordinate.
        coord: Coord,
        /// First axis found out of range.
        axis: usize,
    },
    /// A region has invalid bounds.
    InvalidRegion {
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for SpaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimensions => write!(f, "a universe needs at least one dimension"),
            Self::InvalidBoundary { axis, reason } => {
                write!(f, "invalid boundary on axis {axis}: {reason}")
            }
            Self::DimensionMismatch { expected, actual } => {
                write!(f, "expected {expected} axes, got {actual}")
            }
            Self::RangeTooLarge { range, max } => {
                write!(f, "neighborhood range {range} exceeds maximum {max}")
            }
            Self::TooManyNeighbors { count, max } => {
                write!(f, "neighborhood has at least {count} offsets, maximum is {max}")
            }
            Self::MaskOffsetOutOfRange { offset, range } => {
                write!(
                    f,
                    "mask offset {:?} lies outside range {range}",
                    offset.as_slice()
                )
            }
            Self::SymmetryNotClosed { offset, image } => {
                write!(
                    f,
                    "symmetry maps offset {:?} to {:?}, which is not in the neighborhood",
                    offset.as_slice(),
                    image.as_slice()
                )
            }
            Self::GroupTooLarge {
                dimensions,
                max_order,
            } => {
                write!(
                    f,
                    "symmetry group in {dimensions} dimensions exceeds {max_order} elements"
                )
            }
            Self::CoordOutOfBounds { coord, axis } => {
                write!(
                    f,
                    "coordinate {:?} is outside the finite range of axis {axis}",
                    coord.as_slice()
                )
            }
            Self::InvalidRegion { reason } => write!(f, "invalid region: {reason}"),
        }
    }
}

impl std::error::Error for SpaceError {}
