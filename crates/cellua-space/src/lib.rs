//! Coordinate-space machinery for Cellua universes.
//!
//! A universe's geometry is described by one [`BoundaryPolicy`] per axis,
//! bundled into a [`Topology`] that maps any coordinate to its canonical
//! representative (or to nothing, for the dead border of a finite axis).
//! Rules declare a [`NeighborhoodShape`], which is compiled once per
//! dimension count into a [`CompiledShape`]: the ordered offset list,
//! its inverse, and the permutation tables of its [`SymmetryGroup`].
//!
//! Nothing here stores cells; the grid only ever sees coordinates that
//! have already been canonicalized by a topology.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod boundary;
pub mod error;
pub mod region;
pub mod shape;
pub mod symmetry;
pub mod topology;

#[cfg(test)]
pub(crate) mod compliance;

pub use boundary::BoundaryPolicy;
pub use error::SpaceError;
pub use region::Region;
pub use shape::{CompiledShape, Metric, NeighborhoodShape, ShapeLimits, MAX_RANGE};
pub use symmetry::{AxisMap, SymmetryGroup, MAX_GROUP_ORDER};
pub use topology::{Identification, Mirror, Topology};
