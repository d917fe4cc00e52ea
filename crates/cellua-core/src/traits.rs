//! Core abstraction traits for reading cell state.

use crate::id::{Coord, Generation};
use crate::state::CellState;

/// Read-only access to cell states.
///
/// Implemented by the grid store and its snapshots. Coordinates are
/// expected to be canonical (already wrapped by the topology); absent
/// cells read as [`QUIESCENT`](crate::QUIESCENT).
pub trait CellReader {
    /// Number of dimensions every coordinate must have.
    fn dimensions(&self) -> usize;

    /// State of the cell at `coord`. Never fails.
    fn get(&self, coord: &[i64]) -> CellState;
}

/// Read-only access to a committed generation.
///
/// This trait decouples external readers (renderers, editors, persistence)
/// from the grid implementation.
pub trait SnapshotAccess: CellReader {
    /// The generation this snapshot belongs to.
    fn generation(&self) -> Generation;

    /// Number of non-quiescent cells.
    fn population(&self) -> usize;

    /// Iterate over every non-quiescent cell.
    ///
    /// The order is unspecified but stable for a given snapshot, and the
    /// iterator can be restarted by calling this method again.
    fn iter_nonzero(&self) -> Box<dyn Iterator<Item = (&Coord, CellState)> + '_>;
}
