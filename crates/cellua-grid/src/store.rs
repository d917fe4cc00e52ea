//! Sparse coordinate-to-state map.

use cellua_core::{CellReader, CellState, Coord, QUIESCENT};
use cellua_space::Region;
use indexmap::IndexMap;

/// Sparse map from canonical coordinates to non-quiescent states.
///
/// Absent coordinates read as [`QUIESCENT`]; writing `QUIESCENT` removes
/// the entry. Coordinates must already be canonical for the universe's
/// topology and have [`dimensions`](Self::dimensions) axes; the store does
/// no wrapping of its own.
///
/// Iteration order is unspecified but stable while the store is not
/// mutated.
///
/// # Examples
///
/// ```
/// use cellua_core::CellReader;
/// use cellua_grid::GridStore;
///
/// let mut grid = GridStore::new(2);
/// grid.set([1, 2].as_slice().into(), 7);
/// assert_eq!(grid.get(&[1, 2]), 7);
/// assert_eq!(grid.get(&[0, 0]), 0);
/// grid.set([1, 2].as_slice().into(), 0);
/// assert_eq!(grid.population(), 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridStore {
    dimensions: usize,
    cells: IndexMap<Coord, CellState>,
}

impl GridStore {
    /// An empty store for `dimensions`-axis coordinates.
    pub fn new(dimensions: usize) -> Self {
        Self::with_capacity(dimensions, 0)
    }

    /// An empty store with room for `capacity` live cells.
    pub fn with_capacity(dimensions: usize, capacity: usize) -> Self {
        Self {
            dimensions,
            cells: IndexMap::with_capacity(capacity),
        }
    }

    /// Write `state` at `coord`, returning the previous state.
    pub fn set(&mut self, coord: Coord, state: CellState) -> CellState {
        debug_assert_eq!(coord.len(), self.dimensions);
        if state == QUIESCENT {
            self.cells.swap_remove(&coord).unwrap_or(QUIESCENT)
        } else {
            self.cells.insert(coord, state).unwrap_or(QUIESCENT)
        }
    }

    /// Number of non-quiescent cells.
    pub fn population(&self) -> usize {
        self.cells.len()
    }

    /// Whether every cell is quiescent.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over every non-quiescent cell.
    pub fn iter_nonzero(&self) -> impl Iterator<Item = (&Coord, CellState)> + '_ {
        self.cells.iter().map(|(c, &s)| (c, s))
    }

    /// Live cells sorted by coordinate.
    pub fn sorted_cells(&self) -> Vec<(Coord, CellState)> {
        let mut cells: Vec<_> = self.cells.iter().map(|(c, &s)| (c.clone(), s)).collect();
        cells.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        cells
    }

    /// Smallest region holding every live cell, or `None` when empty.
    pub fn bounding_region(&self) -> Option<Region> {
        Region::bounding(self.cells.keys().map(|c| c.as_slice()))
    }

    /// Keep only the cells for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Coord, CellState) -> bool) {
        self.cells.retain(|c, s| keep(c, *s));
    }

    /// Remove every cell.
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

impl CellReader for GridStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn get(&self, coord: &[i64]) -> CellState {
        self.cells.get(coord).copied().unwrap_or(QUIESCENT)
    }
}
