//! Immutable per-generation views of the grid.

use std::sync::Arc;

use cellua_core::{CellReader, CellState, Coord, Generation, SnapshotAccess};

use crate::store::GridStore;

/// A snapshot shared between the universe, the stepper and external readers.
pub type SharedSnapshot = Arc<GenerationSnapshot>;

/// The grid contents at one generation boundary.
///
/// Never mutated while shared. The stepper evaluates every candidate of a
/// step against the same snapshot, and readers holding an older
/// `Arc<GenerationSnapshot>` keep seeing the pre-step state after a commit.
/// Direct edits go through [`grid_mut`](Self::grid_mut) on a uniquely
/// owned copy (`Arc::make_mut`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationSnapshot {
    generation: Generation,
    grid: GridStore,
}

impl GenerationSnapshot {
    /// Freeze `grid` as the contents of `generation`.
    pub fn new(generation: Generation, grid: GridStore) -> Self {
        Self { generation, grid }
    }

    /// An empty generation-0 snapshot.
    pub fn empty(dimensions: usize) -> Self {
        Self::new(Generation::default(), GridStore::new(dimensions))
    }

    /// The underlying store.
    pub fn grid(&self) -> &GridStore {
        &self.grid
    }

    /// Mutable access to the store, for direct edits.
    pub fn grid_mut(&mut self) -> &mut GridStore {
        &mut self.grid
    }

    /// Unfreeze into a mutable store.
    pub fn into_grid(self) -> GridStore {
        self.grid
    }
}

impl CellReader for GenerationSnapshot {
    fn dimensions(&self) -> usize {
        self.grid.dimensions()
    }

    fn get(&self, coord: &[i64]) -> CellState {
        self.grid.get(coord)
    }
}

impl SnapshotAccess for GenerationSnapshot {
    fn generation(&self) -> Generation {
        self.generation
    }

    fn population(&self) -> usize {
        self.grid.population()
    }

    fn iter_nonzero(&self) -> Box<dyn Iterator<Item = (&Coord, CellState)> + '_> {
        Box::new(self.grid.iter_nonzero())
    }
}
