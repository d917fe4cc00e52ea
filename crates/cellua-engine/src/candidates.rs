//! The set of cells whose state may change in the next generation.
//!
//! Only non-quiescent cells and cells that hold a non-quiescent cell in
//! their neighborhood can change; everything else is quiescent with an
//! all-quiescent neighborhood and stays that way. The resolver's envelope
//! is the set of offsets from a live cell to every such observer,
//! including the sign flips needed on non-orientable topologies.

use cellua_core::Coord;
use cellua_grid::GridStore;
use cellua_rule::NeighborhoodResolver;
use indexmap::IndexSet;

/// Collect the candidates for `grid`, deduplicated.
///
/// Order is deterministic for a given grid: live cells first, in grid
/// order, then newly reached cells in discovery order.
pub(crate) fn collect(grid: &GridStore, resolver: &NeighborhoodResolver) -> Vec<Coord> {
    let envelope = resolver.envelope();
    let topology = resolver.topology();
    let hint = grid.population().saturating_mul(envelope.len() / 2 + 1);
    let mut set: IndexSet<Coord> = IndexSet::with_capacity(hint.min(1 << 20));
    for (coord, _) in grid.iter_nonzero() {
        set.insert(coord.clone());
    }
    for (coord, _) in grid.iter_nonzero() {
        for offset in envelope {
            if let Some(reached) = topology.canonicalize_offset(coord, offset) {
                set.insert(reached);
            }
        }
    }
    set.into_iter().collect()
}
