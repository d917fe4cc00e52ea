//! Topology compliance helpers shared by the test modules.

use cellua_core::Coord;

use crate::shape::CompiledShape;
use crate::topology::Topology;

/// Assert that every cell of a bounded topology is its own canonical form.
pub fn assert_canonical_forms_fixed(topology: &Topology) {
    let extent = topology
        .bounding_extent()
        .expect("compliance checks need a bounded topology");
    for cell in extent.iter() {
        assert_eq!(
            topology.canonicalize(&cell).as_ref(),
            Some(&cell),
            "{cell:?} is not fixed by canonicalization"
        );
    }
}

/// Assert that whenever `c` is a neighbor of `n`, stepping from `c` through
/// the candidate envelope reaches `n`.
///
/// This is what lets the stepper find every cell whose neighborhood can
/// see a live cell, including across non-orientable seams.
pub fn assert_envelope_covers_neighbors(topology: &Topology, shape: &CompiledShape) {
    let extent = topology
        .bounding_extent()
        .expect("compliance checks need a bounded topology");
    let envelope = shape.candidate_envelope(&topology.flipped_axes());
    for n in extent.iter() {
        for offset in shape.offsets() {
            let Some(c) = topology.canonicalize_offset(&n, offset) else {
                continue;
            };
            if c == n {
                continue;
            }
            let reached = envelope
                .iter()
                .filter_map(|w| topology.canonicalize_offset(&c, w))
                .any(|m: Coord| m == n);
            assert!(
                reached,
                "{n:?} sees {c:?} via {offset:?}, but the envelope from {c:?} misses it"
            );
        }
    }
}
