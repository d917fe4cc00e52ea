//! Order-independent hashing of universe contents.
//!
//! Uses FNV-1a over the live cells in ascending coordinate order, so two
//! snapshots with the same cells hash equally whatever their insertion
//! history. Not cryptographically secure.

use cellua_core::{CellReader, SnapshotAccess};
use cellua_engine::Universe;

/// FNV-1a offset basis for 64-bit.
const FNV_OFFSET: u64 = 0xcbf29ce484222325;
/// FNV-1a prime for 64-bit.
const FNV_PRIME: u64 = 0x00000100000001B3;

#[inline]
fn fnv1a_u64(mut hash: u64, v: u64) -> u64 {
    for &b in &v.to_le_bytes() {
        hash = (hash ^ b as u64).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Hash the dimension count and every live cell of `snapshot`.
///
/// The generation number is not included.
pub fn snapshot_hash(snapshot: &dyn SnapshotAccess) -> u64 {
    let mut cells: Vec<_> = snapshot.iter_nonzero().collect();
    cells.sort_unstable_by(|a, b| a.0.cmp(b.0));

    let mut hash = fnv1a_u64(FNV_OFFSET, snapshot.dimensions() as u64);
    for (coord, state) in cells {
        for &v in coord.iter() {
            hash = fnv1a_u64(hash, v as u64);
        }
        hash = fnv1a_u64(hash, state);
    }
    hash
}

/// [`snapshot_hash`] of the universe's current generation.
pub fn universe_hash(universe: &Universe) -> u64 {
    snapshot_hash(universe.snapshot().as_ref())
}
