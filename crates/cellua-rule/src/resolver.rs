//! Neighbor lookup through a universe's topology.

use cellua_core::{CellReader, CellState, Coord, QUIESCENT};
use cellua_space::{CompiledShape, NeighborhoodShape, ShapeLimits, SpaceError, Topology};

/// Reads the ordered neighbor states of a cell.
///
/// Every offset is pushed through the topology before the grid is read,
/// so wrapping, reflection and dead borders are handled here and never
/// by the grid. When the shape declares a symmetry group the sequence is
/// reordered to its canonical orientation.
///
/// # Examples
///
/// ```
/// use cellua_core::CellReader;
/// use cellua_grid::GridStore;
/// use cellua_rule::NeighborhoodResolver;
/// use cellua_space::{BoundaryPolicy, NeighborhoodShape, ShapeLimits, Topology};
///
/// let ring = Topology::new(vec![BoundaryPolicy::looped(0, 4)]).unwrap();
/// let resolver =
///     NeighborhoodResolver::new(ring, &NeighborhoodShape::moore(1), &ShapeLimits::default())
///         .unwrap();
///
/// let mut grid = GridStore::new(1);
/// grid.set([4].as_slice().into(), 9);
/// // Cell 0's left neighbor is cell 4 on a 5-cell ring.
/// assert_eq!(resolver.resolve(&[0], &grid), vec![9, 0]);
/// ```
#[derive(Clone, Debug)]
pub struct NeighborhoodResolver {
    topology: Topology,
    shape: CompiledShape,
    envelope: Vec<Coord>,
}

impl NeighborhoodResolver {
    /// Compile `shape` for `topology`.
    ///
    /// Fails if the shape exceeds `limits`, does not match the topology's
    /// dimension count, or is not closed under its symmetry group.
    pub fn new(
        topology: Topology,
        shape: &NeighborhoodShape,
        limits: &ShapeLimits,
    ) -> Result<Self, SpaceError> {
        let shape = shape.compile(topology.dimensions(), limits)?;
        let envelope = shape.candidate_envelope(&topology.flipped_axes());
        Ok(Self {
            topology,
            shape,
            envelope,
        })
    }

    /// The topology neighbors are resolved through.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The compiled shape.
    pub fn shape(&self) -> &CompiledShape {
        &self.shape
    }

    /// Offsets from a live cell to every cell whose neighborhood may
    /// contain it.
    pub fn envelope(&self) -> &[Coord] {
        &self.envelope
    }

    /// Fill `out` with the neighbor states of `coord`.
    ///
    /// Returns `true` when every neighbor is quiescent; the sequence is
    /// then left in offset order, since canonicalizing all zeros is a
    /// no-op.
    pub fn resolve_into<R>(&self, coord: &[i64], reader: &R, out: &mut Vec<CellState>) -> bool
    where
        R: CellReader + ?Sized,
    {
        out.clear();
        let mut quiescent = true;
        for offset in self.shape.offsets() {
            let state = match self.topology.canonicalize_offset(coord, offset) {
                Some(neighbor) => reader.get(&neighbor),
                None => QUIESCENT,
            };
            quiescent &= state == QUIESCENT;
            out.push(state);
        }
        if !quiescent {
            self.shape.canonicalize(out);
        }
        quiescent
    }

    /// The neighbor states of `coord` as a fresh vector.
    pub fn resolve<R>(&self, coord: &[i64], reader: &R) -> Vec<CellState>
    where
        R: CellReader + ?Sized,
    {
        let mut out = Vec::with_capacity(self.shape.len());
        self.resolve_into(coord, reader, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellua_grid::GridStore;
    use cellua_space::{BoundaryPolicy, SymmetryGroup};
    use smallvec::smallvec;

    fn resolver(policies: Vec<BoundaryPolicy>, shape: NeighborhoodShape) -> NeighborhoodResolver {
        NeighborhoodResolver::new(
            Topology::new(policies).unwrap(),
            &shape,
            &ShapeLimits::default(),
        )
        .unwrap()
    }

    #[test]
    fn dead_border_reads_quiescent() {
        let r = resolver(
            vec![BoundaryPolicy::Finite { lo: 0, hi: 2 }],
            NeighborhoodShape::moore(1),
        );
        let mut grid = GridStore::new(1);
        grid.set(smallvec![1], 3);
        let mut out = Vec::new();
        assert!(!r.resolve_into(&[0], &grid, &mut out));
        assert_eq!(out, vec![0, 3]);
        assert!(r.resolve_into(&[2], &GridStore::new(1), &mut out));
        assert_eq!(out, vec![0, 0]);
    }

    #[test]
    fn mobius_neighbors_cross_the_seam_mirrored() {
        let r = resolver(
            vec![
                BoundaryPolicy::looped_reflecting(0, 3, 1),
                BoundaryPolicy::Finite { lo: 0, hi: 2 },
            ],
            NeighborhoodShape::von_neumann(1),
        );
        let mut grid = GridStore::new(2);
        // (0, 0) is the far side of the seam from (3, 2).
        grid.set(smallvec![0, 0], 7);
        let nbrs = r.resolve(&[3, 2], &grid);
        // Offsets: (-1,0) (0,-1) (0,1) (1,0); (1,0) crosses the seam.
        assert_eq!(nbrs, vec![0, 0, 0, 7]);
    }

    #[test]
    fn symmetric_shapes_see_canonical_orientation() {
        let r = resolver(
            vec![BoundaryPolicy::Infinite, BoundaryPolicy::Infinite],
            NeighborhoodShape::von_neumann(1).with_symmetry(SymmetryGroup::Rotations),
        );
        let mut north = GridStore::new(2);
        north.set(smallvec![0, 1], 1);
        let mut east = GridStore::new(2);
        east.set(smallvec![1, 0], 1);
        assert_eq!(r.resolve(&[0, 0], &north), r.resolve(&[0, 0], &east));
    }

    #[test]
    fn mismatched_mask_dimensions_rejected() {
        let mask = vec![smallvec![1, 0, 0]];
        let err = NeighborhoodResolver::new(
            Topology::infinite(2).unwrap(),
            &NeighborhoodShape::moore(1).with_mask(mask),
            &ShapeLimits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SpaceError::DimensionMismatch { .. }));
    }
}
