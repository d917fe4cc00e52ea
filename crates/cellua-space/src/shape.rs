//! Neighborhood shapes and their compiled offset tables.

use cellua_core::{CellState, Coord};

use crate::error::SpaceError;
use crate::symmetry::SymmetryGroup;

/// Hard upper bound on any neighborhood range.
pub const MAX_RANGE: u32 = 16;

/// Limits applied when compiling a [`NeighborhoodShape`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShapeLimits {
    /// Largest accepted range. Default: [`MAX_RANGE`].
    pub max_range: u32,
    /// Largest accepted number of offsets. Default: 4096.
    pub max_neighbors: usize,
}

impl Default for ShapeLimits {
    fn default() -> Self {
        Self {
            max_range: MAX_RANGE,
            max_neighbors: 4096,
        }
    }
}

/// Distance used to bound a neighborhood.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Max of per-axis distances (Moore neighborhoods).
    #[default]
    Chebyshev,
    /// Sum of per-axis distances (von Neumann neighborhoods).
    Manhattan,
}

impl Metric {
    /// Distance of `offset` from the origin.
    pub fn norm(&self, offset: &[i64]) -> u64 {
        let abs = offset.iter().map(|x| x.unsigned_abs());
        match self {
            Self::Chebyshev => abs.max().unwrap_or(0),
            Self::Manhattan => abs.fold(0u64, u64::saturating_add),
        }
    }

    /// Parse a metric name as used in rule scripts.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "moore" | "chebyshev" => Some(Self::Chebyshev),
            "vonneumann" | "von_neumann" | "manhattan" => Some(Self::Manhattan),
            _ => None,
        }
    }

    /// Short name, accepted by [`from_name`](Self::from_name).
    pub fn name(&self) -> &'static str {
        match self {
            Self::Chebyshev => "moore",
            Self::Manhattan => "vonneumann",
        }
    }
}

/// A rule's declared neighborhood.
///
/// Without a mask the shape is every offset within `range` under
/// `metric`, except the origin, and works in any dimension count. With a
/// mask only the listed offsets are used (the origin too, if listed), and
/// the mask fixes the dimension count.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NeighborhoodShape {
    /// Maximum distance of any offset.
    pub range: u32,
    /// How distance is measured.
    pub metric: Metric,
    /// Explicit offsets, each within `range`.
    pub mask: Option<Vec<Coord>>,
    /// Group used to canonicalize neighbor order.
    pub symmetry: SymmetryGroup,
}

impl NeighborhoodShape {
    /// Every offset within Chebyshev distance `range`.
    pub fn moore(range: u32) -> Self {
        Self {
            range,
            metric: Metric::Chebyshev,
            mask: None,
            symmetry: SymmetryGroup::None,
        }
    }

    /// Every offset within Manhattan distance `range`.
    pub fn von_neumann(range: u32) -> Self {
        Self {
            metric: Metric::Manhattan,
            ..Self::moore(range)
        }
    }

    /// Restrict to an explicit set of offsets.
    pub fn with_mask(mut self, mask: Vec<Coord>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Declare a symmetry group.
    pub fn with_symmetry(mut self, symmetry: SymmetryGroup) -> Self {
        self.symmetry = symmetry;
        self
    }

    /// Enumerate offsets and symmetry tables for a `dimensions`-axis universe.
    pub fn compile(
        &self,
        dimensions: usize,
        limits: &ShapeLimits,
    ) -> Result<CompiledShape, SpaceError> {
        if dimensions == 0 {
            return Err(SpaceError::ZeroDimensions);
        }
        let max_range = limits.max_range.min(MAX_RANGE);
        if self.range > max_range {
            return Err(SpaceError::RangeTooLarge {
                range: self.range,
                max: max_range,
            });
        }

        let offsets = match &self.mask {
            Some(mask) => self.masked_offsets(mask, dimensions, limits.max_neighbors)?,
            None => enumerate_ball(dimensions, self.range, self.metric, limits.max_neighbors)?,
        };

        let group = self.symmetry.elements(dimensions)?;
        let mut tables = Vec::new();
        if group.len() > 1 {
            for map in &group {
                let mut table = Vec::with_capacity(offsets.len());
                for offset in &offsets {
                    let image = map.apply(offset);
                    match offsets.binary_search(&image) {
                        Ok(idx) => table.push(idx),
                        Err(_) => {
                            return Err(SpaceError::SymmetryNotClosed {
                                offset: offset.clone(),
                                image,
                            })
                        }
                    }
                }
                tables.push(table);
            }
        }

        let mut inverse: Vec<Coord> = offsets
            .iter()
            .map(|o| o.iter().map(|&x| -x).collect())
            .collect();
        inverse.sort();

        Ok(CompiledShape {
            dimensions,
            range: self.range,
            metric: self.metric,
            symmetry: self.symmetry,
            offsets,
            inverse,
            tables,
        })
    }

    fn masked_offsets(
        &self,
        mask: &[Coord],
        dimensions: usize,
        max_neighbors: usize,
    ) -> Result<Vec<Coord>, SpaceError> {
        let mut offsets = Vec::with_capacity(mask.len());
        for offset in mask {
            if offset.len() != dimensions {
                return Err(SpaceError::DimensionMismatch {
                    expected: dimensions,
                    actual: offset.len(),
                });
            }
            if self.metric.norm(offset) > self.range as u64 {
                return Err(SpaceError::MaskOffsetOutOfRange {
                    offset: offset.clone(),
                    range: self.range,
                });
            }
            offsets.push(offset.clone());
        }
        offsets.sort();
        offsets.dedup();
        if offsets.len() > max_neighbors {
            return Err(SpaceError::TooManyNeighbors {
                count: offsets.len(),
                max: max_neighbors,
            });
        }
        Ok(offsets)
    }
}

/// Every non-origin offset within `range`, lexicographically ordered.
///
/// Stops as soon as the count passes `max`, so oversized shapes are
/// rejected without being enumerated.
fn enumerate_ball(
    dimensions: usize,
    range: u32,
    metric: Metric,
    max: usize,
) -> Result<Vec<Coord>, SpaceError> {
    fn walk(
        cur: &mut Coord,
        budget: u64,
        dimensions: usize,
        range: i64,
        metric: Metric,
        max: usize,
        out: &mut Vec<Coord>,
    ) -> Result<(), SpaceError> {
        if cur.len() == dimensions {
            if cur.iter().any(|&x| x != 0) {
                if out.len() == max {
                    return Err(SpaceError::TooManyNeighbors {
                        count: max + 1,
                        max,
                    });
                }
                out.push(cur.clone());
            }
            return Ok(());
        }
        for x in -range..=range {
            let remaining = match metric {
                Metric::Chebyshev => budget,
                Metric::Manhattan => match budget.checked_sub(x.unsigned_abs()) {
                    Some(r) => r,
                    None => continue,
                },
            };
            cur.push(x);
            walk(cur, remaining, dimensions, range, metric, max, out)?;
            cur.pop();
        }
        Ok(())
    }

    let mut out = Vec::new();
    let mut cur = Coord::with_capacity(dimensions);
    walk(
        &mut cur,
        range as u64,
        dimensions,
        range as i64,
        metric,
        max,
        &mut out,
    )?;
    Ok(out)
}

/// A neighborhood shape resolved for a fixed dimension count.
///
/// Neighbor sequences are always in [`offsets`](Self::offsets) order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledShape {
    dimensions: usize,
    range: u32,
    metric: Metric,
    symmetry: SymmetryGroup,
    offsets: Vec<Coord>,
    inverse: Vec<Coord>,
    /// `tables[g][j]` is the index of `g(offsets[j])`. Empty for the
    /// trivial group.
    tables: Vec<Vec<usize>>,
}

impl CompiledShape {
    /// Number of axes.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Declared range.
    pub fn range(&self) -> u32 {
        self.range
    }

    /// Declared metric.
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Declared symmetry group.
    pub fn symmetry(&self) -> SymmetryGroup {
        self.symmetry
    }

    /// Offsets in neighbor-sequence order.
    pub fn offsets(&self) -> &[Coord] {
        &self.offsets
    }

    /// Negated offsets: the cells whose neighborhoods contain the origin.
    pub fn inverse(&self) -> &[Coord] {
        &self.inverse
    }

    /// Number of neighbors.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the shape has no offsets at all.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Number of group elements canonicalized over.
    pub fn group_order(&self) -> usize {
        self.tables.len().max(1)
    }

    /// Reorder `states` (in offset order) to the lexicographically least
    /// orientation under the symmetry group.
    ///
    /// Two neighbor sequences related by a group element canonicalize to
    /// the same sequence.
    pub fn canonicalize(&self, states: &mut [CellState]) {
        if self.tables.len() <= 1 {
            return;
        }
        debug_assert_eq!(states.len(), self.offsets.len());
        let original = states.to_vec();
        let mut candidate = Vec::with_capacity(original.len());
        for table in &self.tables[1..] {
            candidate.clear();
            candidate.extend(table.iter().map(|&i| original[i]));
            if candidate.as_slice() < &*states {
                states.copy_from_slice(&candidate);
            }
        }
    }

    /// Offsets from a live cell to every cell that may see it, excluding
    /// the origin.
    ///
    /// This is the inverse shape, closed under sign flips of
    /// `flipped_axes` so that neighborhoods reaching across a
    /// non-orientable seam are still found.
    pub fn candidate_envelope(&self, flipped_axes: &[usize]) -> Vec<Coord> {
        let mut envelope = self.inverse.clone();
        for &axis in flipped_axes {
            let mirrored: Vec<Coord> = envelope
                .iter()
                .filter(|o| o[axis] != 0)
                .map(|o| {
                    let mut m = o.clone();
                    m[axis] = -m[axis];
                    m
                })
                .collect();
            envelope.extend(mirrored);
        }
        envelope.retain(|o| o.iter().any(|&x| x != 0));
        envelope.sort();
        envelope.dedup();
        envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn compile(shape: &NeighborhoodShape, dims: usize) -> CompiledShape {
        shape.compile(dims, &ShapeLimits::default()).unwrap()
    }

    #[test]
    fn moore_counts() {
        assert_eq!(compile(&NeighborhoodShape::moore(1), 1).len(), 2);
        assert_eq!(compile(&NeighborhoodShape::moore(1), 2).len(), 8);
        assert_eq!(compile(&NeighborhoodShape::moore(1), 3).len(), 26);
        assert_eq!(compile(&NeighborhoodShape::moore(2), 2).len(), 24);
        assert_eq!(compile(&NeighborhoodShape::moore(1), 5).len(), 242);
    }

    #[test]
    fn von_neumann_counts() {
        assert_eq!(compile(&NeighborhoodShape::von_neumann(1), 2).len(), 4);
        assert_eq!(compile(&NeighborhoodShape::von_neumann(2), 2).len(), 12);
        assert_eq!(compile(&NeighborhoodShape::von_neumann(1), 4).len(), 8);
    }

    #[test]
    fn offsets_are_lexicographic_without_origin() {
        let shape = compile(&NeighborhoodShape::moore(1), 2);
        let offsets: Vec<Vec<i64>> = shape.offsets().iter().map(|o| o.to_vec()).collect();
        assert_eq!(
            offsets,
            vec![
                vec![-1, -1],
                vec![-1, 0],
                vec![-1, 1],
                vec![0, -1],
                vec![0, 1],
                vec![1, -1],
                vec![1, 0],
                vec![1, 1],
            ]
        );
    }

    #[test]
    fn range_limits_enforced() {
        let err = NeighborhoodShape::moore(17)
            .compile(1, &ShapeLimits::default())
            .unwrap_err();
        assert_eq!(err, SpaceError::RangeTooLarge { range: 17, max: 16 });

        let tight = ShapeLimits {
            max_range: 2,
            ..ShapeLimits::default()
        };
        assert!(NeighborhoodShape::moore(3).compile(1, &tight).is_err());
    }

    #[test]
    fn oversized_neighborhood_rejected_early() {
        // 33^8 offsets would never finish enumerating.
        let err = NeighborhoodShape::moore(16)
            .compile(8, &ShapeLimits::default())
            .unwrap_err();
        assert!(matches!(err, SpaceError::TooManyNeighbors { max: 4096, .. }));
    }

    #[test]
    fn mask_may_include_origin_and_must_stay_in_range() {
        let mask: Vec<Coord> = vec![smallvec![1, 0], smallvec![0, 0], smallvec![-1, 0]];
        let shape = compile(&NeighborhoodShape::moore(1).with_mask(mask), 2);
        let offsets: Vec<Vec<i64>> = shape.offsets().iter().map(|o| o.to_vec()).collect();
        assert_eq!(offsets, vec![vec![-1, 0], vec![0, 0], vec![1, 0]]);

        let far: Vec<Coord> = vec![smallvec![2, 0]];
        assert!(matches!(
            NeighborhoodShape::moore(1)
                .with_mask(far)
                .compile(2, &ShapeLimits::default()),
            Err(SpaceError::MaskOffsetOutOfRange { .. })
        ));
    }

    #[test]
    fn asymmetric_mask_fails_closure() {
        let mask: Vec<Coord> = vec![smallvec![1, 0], smallvec![0, 1]];
        let err = NeighborhoodShape::moore(1)
            .with_mask(mask)
            .with_symmetry(SymmetryGroup::Reflections)
            .compile(2, &ShapeLimits::default())
            .unwrap_err();
        assert!(matches!(err, SpaceError::SymmetryNotClosed { .. }));
    }

    #[test]
    fn canonical_order_is_invariant_under_the_group() {
        let shape = compile(
            &NeighborhoodShape::moore(1).with_symmetry(SymmetryGroup::Full),
            2,
        );
        assert_eq!(shape.group_order(), 8);
        // A glider-like pattern and its transpose + horizontal mirror.
        let mut a: Vec<CellState> = vec![0, 1, 0, 0, 1, 1, 1, 0];
        let mut b = vec![0; 8];
        let group = SymmetryGroup::Full.elements(2).unwrap();
        let map = &group[5];
        for (j, offset) in shape.offsets().iter().enumerate() {
            let idx = shape
                .offsets()
                .binary_search(&map.apply(offset))
                .unwrap();
            b[idx] = a[j];
        }
        shape.canonicalize(&mut a);
        shape.canonicalize(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn envelope_closes_over_flipped_axes() {
        let mask: Vec<Coord> = vec![smallvec![1, 1]];
        let shape = compile(&NeighborhoodShape::moore(1).with_mask(mask), 2);
        let plain: Vec<Vec<i64>> = shape.candidate_envelope(&[]).iter().map(|o| o.to_vec()).collect();
        assert_eq!(plain, vec![vec![-1, -1]]);
        let flipped: Vec<Vec<i64>> = shape
            .candidate_envelope(&[1])
            .iter()
            .map(|o| o.to_vec())
            .collect();
        assert_eq!(flipped, vec![vec![-1, -1], vec![-1, 1]]);
    }
}
