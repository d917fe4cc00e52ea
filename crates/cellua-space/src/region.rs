//! Axis-aligned rectangular regions.

use cellua_core::Coord;
use smallvec::SmallVec;

use crate::error::SpaceError;

/// An axis-aligned box of cells, inclusive on both corners.
///
/// Used for bounding extents, editor selections and region iteration.
///
/// # Examples
///
/// ```
/// use cellua_space::Region;
///
/// let r = Region::new(&[0, 0], &[2, 1]).unwrap();
/// assert_eq!(r.cell_count(), Some(6));
/// assert!(r.contains(&[2, 1]));
/// assert!(!r.contains(&[3, 1]));
/// let first: Vec<i64> = r.iter().next().unwrap().to_vec();
/// assert_eq!(first, vec![0, 0]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Region {
    lo: Coord,
    hi: Coord,
}

impl Region {
    /// Create a region spanning `lo..=hi` on every axis.
    pub fn new(lo: &[i64], hi: &[i64]) -> Result<Self, SpaceError> {
        if lo.len() != hi.len() {
            return Err(SpaceError::DimensionMismatch {
                expected: lo.len(),
                actual: hi.len(),
            });
        }
        if lo.is_empty() {
            return Err(SpaceError::ZeroDimensions);
        }
        if let Some(axis) = (0..lo.len()).find(|&i| lo[i] > hi[i]) {
            return Err(SpaceError::InvalidRegion {
                reason: format!(
                    "axis {axis}: lower corner {} above upper corner {}",
                    lo[axis], hi[axis]
                ),
            });
        }
        Ok(Self {
            lo: lo.into(),
            hi: hi.into(),
        })
    }

    /// Smallest region containing every point, or `None` if there are none.
    ///
    /// Points with a different axis count than the first are ignored.
    pub fn bounding<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a [i64]>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut lo: Coord = first.into();
        let mut hi: Coord = first.into();
        let dims = first.len();
        for p in iter.filter(|p| p.len() == dims) {
            for (axis, &v) in p.iter().enumerate() {
                lo[axis] = lo[axis].min(v);
                hi[axis] = hi[axis].max(v);
            }
        }
        Some(Self { lo, hi })
    }

    /// Number of axes.
    pub fn dimensions(&self) -> usize {
        self.lo.len()
    }

    /// Lower corner (inclusive).
    pub fn lo(&self) -> &[i64] {
        &self.lo
    }

    /// Upper corner (inclusive).
    pub fn hi(&self) -> &[i64] {
        &self.hi
    }

    /// Extent along each axis, or `None` if an axis spans more than `u64`.
    pub fn extents(&self) -> Option<SmallVec<[u64; 4]>> {
        self.lo
            .iter()
            .zip(&self.hi)
            .map(|(&lo, &hi)| u64::try_from(hi as i128 - lo as i128 + 1).ok())
            .collect()
    }

    /// Total number of cells, or `None` if it does not fit in a `u128`.
    pub fn cell_count(&self) -> Option<u128> {
        let extents = self.extents()?;
        extents
            .iter()
            .try_fold(1u128, |acc, &e| acc.checked_mul(e as u128))
    }

    /// Whether `coord` lies inside this region.
    pub fn contains(&self, coord: &[i64]) -> bool {
        coord.len() == self.lo.len()
            && coord
                .iter()
                .zip(self.lo.iter().zip(&self.hi))
                .all(|(&c, (&lo, &hi))| lo <= c && c <= hi)
    }

    /// Overlap of two regions, or `None` if they are disjoint.
    pub fn intersect(&self, other: &Region) -> Option<Region> {
        if self.dimensions() != other.dimensions() {
            return None;
        }
        let mut lo = self.lo.clone();
        let mut hi = self.hi.clone();
        for axis in 0..lo.len() {
            lo[axis] = lo[axis].max(other.lo[axis]);
            hi[axis] = hi[axis].min(other.hi[axis]);
            if lo[axis] > hi[axis] {
                return None;
            }
        }
        Some(Region { lo, hi })
    }

    /// Smallest region containing both.
    pub fn union_bounds(&self, other: &Region) -> Result<Region, SpaceError> {
        if self.dimensions() != other.dimensions() {
            return Err(SpaceError::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        let lo = self.lo.iter().zip(&other.lo).map(|(a, b)| *a.min(b)).collect();
        let hi = self.hi.iter().zip(&other.hi).map(|(a, b)| *a.max(b)).collect();
        Ok(Region { lo, hi })
    }

    /// This region shifted by `offset`, or `None` on overflow or arity mismatch.
    pub fn translate(&self, offset: &[i64]) -> Option<Region> {
        if offset.len() != self.dimensions() {
            return None;
        }
        let shift = |corner: &Coord| -> Option<Coord> {
            corner
                .iter()
                .zip(offset)
                .map(|(&c, &d)| c.checked_add(d))
                .collect()
        };
        Some(Region {
            lo: shift(&self.lo)?,
            hi: shift(&self.hi)?,
        })
    }

    /// This region mirrored through the origin along each axis in `axes`
    /// (every axis when `axes` is empty).
    ///
    /// A cell `c` lies in the mirrored region exactly when the cell with the
    /// listed coordinates negated lies in `self`, so mirroring a
    /// neighborhood box gives the cells whose neighborhood reaches a given
    /// cell. `None` if an axis is out of range or a corner is `i64::MIN`.
    pub fn invert(&self, axes: &[usize]) -> Option<Region> {
        if axes.iter().any(|&axis| axis >= self.dimensions()) {
            return None;
        }
        let mut lo = self.lo.clone();
        let mut hi = self.hi.clone();
        for axis in 0..self.dimensions() {
            if axes.is_empty() || axes.contains(&axis) {
                lo[axis] = self.hi[axis].checked_neg()?;
                hi[axis] = self.lo[axis].checked_neg()?;
            }
        }
        Some(Region { lo, hi })
    }

    /// Iterate every cell in lexicographic order (last axis fastest).
    pub fn iter(&self) -> RegionIter<'_> {
        RegionIter {
            region: self,
            next: Some(self.lo.clone()),
        }
    }
}

/// Lexicographic iterator over the cells of a [`Region`].
#[derive(Clone, Debug)]
pub struct RegionIter<'a> {
    region: &'a Region,
    next: Option<Coord>,
}

impl Iterator for RegionIter<'_> {
    type Item = Coord;

    fn next(&mut self) -> Option<Coord> {
        let current = self.next.take()?;
        let mut succ = current.clone();
        for axis in (0..succ.len()).rev() {
            if succ[axis] < self.region.hi[axis] {
                succ[axis] += 1;
                self.next = Some(succ);
                return Some(current);
            }
            succ[axis] = self.region.lo[axis];
        }
        Some(current)
    }
}

impl<'a> IntoIterator for &'a Region {
    type Item = Coord;
    type IntoIter = RegionIter<'a>;

    fn into_iter(self) -> RegionIter<'a> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn region(lo: &[i64], hi: &[i64]) -> Region {
        Region::new(lo, hi).unwrap()
    }

    #[test]
    fn iteration_is_lexicographic() {
        let cells: Vec<Vec<i64>> = region(&[0, 0], &[1, 2]).iter().map(|c| c.to_vec()).collect();
        assert_eq!(
            cells,
            vec![
                vec![0, 0],
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 1],
                vec![1, 2]
            ]
        );
    }

    #[test]
    fn inverted_corners_rejected() {
        assert!(matches!(
            Region::new(&[0, 3], &[1, 2]),
            Err(SpaceError::InvalidRegion { .. })
        ));
    }

    #[test]
    fn intersect_disjoint_is_none() {
        let a = region(&[0, 0], &[1, 1]);
        let b = region(&[2, 0], &[3, 1]);
        assert_eq!(a.intersect(&b), None);
        assert_eq!(
            a.intersect(&region(&[1, 1], &[5, 5])),
            Some(region(&[1, 1], &[1, 1]))
        );
    }

    #[test]
    fn union_and_translate() {
        let a = region(&[0, 0], &[1, 1]);
        let b = region(&[-3, 2], &[-1, 4]);
        assert_eq!(a.union_bounds(&b).unwrap(), region(&[-3, 0], &[1, 4]));
        assert_eq!(a.translate(&[10, -1]), Some(region(&[10, -1], &[11, 0])));
        assert_eq!(region(&[i64::MAX], &[i64::MAX]).translate(&[1]), None);
    }

    #[test]
    fn invert_mirrors_listed_axes() {
        let r = region(&[-1, 2, 0], &[3, 5, 1]);
        assert_eq!(r.invert(&[1]), Some(region(&[-1, -5, 0], &[3, -2, 1])));
        assert_eq!(r.invert(&[]), Some(region(&[-3, -5, -1], &[1, -2, 0])));
        assert_eq!(r.invert(&[0, 2]), Some(region(&[-3, 2, -1], &[1, 5, 0])));
        assert_eq!(r.invert(&[3]), None);
        assert_eq!(region(&[i64::MIN], &[0]).invert(&[]), None);
        assert_eq!(
            region(&[0], &[i64::MAX]).invert(&[]),
            Some(region(&[-i64::MAX], &[0]))
        );
    }

    #[test]
    fn bounding_of_points() {
        let pts: Vec<Vec<i64>> = vec![vec![3, -1], vec![0, 4], vec![2, 2]];
        let r = Region::bounding(pts.iter().map(|p| p.as_slice())).unwrap();
        assert_eq!(r, region(&[0, -1], &[3, 4]));
        assert!(Region::bounding(std::iter::empty()).is_none());
    }

    #[test]
    fn huge_region_counts_saturate_to_none() {
        let r = region(&[i64::MIN, i64::MIN, i64::MIN], &[i64::MAX, i64::MAX, i64::MAX]);
        assert_eq!(r.cell_count(), None);
    }

    proptest! {
        #[test]
        fn iter_yields_cell_count_contained_cells(
            lo in prop::collection::vec(-5i64..5, 1..4),
            ext in prop::collection::vec(0i64..3, 4),
        ) {
            let hi: Vec<i64> = lo.iter().zip(&ext).map(|(l, e)| l + e).collect();
            let r = Region::new(&lo, &hi).unwrap();
            let cells: Vec<Coord> = r.iter().collect();
            prop_assert_eq!(cells.len() as u128, r.cell_count().unwrap());
            prop_assert!(cells.iter().all(|c| r.contains(c)));
            prop_assert!(cells.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn invert_negates_membership(
            lo in prop::collection::vec(-5i64..5, 3),
            ext in prop::collection::vec(0i64..3, 3),
            axes in prop::collection::vec(0usize..3, 0..3),
            cell in prop::collection::vec(-8i64..8, 3),
        ) {
            let hi: Vec<i64> = lo.iter().zip(&ext).map(|(l, e)| l + e).collect();
            let r = Region::new(&lo, &hi).unwrap();
            let mirrored = r.invert(&axes).unwrap();
            let flipped: Vec<i64> = cell
                .iter()
                .enumerate()
                .map(|(axis, &v)| if axes.is_empty() || axes.contains(&axis) { -v } else { v })
                .collect();
            prop_assert_eq!(mirrored.contains(&cell), r.contains(&flipped));
            prop_assert_eq!(mirrored.invert(&axes), Some(r));
        }
    }
}
