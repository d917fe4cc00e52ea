//! Universe topology: per-axis boundary policies and canonicalization.

use std::fmt;
use std::sync::Arc;

use cellua_core::Coord;
use smallvec::SmallVec;

use crate::boundary::BoundaryPolicy;
use crate::error::SpaceError;
use crate::region::Region;

/// Corrects a coordinate after a looped axis has wrapped.
///
/// Called once per wrapped axis, after every axis has been brought into
/// range, with the signed number of wraps. Implementations must keep
/// every coordinate inside its axis bounds and must be consistent: two
/// coordinates that name the same cell must end up equal.
///
/// The engine also needs to know which axes an identification can flip,
/// so that active-cell tracking can follow neighborhoods across a
/// non-orientable seam.
pub trait Identification: fmt::Debug + Send + Sync {
    /// Correct `coord` after `axis` wrapped `wraps` times.
    fn identify(&self, coord: &mut [i64], axis: usize, wraps: i128, policies: &[BoundaryPolicy]);

    /// Axes whose orientation may be reversed by wrapping across `axis`.
    fn flipped_axes(&self, axis: usize, policies: &[BoundaryPolicy]) -> SmallVec<[usize; 2]>;
}

/// The default identification: an odd number of wraps across a loop with
/// `reflect: Some(t)` mirrors axis `t` within its bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mirror;

impl Identification for Mirror {
    fn identify(&self, coord: &mut [i64], axis: usize, wraps: i128, policies: &[BoundaryPolicy]) {
        if wraps.rem_euclid(2) == 0 {
            return;
        }
        let Some(target) = policies[axis].reflect_axis() else {
            return;
        };
        if let Some((lo, hi)) = policies[target].bounds() {
            // In range before and after, so the narrowing is exact.
            coord[target] = (lo as i128 + hi as i128 - coord[target] as i128) as i64;
        }
    }

    fn flipped_axes(&self, axis: usize, policies: &[BoundaryPolicy]) -> SmallVec<[usize; 2]> {
        policies[axis].reflect_axis().into_iter().collect()
    }
}

/// The shape of a universe's coordinate space.
///
/// Maps arbitrary coordinates to canonical ones: looped axes are wrapped
/// into range (applying the [`Identification`] for reflected loops), and
/// coordinates in the dead border of a finite axis have no canonical form.
/// The grid only ever stores canonical coordinates.
///
/// # Examples
///
/// ```
/// use cellua_space::{BoundaryPolicy, Topology};
///
/// // A Möbius strip: x loops over 0..=9 and flips y; y is finite 0..=3.
/// let strip = Topology::new(vec![
///     BoundaryPolicy::looped_reflecting(0, 9, 1),
///     BoundaryPolicy::Finite { lo: 0, hi: 3 },
/// ])
/// .unwrap();
///
/// assert_eq!(strip.canonicalize(&[10, 0]).unwrap().as_slice(), &[0, 3]);
/// assert_eq!(strip.canonicalize(&[20, 0]).unwrap().as_slice(), &[0, 0]);
/// assert!(strip.canonicalize(&[0, 4]).is_none());
/// ```
#[derive(Clone)]
pub struct Topology {
    policies: Vec<BoundaryPolicy>,
    identification: Arc<dyn Identification>,
}

impl Topology {
    /// Build a topology using the [`Mirror`] identification.
    pub fn new(policies: Vec<BoundaryPolicy>) -> Result<Self, SpaceError> {
        Self::with_identification(policies, Arc::new(Mirror))
    }

    /// An unbounded topology with `dimensions` infinite axes.
    pub fn infinite(dimensions: usize) -> Result<Self, SpaceError> {
        Self::new(vec![BoundaryPolicy::Infinite; dimensions])
    }

    /// Build a topology with a custom identification for reflected loops.
    pub fn with_identification(
        policies: Vec<BoundaryPolicy>,
        identification: Arc<dyn Identification>,
    ) -> Result<Self, SpaceError> {
        if policies.is_empty() {
            return Err(SpaceError::ZeroDimensions);
        }
        let dims = policies.len();
        for (axis, policy) in policies.iter().enumerate() {
            policy.validate(axis, dims)?;
            if let Some(target) = policy.reflect_axis() {
                if !policies[target].is_bounded() {
                    return Err(SpaceError::InvalidBoundary {
                        axis,
                        reason: format!("reflected axis {target} must be bounded"),
                    });
                }
            }
        }
        Ok(Self {
            policies,
            identification,
        })
    }

    /// Number of axes.
    pub fn dimensions(&self) -> usize {
        self.policies.len()
    }

    /// The per-axis policies.
    pub fn policies(&self) -> &[BoundaryPolicy] {
        &self.policies
    }

    /// The identification applied on wraps.
    pub fn identification(&self) -> &Arc<dyn Identification> {
        &self.identification
    }

    /// Canonical form of `coord`, or `None` if it lies in a dead border.
    ///
    /// Idempotent: canonicalizing a canonical coordinate returns it
    /// unchanged. `coord` must have [`dimensions`](Self::dimensions) axes.
    pub fn canonicalize(&self, coord: &[i64]) -> Option<Coord> {
        debug_assert_eq!(coord.len(), self.dimensions());
        self.canonicalize_with(|axis| coord[axis] as i128)
    }

    /// Canonical form of `base + offset`.
    ///
    /// Sums are taken without overflow; a sum that leaves the `i64` range
    /// on an infinite axis has no canonical form.
    pub fn canonicalize_offset(&self, base: &[i64], offset: &[i64]) -> Option<Coord> {
        debug_assert_eq!(base.len(), self.dimensions());
        debug_assert_eq!(offset.len(), self.dimensions());
        self.canonicalize_with(|axis| base[axis] as i128 + offset[axis] as i128)
    }

    fn canonicalize_with(&self, value: impl Fn(usize) -> i128) -> Option<Coord> {
        let mut out = Coord::with_capacity(self.policies.len());
        let mut wraps: SmallVec<[(usize, i128); 2]> = SmallVec::new();
        for (axis, policy) in self.policies.iter().enumerate() {
            let v = value(axis);
            let canonical = match *policy {
                BoundaryPolicy::Infinite => i64::try_from(v).ok()?,
                BoundaryPolicy::Finite { lo, hi } => {
                    if v < lo as i128 || v > hi as i128 {
                        return None;
                    }
                    v as i64
                }
                BoundaryPolicy::Loop { lo, hi, .. } => {
                    let period = hi as i128 - lo as i128 + 1;
                    let rel = v - lo as i128;
                    let w = rel.div_euclid(period);
                    if w != 0 {
                        wraps.push((axis, w));
                    }
                    (lo as i128 + rel.rem_euclid(period)) as i64
                }
            };
            out.push(canonical);
        }
        for (axis, w) in wraps {
            self.identification
                .identify(&mut out, axis, w, &self.policies);
        }
        Some(out)
    }

    /// Canonicalize `coord`, reporting which axis put it in a dead border.
    pub fn check(&self, coord: &[i64]) -> Result<Coord, SpaceError> {
        if coord.len() != self.dimensions() {
            return Err(SpaceError::DimensionMismatch {
                expected: self.dimensions(),
                actual: coord.len(),
            });
        }
        self.canonicalize(coord).ok_or_else(|| {
            let axis = self
                .policies
                .iter()
                .zip(coord)
                .position(|(p, &v)| matches!(p, BoundaryPolicy::Finite { .. }) && !p.contains(v))
                .unwrap_or(0);
            SpaceError::CoordOutOfBounds {
                coord: coord.into(),
                axis,
            }
        })
    }

    /// Whether `coord` is already canonical.
    pub fn contains(&self, coord: &[i64]) -> bool {
        coord.len() == self.dimensions()
            && self.policies.iter().zip(coord).all(|(p, &v)| p.contains(v))
    }

    /// The addressable region, defined only when every axis is bounded.
    pub fn bounding_extent(&self) -> Option<Region> {
        let (lo, hi): (Vec<i64>, Vec<i64>) = self
            .policies
            .iter()
            .map(|p| p.bounds())
            .collect::<Option<Vec<_>>>()?
            .into_iter()
            .unzip();
        Region::new(&lo, &hi).ok()
    }

    /// Every axis that some wrap can mirror, sorted.
    pub fn flipped_axes(&self) -> SmallVec<[usize; 4]> {
        let mut axes: SmallVec<[usize; 4]> = (0..self.dimensions())
            .flat_map(|axis| self.identification.flipped_axes(axis, &self.policies))
            .collect();
        axes.sort_unstable();
        axes.dedup();
        axes
    }

    /// Whether no wrap can reverse orientation.
    pub fn is_orientable(&self) -> bool {
        self.flipped_axes().is_empty()
    }
}

impl fmt::Debug for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topology")
            .field("policies", &self.policies)
            .field("identification", &self.identification)
            .finish()
    }
}

/// Topologies compare by their policies; identifications are opaque.
impl PartialEq for Topology {
    fn eq(&self, other: &Self) -> bool {
        self.policies == other.policies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance;
    use crate::shape::{NeighborhoodShape, ShapeLimits};
    use proptest::prelude::*;

    fn topo(policies: Vec<BoundaryPolicy>) -> Topology {
        Topology::new(policies).unwrap()
    }

    fn canon(t: &Topology, c: &[i64]) -> Option<Vec<i64>> {
        t.canonicalize(c).map(|c| c.to_vec())
    }

    #[test]
    fn torus_wraps_both_ways() {
        let t = topo(vec![BoundaryPolicy::looped(0, 4), BoundaryPolicy::looped(-2, 2)]);
        assert_eq!(canon(&t, &[5, 3]), Some(vec![0, -2]));
        assert_eq!(canon(&t, &[-1, -3]), Some(vec![4, 2]));
        assert_eq!(canon(&t, &[-11, 0]), Some(vec![4, 0]));
        assert!(t.is_orientable());
    }

    #[test]
    fn finite_axis_has_dead_border() {
        let t = topo(vec![BoundaryPolicy::Finite { lo: 0, hi: 2 }]);
        assert_eq!(canon(&t, &[2]), Some(vec![2]));
        assert_eq!(canon(&t, &[3]), None);
        assert_eq!(canon(&t, &[-1]), None);
        assert!(matches!(
            t.check(&[7]),
            Err(SpaceError::CoordOutOfBounds { axis: 0, .. })
        ));
    }

    #[test]
    fn klein_bottle_mirrors_on_odd_wraps_only() {
        let t = topo(vec![
            BoundaryPolicy::looped_reflecting(0, 3, 1),
            BoundaryPolicy::looped(0, 5),
        ]);
        assert_eq!(canon(&t, &[4, 1]), Some(vec![0, 4]));
        assert_eq!(canon(&t, &[8, 1]), Some(vec![0, 1]));
        assert_eq!(canon(&t, &[-1, 0]), Some(vec![3, 5]));
        // Wrap the mirrored axis first, then mirror.
        assert_eq!(canon(&t, &[4, 7]), Some(vec![0, 4]));
        assert!(!t.is_orientable());
        assert_eq!(t.flipped_axes().as_slice(), &[1]);
    }

    #[test]
    fn reflection_onto_infinite_axis_rejected() {
        let err = Topology::new(vec![
            BoundaryPolicy::looped_reflecting(0, 3, 1),
            BoundaryPolicy::Infinite,
        ])
        .unwrap_err();
        assert!(matches!(err, SpaceError::InvalidBoundary { axis: 0, .. }));
    }

    #[test]
    fn empty_policy_list_rejected() {
        assert_eq!(Topology::new(vec![]).unwrap_err(), SpaceError::ZeroDimensions);
    }

    #[test]
    fn extent_requires_every_axis_bounded() {
        let bounded = topo(vec![
            BoundaryPolicy::Finite { lo: 0, hi: 2 },
            BoundaryPolicy::looped(-1, 1),
        ]);
        let extent = bounded.bounding_extent().unwrap();
        assert_eq!(extent.lo(), &[0, -1]);
        assert_eq!(extent.hi(), &[2, 1]);
        let open = topo(vec![BoundaryPolicy::Finite { lo: 0, hi: 2 }, BoundaryPolicy::Infinite]);
        assert!(open.bounding_extent().is_none());
    }

    #[test]
    fn offsets_near_i64_limits_do_not_overflow() {
        let t = topo(vec![BoundaryPolicy::Infinite, BoundaryPolicy::looped(i64::MIN, i64::MAX)]);
        assert_eq!(t.canonicalize_offset(&[i64::MAX, 0], &[1, 0]), None);
        assert_eq!(
            t.canonicalize_offset(&[0, i64::MAX], &[0, 1]).map(|c| c.to_vec()),
            Some(vec![0, i64::MIN])
        );
    }

    #[test]
    fn compliance_on_small_topologies() {
        let shapes = [NeighborhoodShape::moore(1), NeighborhoodShape::von_neumann(2)];
        let topologies = [
            topo(vec![BoundaryPolicy::looped(0, 4), BoundaryPolicy::looped(0, 3)]),
            topo(vec![
                BoundaryPolicy::looped_reflecting(0, 4, 1),
                BoundaryPolicy::Finite { lo: 0, hi: 3 },
            ]),
            topo(vec![
                BoundaryPolicy::looped_reflecting(0, 3, 1),
                BoundaryPolicy::looped(0, 2),
            ]),
            topo(vec![
                BoundaryPolicy::looped_reflecting(0, 2, 1),
                BoundaryPolicy::looped_reflecting(0, 3, 0),
            ]),
            topo(vec![BoundaryPolicy::looped(0, 1), BoundaryPolicy::Finite { lo: 0, hi: 1 }]),
        ];
        for t in &topologies {
            compliance::assert_canonical_forms_fixed(t);
            for shape in &shapes {
                let compiled = shape.compile(2, &ShapeLimits::default()).unwrap();
                compliance::assert_envelope_covers_neighbors(t, &compiled);
            }
        }
    }

    fn policy_strategy() -> impl Strategy<Value = BoundaryPolicy> {
        prop_oneof![
            Just(BoundaryPolicy::Infinite),
            (-5i64..5, 0i64..6).prop_map(|(lo, len)| BoundaryPolicy::Finite { lo, hi: lo + len }),
            (-5i64..5, 0i64..6).prop_map(|(lo, len)| BoundaryPolicy::looped(lo, lo + len)),
            (-5i64..5, 0i64..6).prop_map(|(lo, len)| BoundaryPolicy::Loop {
                lo,
                hi: lo + len,
                reflect: Some(usize::MAX),
            }),
        ]
    }

    /// Policies for three axes; placeholder reflections are pointed at the
    /// next bounded axis, or dropped if there is none.
    fn topology_strategy() -> impl Strategy<Value = Topology> {
        prop::collection::vec(policy_strategy(), 3).prop_map(|mut policies| {
            for axis in 0..policies.len() {
                if let BoundaryPolicy::Loop { reflect, .. } = policies[axis] {
                    if reflect.is_some() {
                        let target = (1..policies.len())
                            .map(|k| (axis + k) % policies.len())
                            .find(|&t| policies[t].is_bounded());
                        if let BoundaryPolicy::Loop { reflect, .. } = &mut policies[axis] {
                            *reflect = target;
                        }
                    }
                }
            }
            Topology::new(policies).unwrap()
        })
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(
            t in topology_strategy(),
            coord in prop::collection::vec(-40i64..40, 3),
        ) {
            if let Some(c) = t.canonicalize(&coord) {
                prop_assert!(t.contains(&c));
                prop_assert_eq!(t.canonicalize(&c), Some(c.clone()));
            }
        }

        #[test]
        fn loop_wrap_round_trips(
            lo in -100i64..100,
            len in 0i64..50,
            x in -1000i64..1000,
            k in -20i64..20,
        ) {
            let t = topo(vec![BoundaryPolicy::looped(lo, lo + len)]);
            let period = len + 1;
            let there = t.canonicalize(&[x]).unwrap();
            let shifted = t.canonicalize(&[x + k * period]).unwrap();
            prop_assert_eq!(&there, &shifted);
            prop_assert_eq!(t.canonicalize(&there), Some(there.clone()));
        }
    }
}
