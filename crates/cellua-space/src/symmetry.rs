//! Symmetry groups over signed axis permutations.
//!
//! Every group here is a subgroup of the hyperoctahedral group: the maps
//! that permute axes and flip their signs. These are exactly the
//! symmetries of a Chebyshev or Manhattan ball, so a full neighborhood
//! is always closed under them; masked neighborhoods are checked when
//! compiled.

use cellua_core::Coord;
use smallvec::SmallVec;

use crate::error::SpaceError;

/// Largest group the resolver will canonicalize over.
///
/// This is the order of the full group in 4 dimensions (`4! * 2^4`).
pub const MAX_GROUP_ORDER: usize = 384;

/// A rule's declared symmetry.
///
/// Neighbor sequences are canonicalized over the group before the rule
/// sees them, so a rule declaring a group must give the same answer for
/// every orientation the group relates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SymmetryGroup {
    /// No canonicalization; the rule sees neighbors in offset order.
    #[default]
    None,
    /// Independent sign flips of every axis (`2^d` elements).
    Reflections,
    /// Axis permutations without sign changes (`d!` elements).
    Permutations,
    /// Orientation-preserving signed permutations (`d! * 2^(d-1)`).
    Rotations,
    /// Every signed permutation (`d! * 2^d`).
    Full,
}

impl SymmetryGroup {
    /// Parse a group name as used in rule scripts.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "reflect" | "reflections" => Some(Self::Reflections),
            "permute" | "permutations" => Some(Self::Permutations),
            "rotate" | "rotations" => Some(Self::Rotations),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    /// Short name, accepted by [`from_name`](Self::from_name).
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Reflections => "reflect",
            Self::Permutations => "permute",
            Self::Rotations => "rotate",
            Self::Full => "full",
        }
    }

    /// Number of elements in `dimensions` dimensions, or `None` on overflow.
    pub fn order(&self, dimensions: usize) -> Option<usize> {
        let signs = || 1usize.checked_shl(u32::try_from(dimensions).ok()?);
        let factorial = || (1..=dimensions).try_fold(1usize, |acc, k| acc.checked_mul(k));
        match self {
            Self::None => Some(1),
            Self::Reflections => signs(),
            Self::Permutations => factorial(),
            Self::Full => factorial()?.checked_mul(signs()?),
            Self::Rotations => Some((factorial()?.checked_mul(signs()?)? / 2).max(1)),
        }
    }

    /// Enumerate the group's elements, identity first.
    pub fn elements(&self, dimensions: usize) -> Result<Vec<AxisMap>, SpaceError> {
        match self.order(dimensions) {
            Some(n) if n <= MAX_GROUP_ORDER => {}
            _ => {
                return Err(SpaceError::GroupTooLarge {
                    dimensions,
                    max_order: MAX_GROUP_ORDER,
                })
            }
        }
        if *self == Self::None {
            return Ok(vec![AxisMap::identity(dimensions)]);
        }

        let perms: Vec<SmallVec<[usize; 4]>> = match self {
            Self::Reflections => vec![(0..dimensions).collect()],
            _ => permutations(dimensions),
        };
        let flip_masks: Vec<u64> = match self {
            Self::Permutations => vec![0],
            _ => (0..1u64 << dimensions).collect(),
        };

        let mut out = Vec::new();
        for perm in &perms {
            for &mask in &flip_masks {
                let map = AxisMap {
                    perm: perm.clone(),
                    flip: (0..dimensions).map(|i| mask & (1 << i) != 0).collect(),
                };
                if *self != Self::Rotations || map.is_proper() {
                    out.push(map);
                }
            }
        }
        Ok(out)
    }
}

/// A signed permutation of axes.
///
/// Maps `v` to `w` where `w[perm[i]] = ±v[i]`, negated when `flip[i]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AxisMap {
    perm: SmallVec<[usize; 4]>,
    flip: SmallVec<[bool; 4]>,
}

impl AxisMap {
    /// The identity map in `dimensions` dimensions.
    pub fn identity(dimensions: usize) -> Self {
        Self {
            perm: (0..dimensions).collect(),
            flip: smallvec::smallvec![false; dimensions],
        }
    }

    /// Apply the map to an offset.
    pub fn apply(&self, v: &[i64]) -> Coord {
        let mut out: Coord = smallvec::smallvec![0; v.len()];
        for (i, &x) in v.iter().enumerate() {
            out[self.perm[i]] = if self.flip[i] { -x } else { x };
        }
        out
    }

    /// Whether the map preserves orientation (determinant `+1`).
    pub fn is_proper(&self) -> bool {
        let inversions = (0..self.perm.len())
            .flat_map(|i| (i + 1..self.perm.len()).map(move |j| (i, j)))
            .filter(|&(i, j)| self.perm[i] > self.perm[j])
            .count();
        let flips = self.flip.iter().filter(|&&f| f).count();
        (inversions + flips) % 2 == 0
    }
}

/// All permutations of `0..n` in lexicographic order.
fn permutations(n: usize) -> Vec<SmallVec<[usize; 4]>> {
    fn extend(
        prefix: &mut SmallVec<[usize; 4]>,
        used: &mut [bool],
        out: &mut Vec<SmallVec<[usize; 4]>>,
    ) {
        if prefix.len() == used.len() {
            out.push(prefix.clone());
            return;
        }
        for k in 0..used.len() {
            if !used[k] {
                used[k] = true;
                prefix.push(k);
                extend(prefix, used, out);
                prefix.pop();
                used[k] = false;
            }
        }
    }
    let mut out = Vec::new();
    extend(&mut SmallVec::new(), &mut vec![false; n], &mut out);
    out
}
