//! Strongly-typed identifiers and the [`Coord`] type alias.

use smallvec::SmallVec;
use std::fmt;

/// Monotonically increasing generation counter.
///
/// A universe starts at `Generation(0)` and is incremented by exactly one
/// each time a step is committed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation that follows this one, or `None` at `u64::MAX`.
    pub fn checked_next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Generation {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A coordinate in an N-dimensional universe.
///
/// Uses `SmallVec<[i64; 4]>` to avoid heap allocation for universes
/// up to 4 dimensions. Higher-dimensional universes spill to the heap
/// transparently. The arity is fixed per universe and validated once at
/// construction.
pub type Coord = SmallVec<[i64; 4]>;
