//! The [`Rule`] trait and its per-cell input.

use cellua_core::{CellState, Generation, RuleError, QUIESCENT};
use cellua_space::NeighborhoodShape;

/// What a rule may observe beyond its neighborhood.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Awareness {
    /// Depends only on the cell's state and neighbors. Eligible for
    /// transition caching.
    #[default]
    Stateless,
    /// Also reads the cell's absolute position and the generation number.
    /// Never cached.
    PositionTime,
}

/// Input to one rule invocation.
///
/// `position` and `generation` are only populated for rules declaring
/// [`Awareness::PositionTime`].
#[derive(Clone, Copy, Debug)]
pub struct CellContext<'a> {
    /// The cell's current state.
    pub state: CellState,
    /// Neighbor states in offset order (canonicalized if the rule declares
    /// a symmetry group).
    pub neighbors: &'a [CellState],
    /// The cell's canonical coordinate.
    pub position: Option<&'a [i64]>,
    /// The generation being read.
    pub generation: Option<Generation>,
}

impl<'a> CellContext<'a> {
    /// A context for a stateless rule.
    pub fn new(state: CellState, neighbors: &'a [CellState]) -> Self {
        Self {
            state,
            neighbors,
            position: None,
            generation: None,
        }
    }

    /// Number of non-quiescent neighbors.
    pub fn live_neighbors(&self) -> usize {
        self.neighbors.iter().filter(|&&s| s != QUIESCENT).count()
    }
}

/// A cell transition function bound to a neighborhood shape.
///
/// # Contract
///
/// - `apply()` must be referentially transparent: the same context
///   yields the same state. `&self` is shared across worker threads.
/// - A cell that is quiescent with an all-quiescent neighborhood is never
///   passed to `apply()` and stays quiescent; rules cannot turn empty
///   space live.
/// - `shape()`, `state_bits()` and `awareness()` are read once when the
///   rule is loaded.
///
/// # Object safety
///
/// The engine stores rules as `Arc<dyn Rule>`.
///
/// # Examples
///
/// ```
/// use cellua_core::{CellState, RuleError};
/// use cellua_rule::{CellContext, Rule};
/// use cellua_space::NeighborhoodShape;
///
/// struct Parity {
///     shape: NeighborhoodShape,
/// }
///
/// impl Rule for Parity {
///     fn name(&self) -> &str { "parity" }
///     fn shape(&self) -> &NeighborhoodShape { &self.shape }
///     fn apply(&self, ctx: &CellContext<'_>) -> Result<CellState, RuleError> {
///         Ok((ctx.live_neighbors() % 2) as CellState)
///     }
/// }
///
/// let rule = Parity { shape: NeighborhoodShape::von_neumann(1) };
/// let next = rule.apply(&CellContext::new(0, &[1, 0, 1, 1])).unwrap();
/// assert_eq!(next, 1);
/// ```
pub trait Rule: Send + Sync + 'static {
    /// Human-readable name for logs and persistence.
    fn name(&self) -> &str;

    /// The neighborhood this rule reads.
    fn shape(&self) -> &NeighborhoodShape;

    /// Width of the state domain in bits (1..=64). Default: 1.
    fn state_bits(&self) -> u8 {
        1
    }

    /// Whether the rule reads position and generation. Default: stateless.
    fn awareness(&self) -> Awareness {
        Awareness::Stateless
    }

    /// Source text the rule can be rebuilt from, if it has one.
    fn source(&self) -> Option<&str> {
        None
    }

    /// Compute the cell's next state.
    fn apply(&self, ctx: &CellContext<'_>) -> Result<CellState, RuleError>;
}
