//! Reusable rule fixtures.
//!
//! - [`IncrementRule`]: counts live cells up modulo 64, no neighbors.
//! - [`GrowRule`]: a cell becomes live when any neighbor is live.
//! - [`PanickingRule`]: panics on a chosen state.
//! - [`FailingRule`]: returns an error on a chosen state.
//! - [`CountingRule`]: keeps a call counter, so it is not referentially
//!   transparent.

use std::sync::atomic::{AtomicU64, Ordering};

use cellua_core::{CellState, RuleError, QUIESCENT};
use cellua_rule::{CellContext, Rule};
use cellua_space::NeighborhoodShape;

/// Six-bit counter: a live cell in state `s` moves to `(s + 1) % 64`.
///
/// Range 0, so there are no neighbors and only live cells are ever
/// candidates. A cell at 63 wraps to quiescent and stays there.
pub struct IncrementRule {
    shape: NeighborhoodShape,
}

impl IncrementRule {
    pub fn new() -> Self {
        Self {
            shape: NeighborhoodShape::moore(0),
        }
    }
}

impl Default for IncrementRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for IncrementRule {
    fn name(&self) -> &str {
        "increment"
    }

    fn shape(&self) -> &NeighborhoodShape {
        &self.shape
    }

    fn state_bits(&self) -> u8 {
        6
    }

    fn apply(&self, ctx: &CellContext<'_>) -> Result<CellState, RuleError> {
        if ctx.state == QUIESCENT {
            return Ok(QUIESCENT);
        }
        Ok((ctx.state + 1) % 64)
    }
}

/// Binary growth: live cells stay live, and any cell with a live
/// neighbor becomes live.
pub struct GrowRule {
    shape: NeighborhoodShape,
}

impl GrowRule {
    pub fn new(shape: NeighborhoodShape) -> Self {
        Self { shape }
    }
}

impl Default for GrowRule {
    fn default() -> Self {
        Self::new(NeighborhoodShape::moore(1))
    }
}

impl Rule for GrowRule {
    fn name(&self) -> &str {
        "grow"
    }

    fn shape(&self) -> &NeighborhoodShape {
        &self.shape
    }

    fn apply(&self, ctx: &CellContext<'_>) -> Result<CellState, RuleError> {
        Ok((ctx.state != QUIESCENT || ctx.live_neighbors() > 0) as CellState)
    }
}

/// Behaves like [`GrowRule`] but panics when the cell holds `trigger`.
pub struct PanickingRule {
    pub trigger: CellState,
    shape: NeighborhoodShape,
}

impl PanickingRule {
    pub fn new(trigger: CellState) -> Self {
        Self {
            trigger,
            shape: NeighborhoodShape::moore(1),
        }
    }
}

impl Rule for PanickingRule {
    fn name(&self) -> &str {
        "panicking"
    }

    fn shape(&self) -> &NeighborhoodShape {
        &self.shape
    }

    fn state_bits(&self) -> u8 {
        2
    }

    fn apply(&self, ctx: &CellContext<'_>) -> Result<CellState, RuleError> {
        if ctx.state == self.trigger {
            panic!("fixture panic on state {}", self.trigger);
        }
        Ok(ctx.state)
    }
}

/// Keeps every state except `trigger`, on which it fails.
pub struct FailingRule {
    pub trigger: CellState,
    shape: NeighborhoodShape,
}

impl FailingRule {
    pub fn new(trigger: CellState) -> Self {
        Self {
            trigger,
            shape: NeighborhoodShape::moore(1),
        }
    }
}

impl Rule for FailingRule {
    fn name(&self) -> &str {
        "failing"
    }

    fn shape(&self) -> &NeighborhoodShape {
        &self.shape
    }

    fn state_bits(&self) -> u8 {
        2
    }

    fn apply(&self, ctx: &CellContext<'_>) -> Result<CellState, RuleError> {
        if ctx.state == self.trigger {
            return Err(RuleError::ExecutionFailed {
                reason: format!("fixture failure on state {}", self.trigger),
            });
        }
        Ok(ctx.state)
    }
}

/// Answers with the parity of its own call count for live cells.
///
/// Two consecutive evaluations of the same live cell always disagree.
/// Quiescent cells stay quiescent.
pub struct CountingRule {
    calls: AtomicU64,
    shape: NeighborhoodShape,
}

impl CountingRule {
    pub fn new() -> Self {
        Self {
            calls: AtomicU64::new(0),
            shape: NeighborhoodShape::moore(1),
        }
    }

    /// Total number of `apply` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for CountingRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for CountingRule {
    fn name(&self) -> &str {
        "counting"
    }

    fn shape(&self) -> &NeighborhoodShape {
        &self.shape
    }

    fn apply(&self, ctx: &CellContext<'_>) -> Result<CellState, RuleError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if ctx.state == QUIESCENT {
            return Ok(QUIESCENT);
        }
        Ok(n % 2)
    }
}
