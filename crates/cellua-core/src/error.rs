//! Error types shared across the Cellua workspace.
//!
//! Organized by where the failure originates: inside a single rule
//! invocation ([`RuleError`]), attributed to a cell and generation
//! ([`RuleEvaluationError`]), and at the level of a whole step
//! ([`StepError`]). Configuration errors live with the configuration
//! they validate.

use std::error::Error;
use std::fmt;

use crate::id::{Coord, Generation};
use crate::state::CellState;

/// A failure reported by (or on behalf of) a single rule invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuleError {
    /// The rule returned an error of its own.
    ExecutionFailed {
        /// Human-readable description of the failure.
        reason: String,
    },
    /// The rule panicked; the panic was contained by the executor.
    Panicked {
        /// The panic payload, if it was a string.
        message: String,
    },
    /// The rule exceeded its per-cell evaluation budget.
    ResourceLimit {
        /// The budget that was exhausted.
        budget: u64,
    },
    /// The rule returned a state outside its declared domain.
    OutOfDomain {
        /// The offending state.
        state: CellState,
        /// Largest state the rule's codec admits.
        max_state: CellState,
    },
    /// Two evaluations of the same inputs produced different results.
    ///
    /// Raised by verification mode; indicates the rule keeps state
    /// across invocations.
    NonDeterministic {
        /// Result of the first evaluation.
        first: CellState,
        /// Result of the repeated evaluation.
        second: CellState,
    },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExecutionFailed { reason } => write!(f, "execution failed: {reason}"),
            Self::Panicked { message } => write!(f, "rule panicked: {message}"),
            Self::ResourceLimit { budget } => {
                write!(f, "evaluation budget of {budget} operations exhausted")
            }
            Self::OutOfDomain { state, max_state } => {
                write!(f, "state {state} outside domain [0, {max_state}]")
            }
            Self::NonDeterministic { first, second } => {
                write!(f, "re-evaluation produced {second}, first evaluation produced {first}")
            }
        }
    }
}

impl Error for RuleError {}

/// A [`RuleError`] attributed to the cell and generation where it occurred.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleEvaluationError {
    /// Canonical coordinate of the cell being evaluated.
    pub coord: Coord,
    /// Generation whose snapshot was being read (the step computes `generation + 1`).
    pub generation: Generation,
    /// What went wrong.
    pub reason: RuleError,
}

impl fmt::Display for RuleEvaluationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rule evaluation failed at {:?} in generation {}: {}",
            self.coord.as_slice(),
            self.generation,
            self.reason
        )
    }
}

impl Error for RuleEvaluationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.reason)
    }
}

/// Errors from advancing a universe by one generation.
///
/// Every variant leaves the universe at its last committed generation:
/// no partially computed results are ever visible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StepError {
    /// A rule evaluation failed and the failure policy is to abort.
    RuleEvaluation(RuleEvaluationError),
    /// The step deadline passed before every candidate was evaluated.
    Timeout {
        /// Number of candidates evaluated before the step was abandoned.
        completed: usize,
    },
    /// The step was cancelled through its cancel token.
    Cancelled,
    /// The universe has no rule loaded.
    NoRule,
    /// The universe is at the last representable generation.
    GenerationOverflow,
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuleEvaluation(e) => write!(f, "{e}"),
            Self::Timeout { completed } => {
                write!(f, "step timed out after evaluating {completed} candidates")
            }
            Self::Cancelled => write!(f, "step cancelled"),
            Self::NoRule => write!(f, "no rule loaded"),
            Self::GenerationOverflow => write!(f, "generation counter exhausted"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::RuleEvaluation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RuleEvaluationError> for StepError {
    fn from(e: RuleEvaluationError) -> Self {
        Self::RuleEvaluation(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn evaluation_error_mentions_coord_and_generation() {
        let err = RuleEvaluationError {
            coord: smallvec![3, -1],
            generation: Generation(7),
            reason: RuleError::Panicked {
                message: "boom".into(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("[3, -1]"));
        assert!(text.contains("generation 7"));
        assert!(text.contains("boom"));
        assert!(err.source().is_some());
    }

    #[test]
    fn step_error_wraps_evaluation_error() {
        let inner = RuleEvaluationError {
            coord: smallvec![0],
            generation: Generation(0),
            reason: RuleError::OutOfDomain {
                state: 9,
                max_state: 1,
            },
        };
        let step: StepError = inner.clone().into();
        assert_eq!(step, StepError::RuleEvaluation(inner));
        assert!(step.source().is_some());
        assert!(StepError::Cancelled.source().is_none());
    }
}
