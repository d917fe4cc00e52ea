//! Contained execution of a rule for one cell.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use cellua_core::{CellState, Generation, RuleError, RuleEvaluationError, StateCodec};

use crate::rule::{Awareness, CellContext, Rule};

/// Runs a [`Rule`] with its failures contained.
///
/// A panic inside the rule is caught and turned into
/// [`RuleError::Panicked`]; a result outside the rule's state domain
/// becomes [`RuleError::OutOfDomain`]. Neither unwinds into the stepper.
#[derive(Clone)]
pub struct RuleExecutor {
    rule: Arc<dyn Rule>,
    codec: StateCodec,
    awareness: Awareness,
}

impl RuleExecutor {
    /// Wrap `rule`, checking its results against `codec`.
    pub fn new(rule: Arc<dyn Rule>, codec: StateCodec) -> Self {
        let awareness = rule.awareness();
        Self {
            rule,
            codec,
            awareness,
        }
    }

    /// The wrapped rule.
    pub fn rule(&self) -> &Arc<dyn Rule> {
        &self.rule
    }

    /// The codec results are checked against.
    pub fn codec(&self) -> StateCodec {
        self.codec
    }

    /// The rule's declared awareness.
    pub fn awareness(&self) -> Awareness {
        self.awareness
    }

    /// Apply the rule, returning the unattributed error on failure.
    ///
    /// Position and generation are passed on only to position/time-aware
    /// rules.
    pub fn apply(
        &self,
        coord: &[i64],
        generation: Generation,
        state: CellState,
        neighbors: &[CellState],
    ) -> Result<CellState, RuleError> {
        let ctx = match self.awareness {
            Awareness::Stateless => CellContext::new(state, neighbors),
            Awareness::PositionTime => CellContext {
                state,
                neighbors,
                position: Some(coord),
                generation: Some(generation),
            },
        };
        let next = match panic::catch_unwind(AssertUnwindSafe(|| self.rule.apply(&ctx))) {
            Ok(result) => result?,
            Err(payload) => {
                return Err(RuleError::Panicked {
                    message: panic_message(payload.as_ref()),
                })
            }
        };
        if !self.codec.contains(next) {
            return Err(RuleError::OutOfDomain {
                state: next,
                max_state: self.codec.max_state(),
            });
        }
        Ok(next)
    }

    /// Apply the rule, attributing any failure to `coord` and `generation`.
    pub fn evaluate(
        &self,
        coord: &[i64],
        generation: Generation,
        state: CellState,
        neighbors: &[CellState],
    ) -> Result<CellState, RuleEvaluationError> {
        self.apply(coord, generation, state, neighbors)
            .map_err(|reason| RuleEvaluationError {
                coord: coord.into(),
                generation,
                reason,
            })
    }
}

impl std::fmt::Debug for RuleExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleExecutor")
            .field("rule", &self.rule.name())
            .field("codec", &self.codec)
            .field("awareness", &self.awareness)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellua_space::NeighborhoodShape;

    struct Behaved {
        shape: NeighborhoodShape,
        out: CellState,
        aware: bool,
    }

    impl Rule for Behaved {
        fn name(&self) -> &str {
            "behaved"
        }
        fn shape(&self) -> &NeighborhoodShape {
            &self.shape
        }
        fn state_bits(&self) -> u8 {
            2
        }
        fn awareness(&self) -> Awareness {
            if self.aware {
                Awareness::PositionTime
            } else {
                Awareness::Stateless
            }
        }
        fn apply(&self, ctx: &CellContext<'_>) -> Result<CellState, RuleError> {
            match (ctx.position, ctx.generation) {
                (Some(p), Some(g)) => Ok((p[0] as u64 + g.0) % 4),
                (None, None) => Ok(self.out),
                _ => Err(RuleError::ExecutionFailed {
                    reason: "half a context".into(),
                }),
            }
        }
    }

    struct Panicky;

    impl Rule for Panicky {
        fn name(&self) -> &str {
            "panicky"
        }
        fn shape(&self) -> &NeighborhoodShape {
            static SHAPE: std::sync::OnceLock<NeighborhoodShape> = std::sync::OnceLock::new();
            SHAPE.get_or_init(|| NeighborhoodShape::moore(1))
        }
        fn apply(&self, _: &CellContext<'_>) -> Result<CellState, RuleError> {
            panic!("rule exploded at {}", 42)
        }
    }

    fn executor(rule: impl Rule) -> RuleExecutor {
        let codec = StateCodec::new(rule.state_bits()).unwrap();
        RuleExecutor::new(Arc::new(rule), codec)
    }

    #[test]
    fn out_of_domain_results_are_rejected() {
        let exec = executor(Behaved {
            shape: NeighborhoodShape::moore(1),
            out: 4,
            aware: false,
        });
        let err = exec.evaluate(&[5, 6], Generation(3), 1, &[]).unwrap_err();
        assert_eq!(err.coord.as_slice(), &[5, 6]);
        assert_eq!(err.generation, Generation(3));
        assert_eq!(
            err.reason,
            RuleError::OutOfDomain {
                state: 4,
                max_state: 3
            }
        );
    }

    #[test]
    fn panics_are_contained_with_message() {
        let exec = executor(Panicky);
        let err = exec.evaluate(&[0], Generation(0), 0, &[1, 1]).unwrap_err();
        assert_eq!(
            err.reason,
            RuleError::Panicked {
                message: "rule exploded at 42".into()
            }
        );
    }

    #[test]
    fn only_aware_rules_see_position_and_time() {
        let blind = executor(Behaved {
            shape: NeighborhoodShape::moore(1),
            out: 2,
            aware: false,
        });
        assert_eq!(blind.apply(&[9], Generation(9), 0, &[]), Ok(2));
        let aware = executor(Behaved {
            shape: NeighborhoodShape::moore(1),
            out: 2,
            aware: true,
        });
        assert_eq!(aware.apply(&[9], Generation(2), 0, &[]), Ok(3));
    }
}
