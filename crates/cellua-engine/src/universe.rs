//! The universe: committed state plus the query and command surface.
//!
//! A [`Universe`] owns the current [`GenerationSnapshot`] behind an `Arc`,
//! the topology, and the loaded rule. Queries read the snapshot; commands
//! either edit it (copy-on-write if a reader still holds it) or replace it
//! wholesale after a successful generation. Every failure path returns
//! before the swap, so no command leaves the universe half-updated.

use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use cellua_core::{
    CellReader, CellState, Coord, Generation, RuleEvaluationError, SnapshotAccess, StateCodec,
    StepError, QUIESCENT,
};
use cellua_grid::{GenerationSnapshot, GridStore, SharedSnapshot};
use cellua_rule::{NeighborhoodResolver, Rule, RuleExecutor, ScriptRule};
use cellua_space::{BoundaryPolicy, Region, SpaceError, Topology};

use crate::cache::{CacheStats, TransitionCache};
use crate::cancel::CancelToken;
use crate::config::{codec_for, ConfigError, EngineConfig, UniverseConfig};
use crate::metrics::StepMetrics;
use crate::stepper::{Stepper, MAX_STEP_WARNINGS};

// ── Outcomes ───────────────────────────────────────────────────────

/// The result of a successful [`Universe::step`] call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepOutcome {
    /// Generations committed by this call.
    pub advanced: u64,
    /// Counters folded over every committed generation.
    pub metrics: StepMetrics,
    /// Substituted failures and verification mismatches, oldest first.
    pub warnings: Vec<RuleEvaluationError>,
}

/// A [`Universe::step`] call that stopped early.
///
/// Generations completed before the failure stay committed; the one in
/// flight is discarded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StepFailure {
    /// Why the in-flight generation was abandoned.
    pub error: StepError,
    /// Generations committed before the failure.
    pub advanced: u64,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (after {} generations)", self.error, self.advanced)
    }
}

impl Error for StepFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.error)
    }
}

/// Errors from direct cell edits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditError {
    /// The coordinate has the wrong arity or lies outside a finite axis.
    Space(SpaceError),
    /// The state does not fit the loaded rule's state width.
    StateOutOfDomain {
        /// The rejected state.
        state: CellState,
        /// Largest state the rule admits.
        max_state: CellState,
    },
}

impl fmt::Display for EditError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Space(e) => write!(f, "{e}"),
            Self::StateOutOfDomain { state, max_state } => {
                write!(f, "state {state} exceeds the rule's maximum {max_state}")
            }
        }
    }
}

impl Error for EditError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Space(e) => Some(e),
            Self::StateOutOfDomain { .. } => None,
        }
    }
}

impl From<SpaceError> for EditError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}

// ── Universe ───────────────────────────────────────────────────────

struct LoadedRule {
    rule: Arc<dyn Rule>,
    stepper: Stepper,
}

/// An N-dimensional cellular automaton.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use cellua_engine::{Universe, UniverseConfig};
/// use cellua_rule::TotalisticRule;
///
/// let config = UniverseConfig::new(2, Arc::new(TotalisticRule::life()));
/// let mut universe = Universe::new(config).unwrap();
/// for x in -1..=1 {
///     universe.set_cell(&[x, 0], 1).unwrap();
/// }
/// universe.step(1, None).unwrap();
/// assert_eq!(universe.get_cell(&[0, 1]), 1);
/// assert_eq!(universe.get_cell(&[1, 0]), 0);
/// ```
pub struct Universe {
    topology: Topology,
    engine: EngineConfig,
    loaded: Option<LoadedRule>,
    cache: Arc<TransitionCache>,
    current: SharedSnapshot,
    /// The reset point, once the universe has moved past it.
    origin: Option<SharedSnapshot>,
    cancel: CancelToken,
    last_metrics: StepMetrics,
}

// Compile-time assertion: Universe must be Send so it can move to a
// simulation thread.
const _: () = {
    fn assert_send<T: Send>() {}
    fn check() {
        assert_send::<Universe>();
    }
    let _ = check;
};

impl Universe {
    /// Build an empty universe at generation 0.
    pub fn new(config: UniverseConfig) -> Result<Self, ConfigError> {
        let topology = config.topology()?;
        config.engine.validate()?;
        let cache = Arc::new(TransitionCache::new(&config.engine.cache));
        let mut universe = Self {
            current: Arc::new(GenerationSnapshot::empty(topology.dimensions())),
            topology,
            engine: config.engine,
            loaded: None,
            cache,
            origin: None,
            cancel: CancelToken::new(),
            last_metrics: StepMetrics::default(),
        };
        if let Some(rule) = config.rule {
            universe.load_rule(rule)?;
        }
        log::info!(
            "universe created: {} dimensions, rule {}",
            universe.dimension_count(),
            universe.rule().map_or("<none>", |r| r.name())
        );
        Ok(universe)
    }

    fn build_stepper(
        &self,
        rule: &Arc<dyn Rule>,
        topology: &Topology,
    ) -> Result<Stepper, ConfigError> {
        let codec = codec_for(rule.as_ref())?;
        let resolver = NeighborhoodResolver::new(
            topology.clone(),
            rule.shape(),
            &self.engine.shape_limits(),
        )?;
        let cache = self.engine.cache.enabled.then(|| Arc::clone(&self.cache));
        Ok(Stepper::new(
            RuleExecutor::new(Arc::clone(rule), codec),
            resolver,
            cache,
            &self.engine,
        ))
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Number of axes.
    pub fn dimension_count(&self) -> usize {
        self.topology.dimensions()
    }

    /// State at `coord`, after applying the boundary policies.
    ///
    /// Coordinates outside a finite axis, or of the wrong arity, read as
    /// quiescent.
    pub fn get_cell(&self, coord: &[i64]) -> CellState {
        if coord.len() != self.dimension_count() {
            return QUIESCENT;
        }
        match self.topology.canonicalize(coord) {
            Some(canonical) => self.current.get(&canonical),
            None => QUIESCENT,
        }
    }

    /// Every non-quiescent cell of the current generation.
    ///
    /// The order is stable until the next command.
    pub fn iterate_nonzero(&self) -> impl Iterator<Item = (&Coord, CellState)> + '_ {
        self.current.grid().iter_nonzero()
    }

    /// The committed generation number.
    pub fn current_generation(&self) -> Generation {
        self.current.generation()
    }

    /// The addressable region, defined only when every axis is bounded.
    pub fn bounding_extent(&self) -> Option<Region> {
        self.topology.bounding_extent()
    }

    /// Smallest region holding every live cell.
    pub fn live_bounds(&self) -> Option<Region> {
        self.current.grid().bounding_region()
    }

    /// A read-only handle on the current generation.
    ///
    /// The handle keeps showing this generation after later commands.
    pub fn snapshot(&self) -> SharedSnapshot {
        Arc::clone(&self.current)
    }

    /// Number of non-quiescent cells.
    pub fn population(&self) -> usize {
        self.current.population()
    }

    /// The loaded rule, if any.
    pub fn rule(&self) -> Option<&Arc<dyn Rule>> {
        self.loaded.as_ref().map(|l| &l.rule)
    }

    /// The state codec of the loaded rule, or the full 64-bit codec when
    /// no rule is loaded.
    pub fn codec(&self) -> StateCodec {
        match &self.loaded {
            Some(l) => l.stepper.executor().codec(),
            None => StateCodec::new(StateCodec::MAX_BITS).unwrap_or_default(),
        }
    }

    /// The coordinate space.
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The engine configuration.
    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    /// Metrics of the most recently committed generation.
    pub fn last_metrics(&self) -> &StepMetrics {
        &self.last_metrics
    }

    /// Transition cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// A handle that cancels the step currently running on this universe.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    // ── Commands ───────────────────────────────────────────────────

    /// Write `state` at `coord`, bypassing the rule. Returns the previous
    /// state.
    ///
    /// Edits made at generation 0 are part of the reset point.
    pub fn set_cell(&mut self, coord: &[i64], state: CellState) -> Result<CellState, EditError> {
        let canonical = self.topology.check(coord)?;
        let codec = self.codec();
        if !codec.contains(state) {
            return Err(EditError::StateOutOfDomain {
                state,
                max_state: codec.max_state(),
            });
        }
        Ok(Arc::make_mut(&mut self.current)
            .grid_mut()
            .set(canonical, state))
    }

    /// Advance up to `n` generations.
    ///
    /// `timeout` bounds the whole call. A generation that fails, times out
    /// or is cancelled is discarded; earlier generations of the same call
    /// stay committed.
    pub fn step(
        &mut self,
        n: u64,
        timeout: Option<Duration>,
    ) -> Result<StepOutcome, StepFailure> {
        self.cancel.reset();
        let mut outcome = StepOutcome::default();
        if n == 0 {
            return Ok(outcome);
        }
        let Some(loaded) = &self.loaded else {
            return Err(StepFailure {
                error: StepError::NoRule,
                advanced: 0,
            });
        };
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        log::debug!(
            "stepping {n} generations from {} (deadline: {:?})",
            self.current.generation(),
            timeout
        );

        while outcome.advanced < n {
            let early = if self.cancel.is_cancelled() {
                Some(StepError::Cancelled)
            } else if deadline.is_some_and(|d| Instant::now() >= d) {
                Some(StepError::Timeout { completed: 0 })
            } else {
                None
            };
            let result = match early {
                Some(error) => Err(error),
                None => loaded.stepper.advance(&self.current, deadline, &self.cancel),
            };
            let advance = match result {
                Ok(advance) => advance,
                Err(error) => {
                    log::warn!(
                        "step abandoned at generation {}: {error}",
                        self.current.generation()
                    );
                    return Err(StepFailure {
                        error,
                        advanced: outcome.advanced,
                    });
                }
            };

            if self.origin.is_none() {
                self.origin = Some(Arc::clone(&self.current));
            }
            let next = advance.generation;
            self.current = Arc::new(GenerationSnapshot::new(next, advance.grid));
            log::debug!(
                "generation {next}: {} candidates, {} evaluated, population {}, {}us",
                advance.metrics.candidates,
                advance.metrics.evaluated,
                advance.metrics.population,
                advance.metrics.total_us
            );
            outcome.metrics.accumulate(&advance.metrics);
            let room = MAX_STEP_WARNINGS.saturating_sub(outcome.warnings.len());
            outcome.warnings.extend(advance.warnings.into_iter().take(room));
            self.last_metrics = advance.metrics;
            outcome.advanced += 1;
        }
        Ok(outcome)
    }

    /// Restore the reset point.
    ///
    /// For a universe built from a configuration this is generation 0 with
    /// every edit made at generation 0. A universe restored from a saved
    /// image resets to the restored generation.
    pub fn reset_to_generation_zero(&mut self) {
        if let Some(origin) = self.origin.take() {
            self.current = origin;
        }
        self.last_metrics = StepMetrics::default();
        log::info!("universe reset to generation {}", self.current.generation());
    }

    /// Replace the contents with `cells` at `generation`, which becomes the
    /// reset point.
    ///
    /// Every coordinate is checked against the topology and every state
    /// against the loaded rule. On error the universe is unchanged.
    pub fn restore_generation(
        &mut self,
        generation: Generation,
        cells: impl IntoIterator<Item = (Coord, CellState)>,
    ) -> Result<(), EditError> {
        let codec = self.codec();
        let mut grid = GridStore::new(self.dimension_count());
        for (coord, state) in cells {
            let canonical = self.topology.check(&coord)?;
            if !codec.contains(state) {
                return Err(EditError::StateOutOfDomain {
                    state,
                    max_state: codec.max_state(),
                });
            }
            grid.set(canonical, state);
        }
        self.current = Arc::new(GenerationSnapshot::new(generation, grid));
        self.origin = (generation != Generation::default()).then(|| Arc::clone(&self.current));
        self.last_metrics = StepMetrics::default();
        Ok(())
    }

    /// Replace the transition rule.
    ///
    /// The neighborhood is compiled against the current topology and every
    /// live cell must fit the new rule's state width. The transition cache
    /// is cleared. On error the previous rule stays loaded.
    pub fn load_rule(&mut self, rule: Arc<dyn Rule>) -> Result<(), ConfigError> {
        let stepper = self.build_stepper(&rule, &self.topology)?;
        let codec = stepper.executor().codec();
        if let Some((_, state)) = self.iterate_nonzero().find(|(_, s)| !codec.contains(*s)) {
            return Err(ConfigError::StateOutOfDomain {
                state,
                max_state: codec.max_state(),
            });
        }
        self.cache.clear();
        log::info!(
            "loaded rule {} ({} neighbors, {} state bits)",
            rule.name(),
            stepper.resolver().shape().len(),
            codec.bits()
        );
        self.loaded = Some(LoadedRule { rule, stepper });
        Ok(())
    }

    /// Parse and load a rule script.
    pub fn load_rule_script(&mut self, source: &str) -> Result<(), ConfigError> {
        let rule = ScriptRule::parse(source)?;
        self.load_rule(Arc::new(rule))
    }

    /// Replace the boundary policies.
    ///
    /// Live cells are re-canonicalized under the new topology; cells that
    /// fall outside a finite axis, or collide with an earlier cell, are
    /// dropped. The reset point is rewritten the same way. Returns the
    /// number of cells dropped from the current generation.
    pub fn configure_boundaries(
        &mut self,
        policies: Vec<BoundaryPolicy>,
    ) -> Result<usize, ConfigError> {
        if policies.len() != self.dimension_count() {
            return Err(ConfigError::BoundaryArity {
                expected: self.dimension_count(),
                actual: policies.len(),
            });
        }
        let topology =
            Topology::with_identification(policies, Arc::clone(self.topology.identification()))?;
        let stepper = match &self.loaded {
            Some(l) => Some(self.build_stepper(&l.rule, &topology)?),
            None => None,
        };

        let (current, dropped) = remap(&self.current, &topology);
        self.current = Arc::new(current);
        self.origin = self
            .origin
            .as_ref()
            .map(|origin| Arc::new(remap(origin, &topology).0));
        if let (Some(loaded), Some(stepper)) = (self.loaded.as_mut(), stepper) {
            loaded.stepper = stepper;
        }
        self.topology = topology;
        if dropped > 0 {
            log::warn!("boundary change dropped {dropped} cells");
        }
        log::info!("boundaries reconfigured: {:?}", self.topology.policies());
        Ok(dropped)
    }

    /// Remove every live cell. The generation number is kept.
    pub fn clear(&mut self) {
        let generation = self.current.generation();
        self.current = Arc::new(GenerationSnapshot::new(
            generation,
            GridStore::new(self.dimension_count()),
        ));
    }
}

fn remap(snapshot: &GenerationSnapshot, topology: &Topology) -> (GenerationSnapshot, usize) {
    let mut grid = GridStore::with_capacity(topology.dimensions(), snapshot.population());
    let mut dropped = 0;
    for (coord, state) in snapshot.grid().iter_nonzero() {
        match topology.canonicalize(coord) {
            Some(canonical) if grid.get(&canonical) == QUIESCENT => {
                grid.set(canonical, state);
            }
            _ => dropped += 1,
        }
    }
    (GenerationSnapshot::new(snapshot.generation(), grid), dropped)
}

impl fmt::Debug for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Universe")
            .field("topology", &self.topology)
            .field("rule", &self.rule().map(|r| r.name().to_string()))
            .field("generation", &self.current.generation())
            .field("population", &self.current.population())
            .finish()
    }
}
