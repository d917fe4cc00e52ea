//! Generation stepping: candidate evaluation against one snapshot.
//!
//! A [`Stepper`] owns everything needed to turn generation `g` into
//! `g + 1` for one loaded rule. Every candidate reads the same immutable
//! snapshot, so evaluation order cannot influence the result. Large
//! candidate sets are split into contiguous chunks evaluated on scoped
//! worker threads; chunk results come back over a channel and are merged
//! in chunk order.
//!
//! Nothing here mutates the universe. A step that fails, times out or is
//! cancelled simply returns its error and the caller keeps the old
//! snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use cellua_core::{
    CellReader, CellState, Coord, Generation, RuleError, RuleEvaluationError, SnapshotAccess,
    StepError, QUIESCENT,
};
use cellua_grid::{GenerationSnapshot, GridStore};
use cellua_rule::{Awareness, NeighborhoodResolver, RuleExecutor};

use crate::cache::TransitionCache;
use crate::cancel::CancelToken;
use crate::candidates;
use crate::config::{EngineConfig, FailurePolicy, VerifyConfig};
use crate::metrics::StepMetrics;

/// Warnings kept per step; further ones are only counted in the metrics.
pub const MAX_STEP_WARNINGS: usize = 256;

/// Cells between deadline checks.
const DEADLINE_POLL: usize = 32;

/// The result of one successful generation.
#[derive(Debug)]
pub(crate) struct Advance {
    /// The generation `grid` belongs to.
    pub generation: Generation,
    pub grid: GridStore,
    pub metrics: StepMetrics,
    pub warnings: Vec<RuleEvaluationError>,
}

#[derive(Debug, Default)]
struct Tally {
    evaluated: u64,
    pruned: u64,
    cache_hits: u64,
    cache_misses: u64,
    substituted: u64,
    verify_mismatches: u64,
}

impl Tally {
    fn add(&mut self, other: &Tally) {
        self.evaluated += other.evaluated;
        self.pruned += other.pruned;
        self.cache_hits += other.cache_hits;
        self.cache_misses += other.cache_misses;
        self.substituted += other.substituted;
        self.verify_mismatches += other.verify_mismatches;
    }
}

#[derive(Debug)]
enum Stop {
    Failed(RuleEvaluationError),
    Timeout,
    Cancelled,
    /// Another chunk stopped first.
    Aborted,
}

#[derive(Debug, Default)]
struct ChunkOutcome {
    live: Vec<(Coord, CellState)>,
    tally: Tally,
    warnings: Vec<RuleEvaluationError>,
    stop: Option<Stop>,
}

/// Per-evaluation inputs shared by every chunk of a step.
struct Pass<'a> {
    snapshot: &'a GenerationSnapshot,
    /// The generation being read; rules and errors see this number.
    generation: Generation,
    deadline: Option<Instant>,
    cancel: &'a CancelToken,
    abort: &'a AtomicBool,
}

impl Pass<'_> {
    fn interrupted(&self, i: usize) -> Option<Stop> {
        if self.abort.load(Ordering::Relaxed) {
            return Some(Stop::Aborted);
        }
        if self.cancel.is_cancelled() {
            return Some(Stop::Cancelled);
        }
        if i % DEADLINE_POLL == 0 {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    return Some(Stop::Timeout);
                }
            }
        }
        None
    }
}

/// Steps one loaded rule.
#[derive(Debug)]
pub(crate) struct Stepper {
    executor: RuleExecutor,
    resolver: NeighborhoodResolver,
    cache: Option<Arc<TransitionCache>>,
    failure_policy: FailurePolicy,
    verify: Option<VerifyConfig>,
    workers: usize,
    parallel_threshold: usize,
}

impl Stepper {
    /// Assemble a stepper. The cache is consulted only for stateless rules.
    pub(crate) fn new(
        executor: RuleExecutor,
        resolver: NeighborhoodResolver,
        cache: Option<Arc<TransitionCache>>,
        config: &EngineConfig,
    ) -> Self {
        let cache = match executor.awareness() {
            Awareness::Stateless => cache,
            Awareness::PositionTime => None,
        };
        Self {
            executor,
            resolver,
            cache,
            failure_policy: config.failure_policy,
            verify: config.verify,
            workers: config.resolved_worker_count(),
            parallel_threshold: config.parallel_threshold,
        }
    }

    pub(crate) fn resolver(&self) -> &NeighborhoodResolver {
        &self.resolver
    }

    pub(crate) fn executor(&self) -> &RuleExecutor {
        &self.executor
    }

    /// Compute the generation after `snapshot`.
    pub(crate) fn advance(
        &self,
        snapshot: &GenerationSnapshot,
        deadline: Option<Instant>,
        cancel: &CancelToken,
    ) -> Result<Advance, StepError> {
        let start = Instant::now();
        let Some(next) = snapshot.generation().checked_next() else {
            return Err(StepError::GenerationOverflow);
        };
        let candidates = candidates::collect(snapshot.grid(), &self.resolver);
        if cancel.is_cancelled() {
            return Err(StepError::Cancelled);
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(StepError::Timeout { completed: 0 });
        }
        self.evaluate(snapshot, next, &candidates, deadline, cancel, start)
    }

    /// Evaluate `candidates` against `snapshot`, producing generation `next`.
    fn evaluate(
        &self,
        snapshot: &GenerationSnapshot,
        next: Generation,
        candidates: &[Coord],
        deadline: Option<Instant>,
        cancel: &CancelToken,
        start: Instant,
    ) -> Result<Advance, StepError> {
        let abort = AtomicBool::new(false);
        let pass = Pass {
            snapshot,
            generation: snapshot.generation(),
            deadline,
            cancel,
            abort: &abort,
        };

        let outcomes = if self.workers > 1 && candidates.len() >= self.parallel_threshold {
            self.evaluate_parallel(&pass, candidates)
        } else {
            vec![self.evaluate_chunk(&pass, candidates, 0)]
        };

        let mut tally = Tally::default();
        for outcome in &outcomes {
            tally.add(&outcome.tally);
        }
        // The first chunk (in candidate order) that stopped on its own.
        let stop = outcomes
            .iter()
            .filter_map(|o| o.stop.as_ref())
            .find(|s| !matches!(s, Stop::Aborted));
        match stop {
            Some(Stop::Failed(e)) => return Err(StepError::RuleEvaluation(e.clone())),
            Some(Stop::Timeout) => {
                return Err(StepError::Timeout {
                    completed: tally.evaluated as usize,
                })
            }
            Some(Stop::Cancelled) | Some(Stop::Aborted) => return Err(StepError::Cancelled),
            None => {}
        }

        let live_count = outcomes.iter().map(|o| o.live.len()).sum();
        let mut grid = GridStore::with_capacity(snapshot.grid().dimensions(), live_count);
        let mut warnings = Vec::new();
        for outcome in outcomes {
            for (coord, state) in outcome.live {
                grid.set(coord, state);
            }
            let room = MAX_STEP_WARNINGS - warnings.len();
            warnings.extend(outcome.warnings.into_iter().take(room));
        }

        let metrics = StepMetrics {
            total_us: start.elapsed().as_micros() as u64,
            generation: next.0,
            candidates: candidates.len() as u64,
            evaluated: tally.evaluated,
            pruned: tally.pruned,
            cache_hits: tally.cache_hits,
            cache_misses: tally.cache_misses,
            substituted: tally.substituted,
            verify_mismatches: tally.verify_mismatches,
            population: grid.population() as u64,
        };
        Ok(Advance {
            generation: next,
            grid,
            metrics,
            warnings,
        })
    }

    fn evaluate_parallel(&self, pass: &Pass<'_>, candidates: &[Coord]) -> Vec<ChunkOutcome> {
        let chunk_len = candidates.len().div_ceil(self.workers);
        let chunk_count = candidates.len().div_ceil(chunk_len);
        let (tx, rx) = crossbeam_channel::bounded(chunk_count);
        thread::scope(|scope| {
            for (idx, chunk) in candidates.chunks(chunk_len).enumerate() {
                let tx = tx.clone();
                scope.spawn(move || {
                    let outcome = self.evaluate_chunk(pass, chunk, idx * chunk_len);
                    if outcome.stop.is_some() {
                        pass.abort.store(true, Ordering::Relaxed);
                    }
                    // The receiver outlives the scope.
                    let _ = tx.send((idx, outcome));
                });
            }
        });
        drop(tx);

        let mut slots: Vec<Option<ChunkOutcome>> = (0..chunk_count).map(|_| None).collect();
        for (idx, outcome) in rx.try_iter() {
            slots[idx] = Some(outcome);
        }
        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| ChunkOutcome {
                    stop: Some(Stop::Cancelled),
                    ..ChunkOutcome::default()
                })
            })
            .collect()
    }

    fn evaluate_chunk(&self, pass: &Pass<'_>, chunk: &[Coord], base: usize) -> ChunkOutcome {
        let mut out = ChunkOutcome::default();
        let mut neighbors = Vec::with_capacity(self.resolver.shape().len());
        let mut key = Vec::with_capacity(self.resolver.shape().len() + 1);
        let generation = pass.generation;

        for (i, coord) in chunk.iter().enumerate() {
            if let Some(stop) = pass.interrupted(i) {
                out.stop = Some(stop);
                return out;
            }
            let state = pass.snapshot.get(coord);
            let quiet = self
                .resolver
                .resolve_into(coord, pass.snapshot, &mut neighbors);
            if quiet && state == QUIESCENT {
                out.tally.pruned += 1;
                continue;
            }

            let (next, substituted) = match self.transition(
                coord,
                generation,
                state,
                &neighbors,
                &mut key,
                &mut out.tally,
            ) {
                Ok(next) => (next, false),
                Err(err) => match self.failure_policy {
                    FailurePolicy::Abort => {
                        out.stop = Some(Stop::Failed(err));
                        return out;
                    }
                    FailurePolicy::SubstituteDefault => {
                        log::warn!("substituting quiescent state: {err}");
                        out.tally.substituted += 1;
                        out.warnings.push(err);
                        (QUIESCENT, true)
                    }
                },
            };
            out.tally.evaluated += 1;

            // A substituted cell already carries its warning.
            if let Some(verify) = self.verify.filter(|_| !substituted) {
                if (base + i) % verify.sample_every == 0 {
                    self.verify_sample(coord, generation, state, &neighbors, next, &mut out);
                }
            }
            if next != QUIESCENT {
                out.live.push((coord.clone(), next));
            }
        }
        out
    }

    fn transition(
        &self,
        coord: &[i64],
        generation: Generation,
        state: CellState,
        neighbors: &[CellState],
        key: &mut Vec<CellState>,
        tally: &mut Tally,
    ) -> Result<CellState, RuleEvaluationError> {
        let Some(cache) = &self.cache else {
            return self.executor.evaluate(coord, generation, state, neighbors);
        };
        key.clear();
        key.push(state);
        key.extend_from_slice(neighbors);
        if let Some(next) = cache.lookup(key) {
            tally.cache_hits += 1;
            return Ok(next);
        }
        tally.cache_misses += 1;
        let next = self.executor.evaluate(coord, generation, state, neighbors)?;
        cache.store(key, next);
        Ok(next)
    }

    fn verify_sample(
        &self,
        coord: &[i64],
        generation: Generation,
        state: CellState,
        neighbors: &[CellState],
        first: CellState,
        out: &mut ChunkOutcome,
    ) {
        let reason = match self.executor.apply(coord, generation, state, neighbors) {
            Ok(second) if second == first => return,
            Ok(second) => RuleError::NonDeterministic { first, second },
            Err(e) => e,
        };
        let err = RuleEvaluationError {
            coord: coord.into(),
            generation,
            reason,
        };
        log::warn!("verification mismatch: {err}");
        out.tally.verify_mismatches += 1;
        out.warnings.push(err);
    }
}
