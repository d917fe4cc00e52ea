//! Per-step performance and outcome counters.

/// Timing and counting measurements collected during a step.
///
/// A single generation fills every field; [`accumulate`](Self::accumulate)
/// folds several generations into one record, in which case `population`
/// and `generation` describe the last one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepMetrics {
    /// Wall-clock time for the whole step, in microseconds.
    pub total_us: u64,
    /// Generation number reached by the step.
    pub generation: u64,
    /// Cells considered for evaluation (live cells and their reach).
    pub candidates: u64,
    /// Candidates for which a next state was produced.
    pub evaluated: u64,
    /// Candidates skipped because they and their neighborhood were quiescent.
    pub pruned: u64,
    /// Transitions answered from the cache.
    pub cache_hits: u64,
    /// Cache lookups that fell through to the rule.
    pub cache_misses: u64,
    /// Failed evaluations replaced by the quiescent state.
    pub substituted: u64,
    /// Verification samples that disagreed with the first evaluation.
    pub verify_mismatches: u64,
    /// Non-quiescent cells after the step.
    pub population: u64,
}

impl StepMetrics {
    /// Fold `other` (a later generation) into `self`.
    pub fn accumulate(&mut self, other: &StepMetrics) {
        self.total_us += other.total_us;
        self.candidates += other.candidates;
        self.evaluated += other.evaluated;
        self.pruned += other.pruned;
        self.cache_hits += other.cache_hits;
        self.cache_misses += other.cache_misses;
        self.substituted += other.substituted;
        self.verify_mismatches += other.verify_mismatches;
        self.generation = other.generation;
        self.population = other.population;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.candidates, 0);
        assert_eq!(m.cache_hits, 0);
        assert_eq!(m.population, 0);
    }

    #[test]
    fn accumulate_sums_counts_and_keeps_last_population() {
        let mut total = StepMetrics {
            evaluated: 3,
            population: 10,
            generation: 1,
            ..StepMetrics::default()
        };
        total.accumulate(&StepMetrics {
            evaluated: 4,
            population: 2,
            generation: 2,
            ..StepMetrics::default()
        });
        assert_eq!(total.evaluated, 7);
        assert_eq!(total.population, 2);
        assert_eq!(total.generation, 2);
    }
}
