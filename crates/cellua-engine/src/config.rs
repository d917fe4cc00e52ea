//! Universe configuration, validation, and error types.
//!
//! [`UniverseConfig`] is the builder input for a [`Universe`](crate::Universe).
//! [`validate()`](UniverseConfig::validate) checks every structural
//! invariant once, at construction; nothing here is rechecked per step.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use cellua_core::{CellState, StateCodec};
use cellua_rule::{Rule, ScriptError};
use cellua_space::{
    BoundaryPolicy, Identification, Mirror, ShapeLimits, SpaceError, Topology, MAX_RANGE,
};

// ── FailurePolicy ──────────────────────────────────────────────────

/// What a step does when a rule evaluation fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Abandon the whole step; the universe stays at its last generation.
    #[default]
    Abort,
    /// Treat the failed cell as quiescent, log a warning, and continue.
    SubstituteDefault,
}

// ── CacheConfig ────────────────────────────────────────────────────

/// Configuration for the transition cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// Whether stateless rules are memoized. Default: true.
    pub enabled: bool,
    /// Maximum cached transitions across all shards. Default: 65 536.
    pub capacity: usize,
    /// Number of independently locked shards; a power of two no larger
    /// than `capacity`. Default: 16.
    pub shards: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 65_536,
            shards: 16,
        }
    }
}

impl CacheConfig {
    /// A configuration with caching turned off.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

// ── VerifyConfig ───────────────────────────────────────────────────

/// Referential-transparency spot checks.
///
/// Every `sample_every`-th candidate of a step is evaluated a second time,
/// bypassing the cache. A differing answer is logged as a warning and
/// reported as a [`RuleError::NonDeterministic`](cellua_core::RuleError::NonDeterministic)
/// in the step outcome; the first answer is kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerifyConfig {
    /// Sampling stride, at least 1. `1` checks every cell.
    pub sample_every: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self { sample_every: 64 }
    }
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Tuning knobs for stepping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    /// Largest neighborhood range a rule may declare. Default and hard
    /// maximum: [`MAX_RANGE`].
    pub max_range: u32,
    /// Largest number of neighbors a rule may declare. Default: 4096.
    pub max_neighbors: usize,
    /// Worker threads for large steps. `None` = auto-detect
    /// (`available_parallelism`, clamped to `[1, 64]`).
    pub worker_count: Option<usize>,
    /// Candidate count below which a step runs on the calling thread.
    /// Default: 4096.
    pub parallel_threshold: usize,
    /// What to do when a rule evaluation fails. Default: abort.
    pub failure_policy: FailurePolicy,
    /// Transition cache settings.
    pub cache: CacheConfig,
    /// Optional referential-transparency verification. Default: off.
    pub verify: Option<VerifyConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_range: MAX_RANGE,
            max_neighbors: 4096,
            worker_count: None,
            parallel_threshold: 4096,
            failure_policy: FailurePolicy::Abort,
            cache: CacheConfig::default(),
            verify: None,
        }
    }
}

impl EngineConfig {
    /// Resolve the worker count, applying auto-detection if `None`.
    ///
    /// Explicit values are clamped to `[1, 64]`.
    pub fn resolved_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.clamp(1, 64),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
                .clamp(1, 64),
        }
    }

    /// Shape limits derived from this configuration.
    pub fn shape_limits(&self) -> ShapeLimits {
        ShapeLimits {
            max_range: self.max_range,
            max_neighbors: self.max_neighbors,
        }
    }

    /// Check every knob.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_range > MAX_RANGE {
            return Err(ConfigError::InvalidEngine {
                reason: format!("max_range {} exceeds {MAX_RANGE}", self.max_range),
            });
        }
        if self.max_neighbors == 0 {
            return Err(ConfigError::InvalidEngine {
                reason: "max_neighbors must be at least 1".into(),
            });
        }
        if self.parallel_threshold == 0 {
            return Err(ConfigError::InvalidEngine {
                reason: "parallel_threshold must be at least 1".into(),
            });
        }
        let c = &self.cache;
        if c.enabled {
            if c.capacity == 0 {
                return Err(ConfigError::InvalidCache {
                    reason: "capacity must be at least 1".into(),
                });
            }
            if !c.shards.is_power_of_two() {
                return Err(ConfigError::InvalidCache {
                    reason: format!("shards must be a power of two, got {}", c.shards),
                });
            }
            if c.shards > c.capacity {
                return Err(ConfigError::InvalidCache {
                    reason: format!(
                        "shards ({}) exceed capacity ({})",
                        c.shards, c.capacity
                    ),
                });
            }
        }
        if let Some(v) = self.verify {
            if v.sample_every == 0 {
                return Err(ConfigError::InvalidEngine {
                    reason: "verify.sample_every must be at least 1".into(),
                });
            }
        }
        Ok(())
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while building or reconfiguring a universe.
///
/// These are always raised before any step runs; a failed
/// reconfiguration leaves the universe untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A universe needs at least one dimension.
    ZeroDimensions,
    /// The boundary list does not have one policy per axis.
    BoundaryArity {
        /// The universe's dimension count.
        expected: usize,
        /// Number of policies supplied.
        actual: usize,
    },
    /// Topology or neighborhood validation failed.
    Space(SpaceError),
    /// A rule declares a state width outside `1..=64` bits.
    InvalidStateWidth {
        /// The declared width.
        bits: u8,
    },
    /// A rule script failed to load.
    Script(ScriptError),
    /// Existing cells hold states the new rule cannot represent.
    StateOutOfDomain {
        /// The first offending state found.
        state: CellState,
        /// Largest state the rule admits.
        max_state: CellState,
    },
    /// An engine tuning value is invalid.
    InvalidEngine {
        /// What went wrong.
        reason: String,
    },
    /// The cache configuration is invalid.
    InvalidCache {
        /// What went wrong.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroDimensions => write!(f, "a universe needs at least one dimension"),
            Self::BoundaryArity { expected, actual } => {
                write!(f, "expected {expected} boundary policies, got {actual}")
            }
            Self::Space(e) => write!(f, "space: {e}"),
            Self::InvalidStateWidth { bits } => {
                write!(f, "state width must be 1..=64 bits, got {bits}")
            }
            Self::Script(e) => write!(f, "rule script: {e}"),
            Self::StateOutOfDomain { state, max_state } => {
                write!(f, "existing state {state} exceeds the rule's maximum {max_state}")
            }
            Self::InvalidEngine { reason } => write!(f, "invalid engine config: {reason}"),
            Self::InvalidCache { reason } => write!(f, "invalid cache config: {reason}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Space(e) => Some(e),
            Self::Script(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SpaceError> for ConfigError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}

impl From<ScriptError> for ConfigError {
    fn from(e: ScriptError) -> Self {
        Self::Script(e)
    }
}

// ── UniverseConfig ─────────────────────────────────────────────────

/// Complete configuration for constructing a [`Universe`](crate::Universe).
#[derive(Clone)]
pub struct UniverseConfig {
    /// Number of axes. Fixed for the universe's lifetime.
    pub dimensions: usize,
    /// One boundary policy per axis.
    pub boundaries: Vec<BoundaryPolicy>,
    /// How reflected loops identify coordinates. Default: [`Mirror`].
    pub identification: Arc<dyn Identification>,
    /// The transition rule. A universe without one can be edited but not
    /// stepped.
    pub rule: Option<Arc<dyn Rule>>,
    /// Stepping configuration.
    pub engine: EngineConfig,
}

impl UniverseConfig {
    /// An unbounded `dimensions`-axis universe running `rule`.
    pub fn new(dimensions: usize, rule: Arc<dyn Rule>) -> Self {
        Self {
            dimensions,
            boundaries: vec![BoundaryPolicy::Infinite; dimensions],
            identification: Arc::new(Mirror),
            rule: Some(rule),
            engine: EngineConfig::default(),
        }
    }

    /// Replace the boundary policies.
    pub fn with_boundaries(mut self, boundaries: Vec<BoundaryPolicy>) -> Self {
        self.boundaries = boundaries;
        self
    }

    /// Replace the engine configuration.
    pub fn with_engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Validate all structural invariants.
    ///
    /// This is a pure validation pass; the universe constructor builds the
    /// topology and rule state again from the same inputs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let topology = self.topology()?;
        self.engine.validate()?;
        if let Some(rule) = &self.rule {
            codec_for(rule.as_ref())?;
            rule.shape()
                .compile(topology.dimensions(), &self.engine.shape_limits())?;
        }
        Ok(())
    }

    pub(crate) fn topology(&self) -> Result<Topology, ConfigError> {
        if self.dimensions == 0 {
            return Err(ConfigError::ZeroDimensions);
        }
        if self.boundaries.len() != self.dimensions {
            return Err(ConfigError::BoundaryArity {
                expected: self.dimensions,
                actual: self.boundaries.len(),
            });
        }
        Ok(Topology::with_identification(
            self.boundaries.clone(),
            Arc::clone(&self.identification),
        )?)
    }
}

impl fmt::Debug for UniverseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniverseConfig")
            .field("dimensions", &self.dimensions)
            .field("boundaries", &self.boundaries)
            .field("rule", &self.rule.as_ref().map(|r| r.name().to_string()))
            .field("engine", &self.engine)
            .finish()
    }
}

/// The state codec for a rule's declared width.
pub(crate) fn codec_for(rule: &dyn Rule) -> Result<StateCodec, ConfigError> {
    let bits = rule.state_bits();
    StateCodec::new(bits).ok_or(ConfigError::InvalidStateWidth { bits })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellua_rule::TotalisticRule;

    fn life_config() -> UniverseConfig {
        UniverseConfig::new(2, Arc::new(TotalisticRule::life()))
    }

    #[test]
    fn default_config_validates() {
        assert!(life_config().validate().is_ok());
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn boundary_arity_mismatch() {
        let cfg = life_config().with_boundaries(vec![BoundaryPolicy::Infinite]);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::BoundaryArity {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn zero_dimensions_rejected() {
        let mut cfg = life_config();
        cfg.dimensions = 0;
        cfg.boundaries.clear();
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroDimensions));
    }

    #[test]
    fn range_above_engine_limit_rejected() {
        let rule = TotalisticRule::parse("B3/S23/R3").unwrap();
        let cfg = UniverseConfig::new(1, Arc::new(rule)).with_engine(EngineConfig {
            max_range: 2,
            ..EngineConfig::default()
        });
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Space(SpaceError::RangeTooLarge { range: 3, max: 2 }))
        ));
    }

    #[test]
    fn engine_knobs_validated() {
        let bad_range = EngineConfig {
            max_range: MAX_RANGE + 1,
            ..EngineConfig::default()
        };
        assert!(matches!(bad_range.validate(), Err(ConfigError::InvalidEngine { .. })));

        let bad_shards = EngineConfig {
            cache: CacheConfig {
                shards: 3,
                ..CacheConfig::default()
            },
            ..EngineConfig::default()
        };
        assert!(matches!(bad_shards.validate(), Err(ConfigError::InvalidCache { .. })));

        // Cache settings are ignored when the cache is off.
        let off = EngineConfig {
            cache: CacheConfig {
                shards: 3,
                ..CacheConfig::disabled()
            },
            ..EngineConfig::default()
        };
        assert!(off.validate().is_ok());

        let bad_verify = EngineConfig {
            verify: Some(VerifyConfig { sample_every: 0 }),
            ..EngineConfig::default()
        };
        assert!(bad_verify.validate().is_err());
    }

    #[test]
    fn worker_count_clamped() {
        let cfg = EngineConfig {
            worker_count: Some(0),
            ..EngineConfig::default()
        };
        assert_eq!(cfg.resolved_worker_count(), 1);
        let cfg = EngineConfig {
            worker_count: Some(1000),
            ..EngineConfig::default()
        };
        assert_eq!(cfg.resolved_worker_count(), 64);
        assert!((1..=64).contains(&EngineConfig::default().resolved_worker_count()));
    }

    #[test]
    fn config_error_chains_source() {
        let err = ConfigError::from(SpaceError::ZeroDimensions);
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("space:"));
    }
}
