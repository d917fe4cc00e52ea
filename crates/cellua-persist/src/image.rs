//! Capturing universes into images and restoring them.

use std::sync::Arc;

use cellua_core::{CellState, Coord, Generation};
use cellua_engine::{ConfigError, EngineConfig, Universe, UniverseConfig};
use cellua_rule::{Rule, ScriptRule, TotalisticRule};
use cellua_space::{BoundaryPolicy, Mirror};

use crate::error::PersistError;

/// How a saved universe names its rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleRef {
    /// The rule's name.
    pub name: String,
    /// Script source, for rules that can be rebuilt from text.
    pub source: Option<String>,
}

/// Looks up native rules by name when an image is restored.
pub trait RuleResolver {
    /// The rule called `name`, if this resolver provides it.
    fn resolve(&self, name: &str) -> Option<Arc<dyn Rule>>;
}

impl<F> RuleResolver for F
where
    F: Fn(&str) -> Option<Arc<dyn Rule>>,
{
    fn resolve(&self, name: &str) -> Option<Arc<dyn Rule>> {
        self(name)
    }
}

/// Resolves names that are totalistic rulestrings (`B3/S23`, `B5/S45/NV`).
#[derive(Clone, Copy, Debug, Default)]
pub struct RulestringResolver;

impl RuleResolver for RulestringResolver {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Rule>> {
        let rule = TotalisticRule::parse(name).ok()?;
        Some(Arc::new(rule))
    }
}

/// A universe at one generation, independent of any live engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UniverseImage {
    /// Number of axes.
    pub dimensions: usize,
    /// One boundary policy per axis.
    pub boundaries: Vec<BoundaryPolicy>,
    /// The loaded rule, if any.
    pub rule: Option<RuleRef>,
    /// Width of the state domain in bits.
    pub state_bits: u8,
    /// The saved generation number.
    pub generation: Generation,
    /// Live cells in ascending coordinate order.
    pub cells: Vec<(Coord, CellState)>,
}

impl UniverseImage {
    /// Capture the current generation of `universe`.
    ///
    /// A custom reflected-loop identification is not recorded; restored
    /// universes use [`Mirror`].
    pub fn capture(universe: &Universe) -> Self {
        let rule = universe.rule().map(|r| RuleRef {
            name: r.name().to_string(),
            source: r.source().map(str::to_string),
        });
        Self {
            dimensions: universe.dimension_count(),
            boundaries: universe.topology().policies().to_vec(),
            rule,
            state_bits: universe.codec().bits(),
            generation: universe.current_generation(),
            cells: universe.snapshot().grid().sorted_cells(),
        }
    }

    /// Build a universe from this image.
    ///
    /// Rules with a script source are re-parsed; others are looked up by
    /// name through `resolver`. The restored generation becomes the
    /// universe's reset point.
    pub fn restore(
        &self,
        resolver: &dyn RuleResolver,
        engine: EngineConfig,
    ) -> Result<Universe, PersistError> {
        let rule = match &self.rule {
            Some(rule_ref) => Some(self.resolve_rule(rule_ref, resolver)?),
            None => None,
        };
        let config = UniverseConfig {
            dimensions: self.dimensions,
            boundaries: self.boundaries.clone(),
            identification: Arc::new(Mirror),
            rule,
            engine,
        };
        let mut universe = Universe::new(config)?;
        universe.restore_generation(self.generation, self.cells.iter().cloned())?;
        log::info!(
            "restored {}-dimensional universe at generation {} ({} cells)",
            self.dimensions,
            self.generation,
            self.cells.len()
        );
        Ok(universe)
    }

    fn resolve_rule(
        &self,
        rule_ref: &RuleRef,
        resolver: &dyn RuleResolver,
    ) -> Result<Arc<dyn Rule>, PersistError> {
        let rule: Arc<dyn Rule> = match &rule_ref.source {
            Some(source) => {
                let script = ScriptRule::parse(source).map_err(ConfigError::from)?;
                Arc::new(script)
            }
            None => resolver
                .resolve(&rule_ref.name)
                .ok_or_else(|| PersistError::MissingRule {
                    name: rule_ref.name.clone(),
                })?,
        };
        if rule.state_bits() != self.state_bits {
            return Err(PersistError::RuleMismatch {
                name: rule_ref.name.clone(),
                expected_bits: self.state_bits,
                found_bits: rule.state_bits(),
            });
        }
        Ok(rule)
    }
}
