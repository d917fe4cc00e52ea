//! Cellua: an N-dimensional cellular automaton engine.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Cellua sub-crates. For most users, adding `cellua` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use cellua::prelude::*;
//!
//! // Conway's Life on a 16×16 torus.
//! let config = UniverseConfig::new(2, Arc::new(TotalisticRule::life()))
//!     .with_boundaries(vec![BoundaryPolicy::looped(0, 15); 2]);
//! let mut universe = Universe::new(config).unwrap();
//!
//! // A glider.
//! for [x, y] in [[1, 0], [2, 1], [0, 2], [1, 2], [2, 2]] {
//!     universe.set_cell(&[x, y], 1).unwrap();
//! }
//! let outcome = universe.step(4, None).unwrap();
//! assert_eq!(outcome.advanced, 4);
//! assert_eq!(universe.population(), 5);
//! assert_eq!(universe.get_cell(&[3, 3]), 1);
//!
//! // Rules can also be loaded from scripts.
//! universe
//!     .load_rule_script("name: highlife\ntransition: if state != 0 then live == 2 || live == 3 else live == 3 || live == 6")
//!     .unwrap();
//! assert_eq!(universe.rule().unwrap().name(), "highlife");
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `cellua-core` | Coordinates, states, generations, error types, reader traits |
//! | [`space`] | `cellua-space` | Boundary policies, topologies, neighborhoods, symmetry groups |
//! | [`grid`] | `cellua-grid` | Sparse cell storage and generation snapshots |
//! | [`rule`] | `cellua-rule` | The rule contract, totalistic rules and rule scripts |
//! | [`engine`] | `cellua-engine` | Universes, stepping, caching and metrics |
//! | [`persist`] | `cellua-persist` | Binary save/load and state hashing |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and errors (`cellua-core`).
///
/// Contains [`types::Coord`], [`types::CellState`], [`types::Generation`],
/// the error taxonomy, and the reader traits ([`types::CellReader`],
/// [`types::SnapshotAccess`]).
pub use cellua_core as types;

/// Coordinate spaces and neighborhoods (`cellua-space`).
///
/// Per-axis [`space::BoundaryPolicy`] values combine into a
/// [`space::Topology`]; rules declare a [`space::NeighborhoodShape`].
pub use cellua_space as space;

/// Sparse cell storage (`cellua-grid`).
pub use cellua_grid as grid;

/// Transition rules (`cellua-rule`).
///
/// The [`rule::Rule`] trait is the main extension point for user-defined
/// automata; [`rule::TotalisticRule`] and [`rule::ScriptRule`] are the
/// built-in implementations.
pub use cellua_rule as rule;

/// The stepping engine (`cellua-engine`).
pub use cellua_engine as engine;

/// Saving, loading and hashing universes (`cellua-persist`).
pub use cellua_persist as persist;

/// Common imports for typical Cellua usage.
///
/// ```rust
/// use cellua::prelude::*;
/// ```
pub mod prelude {
    // Core types and traits
    pub use cellua_core::{
        CellReader, CellState, Coord, Generation, SnapshotAccess, StateCodec, QUIESCENT,
    };

    // Errors
    pub use cellua_core::{RuleError, RuleEvaluationError, StepError};

    // Space
    pub use cellua_space::{BoundaryPolicy, NeighborhoodShape, Region, SymmetryGroup, Topology};

    // Rules
    pub use cellua_rule::{Awareness, CellContext, Rule, ScriptRule, TotalisticRule};

    // Engine
    pub use cellua_engine::{
        CancelToken, ConfigError, EngineConfig, FailurePolicy, StepMetrics, StepOutcome,
        Universe, UniverseConfig,
    };

    // Persistence
    pub use cellua_persist::{universe_hash, UniverseImage};
}
