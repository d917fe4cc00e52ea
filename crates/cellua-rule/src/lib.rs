//! Transition rules for Cellua universes.
//!
//! A [`Rule`] maps one cell's state and its ordered neighbor states to
//! the cell's next state. This crate provides:
//!
//! - the [`Rule`] trait and its [`CellContext`] input,
//! - the [`NeighborhoodResolver`], which reads a cell's neighbors through
//!   the universe's topology and canonicalizes them under the rule's
//!   symmetry group,
//! - the [`RuleExecutor`], which contains panics and out-of-domain results
//!   so that one bad cell never takes down a step,
//! - [`TotalisticRule`] for Life-like birth/survival rules, and
//! - [`ScriptRule`], a small sandboxed expression language for
//!   user-supplied rules.
//!
//! # Referential transparency
//!
//! The engine assumes a rule is a pure function of its [`CellContext`].
//! Transition caching and quiescent-cell pruning both depend on it. Rules
//! that keep state across calls are not rejected, but their results under
//! caching are unspecified; the engine's verification mode exists to
//! catch them.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod executor;
pub mod resolver;
pub mod rule;
pub mod script;
pub mod totalistic;

pub use executor::RuleExecutor;
pub use resolver::NeighborhoodResolver;
pub use rule::{Awareness, CellContext, Rule};
pub use script::{ScriptError, ScriptRule, Span};
pub use totalistic::{RulestringError, TotalisticRule};
