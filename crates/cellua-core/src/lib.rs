//! Core types and traits for the Cellua cellular-automaton engine.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Cellua workspace:
//! coordinates, generation ids, cell states and their codec, error
//! types, and the read-only snapshot traits.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod state;
pub mod traits;

pub use error::{RuleError, RuleEvaluationError, StepError};
pub use id::{Coord, Generation};
pub use state::{CellState, StateCodec, QUIESCENT};
pub use traits::{CellReader, SnapshotAccess};
