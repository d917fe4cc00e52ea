//! Stepping engine and universe API for Cellua.
//!
//! A [`Universe`] combines a topology, a sparse grid and a rule. Each
//! call to [`Universe::step`] advances whole generations:
//!
//! ```text
//! snapshot(g) ──► candidates ──► evaluate (1..N workers) ──► grid(g+1)
//!                  live cells +      resolve neighbors          │
//!                  their reach       cache / rule / verify      ▼
//!                                                         commit (Arc swap)
//! ```
//!
//! Evaluation only ever reads the committed snapshot, so the result does
//! not depend on order or worker count. A generation is committed only
//! when every candidate succeeded (or was substituted under
//! [`FailurePolicy::SubstituteDefault`]).

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod cancel;
mod candidates;
pub mod config;
pub mod metrics;
mod stepper;
pub mod universe;

pub use cache::{CacheStats, TransitionCache};
pub use cancel::CancelToken;
pub use config::{
    CacheConfig, ConfigError, EngineConfig, FailurePolicy, UniverseConfig, VerifyConfig,
};
pub use metrics::StepMetrics;
pub use stepper::MAX_STEP_WARNINGS;
pub use universe::{EditError, StepFailure, StepOutcome, Universe};
