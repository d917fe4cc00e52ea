//! Sparse cell storage for Cellua universes.
//!
//! The [`GridStore`] holds only non-quiescent cells, so its size tracks
//! the live population rather than the addressable space. Committed
//! generations are frozen into [`GenerationSnapshot`]s and shared behind
//! an `Arc`:
//!
//! ```text
//! Universe
//! ├── Arc<GenerationSnapshot>  (current, read by stepper + external readers)
//! └── Arc<GenerationSnapshot>  (generation 0, kept for reset)
//! ```
//!
//! A step reads one snapshot and builds a fresh store for the next; the
//! swap of the `Arc` is the only commit point.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod snapshot;
pub mod store;

pub use snapshot::{GenerationSnapshot, SharedSnapshot};
pub use store::GridStore;
