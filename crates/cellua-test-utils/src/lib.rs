//! Test fixtures and rule doubles for Cellua development.
//!
//! [`fixtures`] holds small [`Rule`](cellua_rule::Rule) implementations
//! with predictable (or deliberately broken) behavior; [`patterns`]
//! builds deterministic cell layouts.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;
pub mod patterns;

pub use fixtures::{CountingRule, FailingRule, GrowRule, IncrementRule, PanickingRule};
pub use patterns::{blinker, glider, soup};
