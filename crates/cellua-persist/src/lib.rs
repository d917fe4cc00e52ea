//! Save, load and hash Cellua universes.
//!
//! A [`UniverseImage`] is a self-contained description of a universe at
//! one generation: geometry, rule reference, state width and live cells.
//! Images are written with a small custom binary codec and restored into
//! a fresh [`Universe`](cellua_engine::Universe).
//!
//! # Format
//!
//! ```text
//! [MAGIC "CELL"] [VERSION u8]
//! [dimensions u32] [BoundaryPolicy; dimensions]
//! [rule flag u8] ([name str] [source flag u8] [source str]?)?
//! [state_bits u8] [generation u64]
//! [cell_count u64] ([i64; dimensions] [state; byte_width])*
//! ```
//!
//! Cells are written in ascending coordinate order, so equal universes
//! produce identical bytes. [`snapshot_hash`] gives the same guarantee
//! as a 64-bit FNV-1a digest.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod error;
pub mod hash;
pub mod image;

pub use codec::{decode_image, encode_image};
pub use error::PersistError;
pub use hash::{snapshot_hash, universe_hash};
pub use image::{RuleRef, RuleResolver, RulestringResolver, UniverseImage};

/// Magic bytes at the start of every image.
pub const MAGIC: [u8; 4] = *b"CELL";

/// Current binary format version.
pub const FORMAT_VERSION: u8 = 1;
