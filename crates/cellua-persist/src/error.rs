//! Error types for saving and loading images.

use std::fmt;
use std::io;

use cellua_engine::{ConfigError, EditError};

/// Errors that can occur while encoding, decoding or restoring an image.
#[derive(Debug)]
pub enum PersistError {
    /// An I/O error occurred during read or write.
    Io(io::Error),
    /// The data does not start with the expected `b"CELL"` magic bytes.
    InvalidMagic,
    /// The format version is not supported by this build.
    UnsupportedVersion {
        /// The version found in the data.
        found: u8,
    },
    /// The image could not be decoded (corrupt or inconsistent data).
    Malformed {
        /// Human-readable description of what went wrong.
        detail: String,
    },
    /// The image names a native rule that the resolver does not know.
    MissingRule {
        /// The rule name stored in the image.
        name: String,
    },
    /// The resolved rule declares a different state width than the image.
    RuleMismatch {
        /// The rule name stored in the image.
        name: String,
        /// State width stored in the image.
        expected_bits: u8,
        /// State width declared by the resolved rule.
        found_bits: u8,
    },
    /// The restored configuration was rejected.
    Config(ConfigError),
    /// A stored cell was rejected by the restored universe.
    Cell(EditError),
}

impl fmt::Display for PersistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::InvalidMagic => write!(f, "invalid magic bytes (expected b\"CELL\")"),
            Self::UnsupportedVersion { found } => {
                write!(f, "unsupported format version {found}")
            }
            Self::Malformed { detail } => write!(f, "malformed image: {detail}"),
            Self::MissingRule { name } => write!(f, "no rule named {name:?} is available"),
            Self::RuleMismatch {
                name,
                expected_bits,
                found_bits,
            } => write!(
                f,
                "rule {name:?} has {found_bits} state bits, image expects {expected_bits}"
            ),
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Cell(e) => write!(f, "invalid cell: {e}"),
        }
    }
}

impl std::error::Error for PersistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Cell(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for PersistError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ConfigError> for PersistError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<EditError> for PersistError {
    fn from(e: EditError) -> Self {
        Self::Cell(e)
    }
}
