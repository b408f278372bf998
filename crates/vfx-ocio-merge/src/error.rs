//! Error types for config merging.
//!
//! Covers the ways a merge can stop:
//! - Conflicts escalated by `error_on_conflict`
//! - Configs that cannot be loaded by name
//! - Reference-space identification failures
//! - Malformed merge recipes

use thiserror::Error;
use vfx_ocio::OcioError;

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Which config of a pair a message refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// The config being converted from.
    Source,
    /// The config being converted to.
    Destination,
}

impl Side {
    /// Lower-case label used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Source => "source",
            Side::Destination => "destination",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while merging configs.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A conflict reported while `error_on_conflict` is set.
    #[error("{0}")]
    Conflict(String),

    /// A base or input config could not be resolved.
    #[error("could not load config '{name}'")]
    ConfigLoad {
        /// Name, path or URI that was tried.
        name: String,
    },

    /// An interchange role points at a color space that does not exist.
    #[error("the role '{role}' refers to a color space that is missing in the {side} config")]
    MissingInterchangeRole {
        /// Role name.
        role: String,
        /// Config holding the role.
        side: Side,
    },

    /// No color space without transforms to act as the reference.
    #[error("the config '{config}' does not have a color space for the reference")]
    NoReferenceSpace {
        /// Name of the config.
        config: String,
    },

    /// Heuristics found no known built-in equivalent.
    #[error("heuristics were not able to find a known color space for '{name}', please set the interchange roles")]
    HeuristicsExhausted {
        /// Config or color space that was being identified.
        name: String,
    },

    /// Heuristics were asked to identify a display-referred space.
    #[error("the heuristics only support scene-referred color spaces, please set the interchange roles")]
    DisplayHeuristicsUnsupported,

    /// Inconsistent state that valid configs never produce.
    #[error("internal merge error: {0}")]
    Internal(String),

    /// Malformed merge recipe.
    #[error("merge recipe error: {0}")]
    Recipe(String),

    /// Error from the color library.
    #[error(transparent)]
    Ocio(#[from] OcioError),
}

impl From<std::io::Error> for MergeError {
    fn from(e: std::io::Error) -> Self {
        MergeError::Ocio(OcioError::Io(e))
    }
}

impl From<serde_yaml::Error> for MergeError {
    fn from(e: serde_yaml::Error) -> Self {
        MergeError::Recipe(e.to_string())
    }
}
