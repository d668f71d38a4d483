//! Error types for the Ranger Danger world core.
//!
//! Runtime streaming conditions (unresolved chunk, empty explored stack,
//! occupied target position) are recoverable states, not errors; they are
//! expressed as `Option`/fallback returns at their call sites. The error
//! types here cover configuration and validation failures only.

use thiserror::Error;

/// Configuration and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error while reading or writing a config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// Config file could not be serialized
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// A parameter is outside its allowed range
    #[error("Invalid {field}: {reason}")]
    OutOfRange {
        /// Name of the offending parameter
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// The chunk catalog has no prefabs registered
    #[error("Chunk catalog is empty")]
    EmptyCatalog,

    /// The ground texture table is malformed
    #[error("Invalid ground texture table: {0}")]
    TextureTable(String),
}

impl ConfigError {
    /// Shorthand for an out-of-range parameter error.
    #[must_use]
    pub fn out_of_range(field: &'static str, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for configuration and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;
