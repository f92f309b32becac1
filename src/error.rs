//! Error types for the remapping core.
//!
//! The event queue and the manipulators never fail at runtime: malformed
//! events degrade to "no transformation applied". Errors only surface while
//! loading manipulator configuration or while driving the processing thread.

use thiserror::Error;

/// Result type alias for kbremap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or running the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Manipulator configuration was rejected at load time.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// JSON text could not be decoded.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input was sent after the processing thread stopped.
    #[error("pipeline is not running")]
    NotRunning,

    /// Thread-related error.
    #[error("thread error: {0}")]
    ThreadError(String),

    /// The input channel of the processing thread was closed.
    #[error("pipeline input channel is closed")]
    ChannelClosed,
}

/// Structural problems found while turning JSON into manipulator definitions.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A manipulator definition was not a JSON object.
    #[error("manipulator must be an object: {0}")]
    NotAnObject(String),

    /// The manipulator `type` is not one this crate implements.
    #[error("unknown manipulator type `{0}`")]
    UnknownManipulatorType(String),

    /// The condition `type` is not one this crate implements.
    #[error("unknown condition type `{0}`")]
    UnknownConditionType(String),

    /// A regular expression inside a condition failed to compile.
    #[error("invalid regex `{pattern}`: {source}")]
    InvalidRegex {
        /// The offending pattern.
        pattern: String,
        /// Compilation error.
        source: regex::Error,
    },

    /// A field had the wrong JSON type.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the field.
        field: String,
        /// What was wrong with it.
        reason: String,
    },
}
