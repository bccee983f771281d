//! Error handling module for ShrinkX

use thiserror::Error;

/// Main error type for ShrinkX operations
#[derive(Error, Debug)]
pub enum ShrinkXError {
    /// Source extension is not one of the supported media types
    #[error("Unsupported media type: '{extension}'")]
    UnsupportedMedia { extension: String },

    /// Strategy cannot be applied to this kind of media
    #[error("Strategy '{strategy}' is not available for {kind} sources")]
    UnsupportedStrategy { strategy: String, kind: String },

    /// Strategy parameters are out of range or cannot be derived
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// Media probe error
    #[error("Failed to probe media file: {message}")]
    ProbeError { message: String },

    /// Encoder binary could not be launched
    #[error("Failed to launch '{program}': {source}")]
    SpawnError {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Encoder reported a path it could not open
    #[error("Path is too long or does not exist: {path}")]
    PathTooLong { path: String },

    /// Encoder ran out of disk space or hit an I/O failure
    #[error("Process failed.\nError message: {message}")]
    DeviceFull { message: String },

    /// Codec reported an error
    #[error("Codec error: {message}")]
    CodecError { message: String },

    /// Encoder exited unsuccessfully without a recognised diagnostic
    #[error("Encoder exited with {code}: {message}")]
    EncoderFailed { code: String, message: String },

    /// A job is already running on this engine
    #[error("A compression job is already running")]
    JobAlreadyRunning,

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for ShrinkX operations
pub type ShrinkXResult<T> = std::result::Result<T, ShrinkXError>;
