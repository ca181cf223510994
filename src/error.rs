//! Error types for the cue engine and its output layers.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, CueError>;

/// Errors raised below the [`AudioCueEngine`](crate::AudioCueEngine) boundary.
///
/// The engine itself never returns these; it logs them and degrades to silence.
#[derive(Error, Debug)]
pub enum CueError {
    /// No audio output device is present (or the `cpal_sink` feature is off)
    #[error("no audio output device available")]
    NoOutputDevice,

    /// The device refused to report a usable stream configuration
    #[error("device configuration error: {0}")]
    DeviceConfig(String),

    /// Building the output stream failed
    #[error("failed to build output stream: {0}")]
    BuildStream(String),

    /// Starting the output stream failed
    #[error("failed to start output stream: {0}")]
    PlayStream(String),

    /// The render side has not drained the command queue fast enough
    #[error("command queue is full")]
    CommandQueueFull,

    /// A configuration value is out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error (config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
