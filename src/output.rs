//! Where an engine gets its output context from.
//!
//! [`AudioCueEngine`](crate::AudioCueEngine) opens its context lazily, on the
//! first [`initialize`](crate::AudioCueEngine::initialize) call. The
//! [`OutputProvider`] decides what that context is: the default sound card,
//! an in-process offline renderer, or nothing at all.

use crate::config::CueConfig;
use crate::context::{AudioContext, ContextOptions};
use crate::error::{CueError, Result};

/// Opens the output context for an engine.
pub trait OutputProvider {
    /// Called at most once per engine; an error leaves the engine unsupported.
    fn open(&mut self, config: &CueConfig) -> Result<AudioContext>;
}

impl<F> OutputProvider for F
where
    F: FnMut(&CueConfig) -> Result<AudioContext>,
{
    fn open(&mut self, config: &CueConfig) -> Result<AudioContext> {
        self(config)
    }
}

/// The host's default output device.
///
/// Without the `cpal_sink` feature there is no device backend and opening
/// always fails with [`CueError::NoOutputDevice`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultDevice;

impl OutputProvider for DefaultDevice {
    #[cfg(feature = "cpal_sink")]
    fn open(&mut self, config: &CueConfig) -> Result<AudioContext> {
        AudioContext::default_output(&ContextOptions::from(config))
    }

    #[cfg(not(feature = "cpal_sink"))]
    fn open(&mut self, _config: &CueConfig) -> Result<AudioContext> {
        Err(CueError::NoOutputDevice)
    }
}

/// An offline context at the configured `offline_sample_rate`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline {
    /// Open the context suspended, the way a browser hands out an audio
    /// context before any user gesture
    pub start_suspended: bool,
}

impl Offline {
    pub fn suspended() -> Self {
        Self { start_suspended: true }
    }
}

impl OutputProvider for Offline {
    fn open(&mut self, config: &CueConfig) -> Result<AudioContext> {
        let ctx = AudioContext::offline(config.offline_sample_rate, &ContextOptions::from(config));
        Ok(if self.start_suspended { ctx.start_suspended() } else { ctx })
    }
}

/// An environment with no audio support at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOutput;

impl OutputProvider for NoOutput {
    fn open(&mut self, _config: &CueConfig) -> Result<AudioContext> {
        Err(CueError::NoOutputDevice)
    }
}
