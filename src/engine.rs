//! The public cue engine.
//!
//! ```
//! use moodcue::{AudioCueEngine, CueConfig, EngineState, Offline, Tool};
//!
//! let mut engine = AudioCueEngine::new(CueConfig::default(), Offline::default());
//!
//! // Nothing happens before the first gesture
//! engine.play_tool_sound(Tool::Rocket);
//! assert_eq!(engine.state(), EngineState::Uninitialized);
//!
//! engine.initialize();
//! engine.play_tool_sound(Tool::Rocket);
//! assert_eq!(engine.registry().len(), 1);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::CueConfig;
use crate::context::{AudioContext, ContextState};
use crate::cues;
use crate::output::OutputProvider;
use crate::program::{Program, ProgramRegistry};
use crate::tool::Tool;

/// Lifecycle of an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineState {
    /// `initialize` has not been called yet
    Uninitialized,
    /// Output context open
    Ready,
    /// Opening the output failed; the engine stays silent for good
    Unsupported,
}

/// Turns UI events into short procedural sounds.
///
/// Construct one per application and call [`initialize`](Self::initialize)
/// from the first user gesture. Every operation is infallible from the caller's
/// point of view: failures are logged and degrade to silence.
pub struct AudioCueEngine<R = StdRng> {
    config: CueConfig,
    provider: Box<dyn OutputProvider + Send>,
    context: Option<AudioContext>,
    unsupported: bool,
    muted: bool,
    rng: R,
    registry: ProgramRegistry,
}

impl AudioCueEngine<StdRng> {
    /// An engine with an entropy-seeded random source.
    pub fn new<P>(config: CueConfig, provider: P) -> Self
    where
        P: OutputProvider + Send + 'static,
    {
        Self::with_rng(config, provider, StdRng::from_entropy())
    }
}

impl<R: Rng> AudioCueEngine<R> {
    /// An engine drawing noise and bubble jitter from `rng`.
    ///
    /// An invalid `config` is replaced by the defaults.
    pub fn with_rng<P>(config: CueConfig, provider: P, rng: R) -> Self
    where
        P: OutputProvider + Send + 'static,
    {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                tracing::warn!(%err, "invalid cue configuration, using defaults");
                CueConfig::default()
            }
        };

        Self {
            config,
            provider: Box::new(provider),
            context: None,
            unsupported: false,
            muted: false,
            rng,
            registry: ProgramRegistry::new(),
        }
    }

    /// Open the output on first call, resume it if suspended afterwards.
    ///
    /// If the output cannot be opened the engine becomes
    /// [`Unsupported`](EngineState::Unsupported) and every later call is a no-op.
    pub fn initialize(&mut self) {
        if self.unsupported {
            return;
        }

        if self.context.is_none() {
            match self.provider.open(&self.config) {
                Ok(ctx) => {
                    tracing::info!(sample_rate = ctx.sample_rate(), "audio output ready");
                    self.context = Some(ctx);
                    // A mute toggled before the first gesture still holds
                    if self.muted {
                        self.apply_master_gain();
                    }
                }
                Err(err) => {
                    tracing::warn!(%err, "audio output unavailable, cues disabled");
                    self.unsupported = true;
                    return;
                }
            }
        }

        if let Some(ctx) = &self.context {
            if ctx.state() == ContextState::Suspended {
                ctx.resume();
                tracing::debug!("resumed suspended output");
            }
        }
    }

    /// Silence or restore the master output, effective immediately.
    ///
    /// The flag is kept even before initialization.
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        self.apply_master_gain();
    }

    fn apply_master_gain(&mut self) {
        let value = if self.muted { 0.0 } else { self.config.master_gain };
        if let Some(ctx) = self.context.as_mut() {
            ctx.set_master_gain(value);
            tracing::debug!(value, "master gain set");
        }
    }

    /// Play the sound for `tool`. No-op when muted or not initialized.
    pub fn play_tool_sound(&mut self, tool: Tool) {
        let (t, sample_rate) = match self.audible_context() {
            Some(ctx) => (ctx.current_time(), ctx.sample_rate()),
            None => return,
        };
        let program = cues::tool_program(tool, t, sample_rate, &self.config, &mut self.rng);
        self.submit(program);
    }

    /// Play the completion chord. No-op when muted or not initialized.
    pub fn play_completion_chime(&mut self) {
        let t = match self.audible_context() {
            Some(ctx) => ctx.current_time(),
            None => return,
        };
        let program = cues::completion_program(t, &self.config);
        self.submit(program);
    }

    fn audible_context(&self) -> Option<&AudioContext> {
        if self.muted {
            return None;
        }
        self.context.as_ref()
    }

    fn submit(&mut self, program: Program) {
        let ctx = match self.context.as_mut() {
            Some(ctx) => ctx,
            None => return,
        };

        let now = ctx.current_time();
        self.registry.expire(now);

        let id = self.registry.record(&program);
        let (kind, stop) = (program.kind, program.stop());
        match ctx.schedule(program) {
            Ok(()) => tracing::debug!(%kind, start = now, stop, "cue scheduled"),
            Err(err) => {
                self.registry.remove(id);
                tracing::debug!(%err, %kind, "cue dropped");
            }
        }
    }

    pub fn state(&self) -> EngineState {
        if self.unsupported {
            EngineState::Unsupported
        } else if self.context.is_some() {
            EngineState::Ready
        } else {
            EngineState::Uninitialized
        }
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Programs scheduled and not yet known to be finished.
    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    pub fn config(&self) -> &CueConfig {
        &self.config
    }

    /// The output context, once initialized.
    pub fn context(&self) -> Option<&AudioContext> {
        self.context.as_ref()
    }

    /// Mutable access to the output context, e.g. to drive an offline render.
    pub fn context_mut(&mut self) -> Option<&mut AudioContext> {
        self.context.as_mut()
    }
}

impl<R> std::fmt::Debug for AudioCueEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCueEngine")
            .field("unsupported", &self.unsupported)
            .field("initialized", &self.context.is_some())
            .field("muted", &self.muted)
            .field("live_programs", &self.registry.len())
            .finish()
    }
}
