//! moodcue - procedural audio cues on a lock-free audio graph
//!
//! A mood-note toy lets the user destroy a note with one of four [`Tool`]s and
//! then plays a short chime once the destruction animation is over. This crate
//! synthesizes those sounds. Nothing is sample-based: every cue is a
//! [`Program`] of oscillators, looped noise, biquad filters and automated gain
//! envelopes, scheduled against the output clock and dropped once it ends.
//!
//! ```
//! use moodcue::{AudioCueEngine, CueConfig, Offline, Tool};
//!
//! let mut engine = AudioCueEngine::new(CueConfig::default(), Offline::default());
//! engine.initialize();
//!
//! engine.play_tool_sound(Tool::Shredder);
//! engine.play_completion_chime();
//!
//! // Offline contexts render on demand
//! let ctx = engine.context_mut().unwrap();
//! let samples = ctx.render(48_000);
//! assert!(samples.iter().any(|&s| s != 0.0));
//! ```
//!
//! Design principles:
//! - One master gain stage per engine; muting is a single gain change
//! - Programs are plain values built on the caller's thread
//! - Nodes receive parameter changes via message ring buffers, not shared state
//! - No locks on the render path
//! - Randomness is injectable, so tests can seed it
//!
//! Enable the `cpal_sink` feature to play through the default sound card with
//! [`DefaultDevice`].

mod graph;
mod node;

pub mod config;
pub mod context;
pub mod cues;
pub mod engine;
pub mod error;
pub mod nodes;
pub mod output;
pub mod param;
pub mod program;
pub mod tool;

#[cfg(feature = "cpal_sink")]
mod device;

pub use config::{CueConfig, CueTimings, DEFAULT_MASTER_GAIN, MAX_TOOL_SECS};
pub use context::{AudioContext, ContextOptions, ContextState};
pub use engine::{AudioCueEngine, EngineState};
pub use error::{CueError, Result};
pub use node::{AudioNode, ProcessContext};
pub use output::{DefaultDevice, NoOutput, Offline, OutputProvider};
pub use param::{Lfo, Param, ParamEvent};
pub use program::{CueKind, Filter, Program, ProgramId, ProgramRecord, ProgramRegistry, Source, Voice};
pub use tool::{ParseToolError, Tool};

#[cfg(feature = "cpal_sink")]
pub use device::CpalDevice;
