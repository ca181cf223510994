//! Engine configuration, loadable from TOML.
//!
//! Every key is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! master_gain = 0.4
//! noise_seconds = 2.0
//!
//! [timings]
//! shredder = 2.5
//! bubble_count = 8
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cues;
use crate::error::{CueError, Result};

/// Master gain applied when unmuted.
pub const DEFAULT_MASTER_GAIN: f32 = 0.4;

/// Every tool program must have stopped this many seconds after its trigger.
pub const MAX_TOOL_SECS: f64 = 3.2;

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    /// Master gain restored on unmute (0.0 - 1.0)
    pub master_gain: f32,
    /// Length of the generated noise buffer in seconds (looped by longer programs)
    pub noise_seconds: f32,
    /// Sample rate used by offline contexts
    pub offline_sample_rate: u32,
    /// Capacity of the command queue between the engine and the renderer
    pub command_queue: usize,
    /// Blocks the realtime renderer stays ahead of the wall clock
    pub lookahead_blocks: u64,
    /// Seconds the host waits before triggering the completion chime.
    ///
    /// Informational: the engine never derives program lengths from it.
    pub completion_delay: f64,
    /// Program durations
    pub timings: CueTimings,
}

impl Default for CueConfig {
    fn default() -> Self {
        Self {
            master_gain: DEFAULT_MASTER_GAIN,
            noise_seconds: 2.0,
            offline_sample_rate: 48_000,
            command_queue: 64,
            lookahead_blocks: 4,
            completion_delay: 4.5,
            timings: CueTimings::default(),
        }
    }
}

/// Durations (seconds) of the synthesis programs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueTimings {
    pub rocket: f64,
    pub shredder: f64,
    pub black_hole: f64,
    pub chime: f64,
    /// Number of bubble pops
    pub bubble_count: usize,
    /// Nominal spacing between bubble pops (each gets up to 0.1s of jitter)
    pub bubble_spacing: f64,
}

impl Default for CueTimings {
    fn default() -> Self {
        Self {
            rocket: 3.0,
            shredder: 2.5,
            black_hole: 3.0,
            chime: 3.0,
            bubble_count: 8,
            bubble_spacing: 0.3,
        }
    }
}

impl CueConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: CueConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.master_gain) {
            return Err(CueError::InvalidConfig(format!(
                "master_gain must be within [0, 1], got {}",
                self.master_gain
            )));
        }
        if !(self.noise_seconds > 0.0) {
            return Err(CueError::InvalidConfig(format!(
                "noise_seconds must be positive, got {}",
                self.noise_seconds
            )));
        }
        if self.offline_sample_rate == 0 {
            return Err(CueError::InvalidConfig("offline_sample_rate must be non-zero".into()));
        }
        if self.command_queue == 0 {
            return Err(CueError::InvalidConfig("command_queue must be non-zero".into()));
        }

        let t = &self.timings;
        for (name, secs) in [
            ("rocket", t.rocket),
            ("shredder", t.shredder),
            ("black_hole", t.black_hole),
            ("chime", t.chime),
        ] {
            // Shaping stages need at least 0.2s to fit
            if !(secs >= 0.2) {
                return Err(CueError::InvalidConfig(format!(
                    "timings.{} must be at least 0.2s, got {}",
                    name, secs
                )));
            }
        }
        if !(t.bubble_spacing >= 0.0) {
            return Err(CueError::InvalidConfig("timings.bubble_spacing must not be negative".into()));
        }
        if t.bubble_count == 0 {
            return Err(CueError::InvalidConfig("timings.bubble_count must be non-zero".into()));
        }

        for (name, stop) in [
            ("rocket", t.rocket + cues::rocket::TAIL_SECS),
            ("shredder", t.shredder),
            ("black_hole", t.black_hole),
            ("bubble", cues::bubble::max_extent(t.bubble_count, t.bubble_spacing)),
        ] {
            // Rounding slack for sums like 3.1 + 0.1
            if stop > MAX_TOOL_SECS + 1e-9 {
                return Err(CueError::InvalidConfig(format!(
                    "{} would stop {:.3}s after its trigger, over the {}s limit",
                    name, stop, MAX_TOOL_SECS
                )));
            }
        }

        Ok(())
    }
}
