//! Synthesis programs for every cue.
//!
//! Each builder is a pure function of the trigger time `t` (context seconds),
//! the configured durations and, where randomness is involved, a caller-owned
//! RNG. Nothing here touches the audio thread; the resulting [`Program`] is
//! shipped to the renderer in one piece.
//!
//! | Cue        | Voices                          | Stops at  |
//! |------------|---------------------------------|-----------|
//! | rocket     | filtered noise + rising whistle | t + d + 0.1 |
//! | shredder   | band-passed noise, sawtooth LFO | t + d     |
//! | bubble     | short sine pops                 | last pop + 0.2 |
//! | black hole | falling sine, tremolo           | t + d     |
//! | chime      | C major chord, staggered attack | t + d + 0.1 |

pub mod black_hole;
pub mod bubble;
pub mod chime;
pub mod rocket;
pub mod shredder;

use std::sync::Arc;

use rand::Rng;

use crate::config::CueConfig;
use crate::nodes::white_noise;
use crate::program::Program;
use crate::tool::Tool;

/// Generate the noise buffer for one program: `seconds` of white noise at
/// `sample_rate`, at least one sample long.
pub fn noise_buffer<R: Rng + ?Sized>(rng: &mut R, sample_rate: u32, seconds: f32) -> Arc<[f32]> {
    let len = (sample_rate as f64 * seconds.max(0.0) as f64).round() as usize;
    white_noise(rng, len.max(1))
}

/// Build the program for `tool`, triggered at context time `t`.
pub fn tool_program<R: Rng + ?Sized>(
    tool: Tool,
    t: f64,
    sample_rate: u32,
    config: &CueConfig,
    rng: &mut R,
) -> Program {
    let timings = &config.timings;
    match tool {
        Tool::Rocket => {
            let noise = noise_buffer(rng, sample_rate, config.noise_seconds);
            rocket::program(t, timings.rocket, noise)
        }
        Tool::Shredder => {
            let noise = noise_buffer(rng, sample_rate, config.noise_seconds);
            shredder::program(t, timings.shredder, noise)
        }
        Tool::Bubble => bubble::program(t, timings.bubble_count, timings.bubble_spacing, rng),
        Tool::BlackHole => black_hole::program(t, timings.black_hole),
    }
}

/// Build the completion chime triggered at context time `t`.
pub fn completion_program(t: f64, config: &CueConfig) -> Program {
    chime::program(t, config.timings.chime)
}
