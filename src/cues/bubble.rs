//! Bubble: a run of short sine pops with randomized pitch and timing.

use rand::Rng;

use crate::nodes::Waveform;
use crate::param::Param;
use crate::program::{CueKind, Program, Voice};
use crate::tool::Tool;

/// Maximum random delay added to each pop
const JITTER: f64 = 0.1;
/// Length of a single pop, including its tail
const POP_SECS: f64 = 0.2;

/// Latest possible stop of a run of `count` pops, relative to the trigger.
pub(crate) fn max_extent(count: usize, spacing: f64) -> f64 {
    count.saturating_sub(1) as f64 * spacing + JITTER + POP_SECS
}

/// Build `count` pops, nominally `spacing` seconds apart.
///
/// Per pop, three uniform draws are taken from `rng` in order: the onset
/// jitter, the start pitch and the end pitch. A seeded RNG therefore yields the
/// same program every time.
pub fn program<R: Rng + ?Sized>(t: f64, count: usize, spacing: f64, rng: &mut R) -> Program {
    let mut program = Program::new(CueKind::Tool(Tool::Bubble), t);

    for i in 0..count {
        let offset = i as f64 * spacing + rng.gen::<f64>() * JITTER;
        let from = 400.0 + rng.gen::<f32>() * 400.0;
        let to = 1200.0 + rng.gen::<f32>() * 400.0;
        let at = t + offset;

        let mut pitch = Param::new(from);
        pitch
            .set_value_at_time(from, at)
            .exponential_ramp_to_value_at_time(to, at + 0.1);

        let mut gain = Param::new(0.0);
        gain.set_value_at_time(0.0, at)
            .linear_ramp_to_value_at_time(0.3, at + 0.02)
            .exponential_ramp_to_value_at_time(0.01, at + 0.15);

        program.push(Voice::oscillator(Waveform::Sine, pitch, gain, at, at + POP_SECS));
    }

    program
}
