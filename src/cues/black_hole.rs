//! Black hole: a sine sinking toward sub-bass with a wobbling level.

use crate::nodes::Waveform;
use crate::param::{Lfo, Param};
use crate::program::{CueKind, Program, Voice};
use crate::tool::Tool;

const WOBBLE_HZ: f32 = 8.0;
const WOBBLE_DEPTH: f32 = 0.3;

pub fn program(t: f64, duration: f64) -> Program {
    let end = t + duration;

    let mut pitch = Param::new(100.0);
    pitch
        .set_value_at_time(100.0, t)
        .exponential_ramp_to_value_at_time(30.0, end);

    let mut gain = Param::new(0.0).with_lfo(Lfo::new(Waveform::Sine, WOBBLE_HZ, WOBBLE_DEPTH, t));
    gain.set_value_at_time(0.0, t)
        .linear_ramp_to_value_at_time(0.6, t + 0.5)
        .linear_ramp_to_value_at_time(0.0, end);

    let mut program = Program::new(CueKind::Tool(Tool::BlackHole), t);
    program.push(Voice::oscillator(Waveform::Sine, pitch, gain, t, end));
    program
}
