//! Shredder: band-passed noise with a fast sawtooth sweep on the center frequency.

use std::sync::Arc;

use crate::nodes::{FilterKind, Waveform};
use crate::param::{Lfo, Param};
use crate::program::{CueKind, Filter, Program, Voice};
use crate::tool::Tool;

const CENTER_HZ: f32 = 400.0;
const LFO_HZ: f32 = 15.0;
const LFO_DEPTH_HZ: f32 = 500.0;

pub fn program(t: f64, duration: f64, noise: Arc<[f32]>) -> Program {
    let end = t + duration;

    let center = Param::new(CENTER_HZ).with_lfo(Lfo::new(Waveform::Sawtooth, LFO_HZ, LFO_DEPTH_HZ, t));

    let mut gain = Param::new(0.0);
    gain.set_value_at_time(0.0, t)
        .linear_ramp_to_value_at_time(0.5, t + 0.1)
        .set_value_at_time(0.5, end - 0.1)
        .linear_ramp_to_value_at_time(0.0, end);

    let mut program = Program::new(CueKind::Tool(Tool::Shredder), t);
    program.push(Voice::noise(noise, gain, t, end).with_filter(Filter::new(FilterKind::Bandpass, center, 1.0)));
    program
}
