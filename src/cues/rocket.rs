//! Rocket: a noise roar opening up through a low-pass, over a rising whistle.

use std::sync::Arc;

use crate::nodes::{FilterKind, Waveform};
use crate::param::Param;
use crate::program::{CueKind, Filter, Program, Voice};
use crate::tool::Tool;

/// The low-pass sweep finishes after at most this many seconds.
const SWEEP_SECS: f64 = 2.0;

/// Both voices ring on this long after the envelopes reach 0.
pub(crate) const TAIL_SECS: f64 = 0.1;

/// Low-pass resonance of 1 dB, as a linear Q (10^(1/20)).
const ROAR_Q: f32 = 1.122_018_5;

pub fn program(t: f64, duration: f64, noise: Arc<[f32]>) -> Program {
    let end = t + duration;
    let stop = end + TAIL_SECS;

    let mut cutoff = Param::new(200.0);
    cutoff
        .set_value_at_time(200.0, t)
        .exponential_ramp_to_value_at_time(1000.0, t + SWEEP_SECS.min(duration));

    let mut roar = Param::new(0.0);
    roar.set_value_at_time(0.0, t)
        .linear_ramp_to_value_at_time(0.8, t + 0.2)
        .linear_ramp_to_value_at_time(0.0, end);

    let mut pitch = Param::new(100.0);
    pitch
        .set_value_at_time(100.0, t)
        .exponential_ramp_to_value_at_time(600.0, end);

    let mut whistle = Param::new(0.1);
    whistle
        .set_value_at_time(0.1, t)
        .linear_ramp_to_value_at_time(0.0, end);

    let mut program = Program::new(CueKind::Tool(Tool::Rocket), t);
    program
        .push(Voice::noise(noise, roar, t, stop).with_filter(Filter::new(FilterKind::Lowpass, cutoff, ROAR_Q)))
        .push(Voice::oscillator(Waveform::Sine, pitch, whistle, t, stop));
    program
}
