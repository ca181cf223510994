//! Completion chime: C5 E5 G5 C6 with a slightly staggered attack.

use crate::nodes::Waveform;
use crate::param::Param;
use crate::program::{CueKind, Program, Voice};

/// Chord tones in Hz
pub const CHORD: [f32; 4] = [523.25, 659.25, 783.99, 1046.50];

const PEAK: f32 = 0.15;
const FLOOR: f32 = 0.001;

pub fn program(t: f64, duration: f64) -> Program {
    let end = t + duration;
    let mut program = Program::new(CueKind::Chime, t);

    for (i, &freq) in CHORD.iter().enumerate() {
        let mut gain = Param::new(0.0);
        gain.set_value_at_time(0.0, t)
            .linear_ramp_to_value_at_time(PEAK, t + 0.1 + 0.05 * i as f64)
            .exponential_ramp_to_value_at_time(FLOOR, end);

        program.push(Voice::oscillator(Waveform::Sine, Param::new(freq), gain, t, end + 0.1));
    }

    program
}
