//! Periodic oscillator with an automatable frequency

use dasp_graph::{Buffer, Input};

use crate::node::{AudioNode, ProcessContext};
use crate::param::Param;

/// Oscillator waveform shapes.
///
/// The sawtooth is naive (not band-limited); cue programs only run it at LFO
/// rates. Both shapes start at 0 and rise.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Sawtooth,
}

impl Waveform {
    /// Sample the waveform at `phase` in [0, 1). Output is in [-1, 1].
    #[inline]
    pub fn sample(self, phase: f64) -> f32 {
        let v = match self {
            Waveform::Sine => (phase * core::f64::consts::TAU).sin(),
            Waveform::Sawtooth => {
                if phase < 0.5 { 2.0 * phase } else { 2.0 * phase - 2.0 }
            }
        };
        v as f32
    }
}

/// A mono oscillator whose frequency follows a [`Param`].
///
/// Phase is 0 at the start frame; samples before it are silent and do not
/// advance the phase.
pub struct Oscillator {
    waveform: Waveform,
    frequency: Param,
    phase: f64,
    start: u64,
}

impl Oscillator {
    pub fn new(waveform: Waveform, frequency: Param) -> Self {
        Self {
            waveform,
            frequency,
            phase: 0.0,
            start: 0,
        }
    }

    /// Hold the phase at 0 until clock frame `frame` (builder pattern).
    pub fn starting_at(mut self, frame: u64) -> Self {
        self.start = frame;
        self
    }

    /// Fixed-frequency sine
    pub fn sine(frequency: f32) -> Self {
        Self::new(Waveform::Sine, Param::new(frequency))
    }

    #[inline]
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    #[inline]
    pub fn frequency(&self) -> &Param {
        &self.frequency
    }
}

impl AudioNode for Oscillator {
    type Message = ();

    fn process(
        &mut self,
        ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        _inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        let (first, rest) = match outputs.split_first_mut() {
            Some(split) => split,
            None => return,
        };

        let rate = ctx.sample_rate as f64;
        for (i, sample) in first.iter_mut().enumerate() {
            if ctx.frame + (i as u64) < self.start {
                *sample = 0.0;
                continue;
            }
            *sample = self.waveform.sample(self.phase);

            let freq = self.frequency.value_at(ctx.time_at(i)).max(0.0) as f64;
            self.phase += freq / rate;
            self.phase -= self.phase.floor();
        }

        // Copy to remaining output channels (if any)
        for buffer in rest.iter_mut() {
            buffer.copy_from_slice(first);
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 0 }

    #[inline]
    fn num_outputs(&self) -> usize { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(frame: u64) -> ProcessContext {
        ProcessContext { sample_rate: 6400, buffer_size: Buffer::LEN, frame }
    }

    #[test]
    fn waveforms_start_at_zero_and_rise() {
        assert_eq!(Waveform::Sine.sample(0.0), 0.0);
        assert!((Waveform::Sine.sample(0.25) - 1.0).abs() < 1e-6);
        assert_eq!(Waveform::Sawtooth.sample(0.0), 0.0);
        assert_eq!(Waveform::Sawtooth.sample(0.25), 0.5);
        assert_eq!(Waveform::Sawtooth.sample(0.5), -1.0);
        assert_eq!(Waveform::Sawtooth.sample(0.75), -0.5);
    }

    #[test]
    fn sine_has_expected_period() {
        // 100 Hz at 6400 Hz = 64 samples per cycle, exactly one block
        let mut osc = Oscillator::sine(100.0);
        let mut out = [Buffer::default()];
        osc.process(&ctx(0), core::iter::empty(), &[], &mut out);

        assert!(out[0][0].abs() < 1e-6);
        assert!((out[0][16] - 1.0).abs() < 1e-4);
        assert!((out[0][48] + 1.0).abs() < 1e-4);
    }

    #[test]
    fn phase_starts_at_start_frame_mid_block() {
        let mut osc = Oscillator::sine(100.0).starting_at(80);
        let mut out = [Buffer::default()];

        osc.process(&ctx(0), core::iter::empty(), &[], &mut out);
        assert!(out[0].iter().all(|&s| s == 0.0));

        osc.process(&ctx(64), core::iter::empty(), &[], &mut out);
        assert!(out[0][..16].iter().all(|&s| s == 0.0));
        // Frame 80 is phase 0, a quarter period later is the crest
        assert!(out[0][16].abs() < 1e-6);
        assert!((out[0][32] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn automated_frequency_is_followed() {
        let mut frequency = Param::new(100.0);
        frequency.set_value_at_time(0.0, 0.0);
        let mut osc = Oscillator::new(Waveform::Sine, frequency);
        let mut out = [Buffer::default()];
        osc.process(&ctx(0), core::iter::empty(), &[], &mut out);

        // Zero frequency: phase never advances
        assert!(out[0].iter().all(|s| s.abs() < 1e-6));
        assert_eq!(osc.frequency().value_at(1.0), 0.0);
    }
}
