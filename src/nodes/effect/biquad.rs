//! Biquad filter with an automatable cutoff

use core::f64::consts::PI;

use dasp_graph::{Buffer, Input};

use crate::node::{AudioNode, ProcessContext};
use crate::param::Param;

/// Filter response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterKind {
    Lowpass,
    Bandpass,
}

#[derive(Clone, Copy, Debug, Default)]
struct Coefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Coefficients {
    // Audio EQ Cookbook (RBJ), normalized by a0
    fn compute(kind: FilterKind, frequency: f64, q: f64, sample_rate: f64) -> Self {
        let nyquist = sample_rate * 0.5;
        let frequency = frequency.clamp(10.0, nyquist * 0.99);
        let q = q.max(1e-4);

        let w0 = 2.0 * PI * frequency / sample_rate;
        let cos_w0 = w0.cos();
        let alpha = w0.sin() / (2.0 * q);

        let (b0, b1, b2) = match kind {
            FilterKind::Lowpass => {
                let b1 = 1.0 - cos_w0;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterKind::Bandpass => (alpha, 0.0, -alpha),
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// A second-order IIR filter (Direct Form II Transposed).
///
/// Coefficients are recomputed whenever the cutoff moves, so an LFO or a ramp
/// on the frequency param sweeps the response sample by sample.
pub struct Biquad {
    kind: FilterKind,
    frequency: Param,
    q: f32,

    coefficients: Coefficients,
    /// Cutoff the coefficients were computed for
    computed_for: Option<f32>,

    z1: f64,
    z2: f64,
}

impl Biquad {
    pub fn new(kind: FilterKind, frequency: Param, q: f32) -> Self {
        Self {
            kind,
            frequency,
            q,
            coefficients: Coefficients::default(),
            computed_for: None,
            z1: 0.0,
            z2: 0.0,
        }
    }

    pub fn lowpass(frequency: f32) -> Self {
        Self::new(FilterKind::Lowpass, Param::new(frequency), 1.0)
    }

    pub fn bandpass(frequency: f32, q: f32) -> Self {
        Self::new(FilterKind::Bandpass, Param::new(frequency), q)
    }

    #[inline]
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    #[inline]
    pub fn frequency(&self) -> &Param {
        &self.frequency
    }

    #[inline]
    pub fn q(&self) -> f32 {
        self.q
    }

    /// Filter one sample with the response at `frequency`.
    #[inline]
    fn tick(&mut self, input: f64, frequency: f32, sample_rate: f64) -> f64 {
        if self.computed_for != Some(frequency) {
            self.coefficients = Coefficients::compute(self.kind, frequency as f64, self.q as f64, sample_rate);
            self.computed_for = Some(frequency);
        }

        let c = self.coefficients;
        let output = c.b0 * input + self.z1;
        self.z1 = c.b1 * input - c.a1 * output + self.z2;
        self.z2 = c.b2 * input - c.a2 * output;
        output
    }
}

impl AudioNode for Biquad {
    type Message = ();

    fn process(
        &mut self,
        ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        let (first, rest) = match outputs.split_first_mut() {
            Some(split) => split,
            None => return,
        };

        let input = inputs.first().and_then(|i| i.buffers().first());
        let rate = ctx.sample_rate as f64;

        for i in 0..first.len() {
            let x = input.map_or(0.0, |b| b[i]) as f64;
            let frequency = self.frequency.value_at(ctx.time_at(i));
            first[i] = self.tick(x, frequency, rate) as f32;
        }

        for buffer in rest.iter_mut() {
            buffer.copy_from_slice(first);
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 1 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::source::Oscillator;
    use crate::nodes::test_util::{constant, Bench};

    fn settle(filter: Biquad, source_level: f32) -> f32 {
        let mut bench = Bench::new(48_000);
        let src = bench.add(constant(source_level)).id();
        let f = bench.add(filter).id();
        bench.connect(src, f);
        bench.output(f);
        let out = bench.run(64);
        out[out.len() - 1]
    }

    fn peak_of_sine_through(filter: Biquad, frequency: f32) -> f32 {
        let mut bench = Bench::new(48_000);
        let src = bench.add(Oscillator::sine(frequency)).id();
        let f = bench.add(filter).id();
        bench.connect(src, f);
        bench.output(f);
        let out = bench.run(64);
        // Skip the transient
        out[2048..].iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn lowpass_passes_dc() {
        let out = settle(Biquad::lowpass(1000.0), 1.0);
        assert!((out - 1.0).abs() < 1e-3, "lowpass should pass DC, got {out}");
    }

    #[test]
    fn bandpass_blocks_dc() {
        let out = settle(Biquad::bandpass(400.0, 1.0), 1.0);
        assert!(out.abs() < 1e-3, "bandpass should block DC, got {out}");
    }

    #[test]
    fn lowpass_attenuates_high_frequencies() {
        let low = peak_of_sine_through(Biquad::lowpass(200.0), 100.0);
        let high = peak_of_sine_through(Biquad::lowpass(200.0), 5000.0);
        assert!(low > 0.8, "passband peak {low}");
        assert!(high < 0.05, "stopband peak {high}");
    }

    #[test]
    fn out_of_range_cutoff_is_clamped() {
        // A negative cutoff (e.g. a deep LFO swing) must not blow up the filter
        let filter = Biquad::new(FilterKind::Bandpass, Param::new(-100.0), 1.0);
        let out = settle(filter, 1.0);
        assert!(out.is_finite());
    }
}
