//! Summing gain stage

use dasp_graph::{Buffer, Input};

use crate::node::{AudioNode, ProcessContext};
use crate::param::{Param, ParamEvent};

/// Messages to control gain
#[derive(Clone, Copy, Debug)]
pub enum GainMessage {
    /// Add an automation event
    Automate(ParamEvent),
    /// Drop every automation event at or after the given time
    CancelFrom(f64),
}

/// Sums every input and scales the result by an automatable gain.
///
/// Used both as the per-voice envelope and as the master output stage, where
/// any number of voices connect at once and mix additively. Mono: only the
/// first channel of each input is read.
pub struct Gain {
    gain: Param,
}

impl Gain {
    pub fn new(gain: f32) -> Self {
        Self::from_param(Param::new(gain))
    }

    pub fn from_param(gain: Param) -> Self {
        Self { gain }
    }

    #[inline]
    pub fn gain(&self) -> &Param {
        &self.gain
    }
}

impl AudioNode for Gain {
    type Message = GainMessage;

    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = GainMessage>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    ) {
        for msg in messages {
            match msg {
                GainMessage::Automate(event) => {
                    self.gain.insert(event);
                }
                GainMessage::CancelFrom(time) => {
                    self.gain.cancel_scheduled_values(time);
                }
            }
        }
        self.gain.forget_before(ctx.time());

        let (first, rest) = match outputs.split_first_mut() {
            Some(split) => split,
            None => return,
        };

        first.iter_mut().for_each(|s| *s = 0.0);
        for input in inputs {
            if let Some(buffer) = input.buffers().first() {
                for (out, &sample) in first.iter_mut().zip(buffer.iter()) {
                    *out += sample;
                }
            }
        }

        for (i, sample) in first.iter_mut().enumerate() {
            *sample *= self.gain.value_at(ctx.time_at(i));
        }

        for buffer in rest.iter_mut() {
            buffer.copy_from_slice(first);
        }
    }

    /// Accepts any number of inputs
    #[inline]
    fn num_inputs(&self) -> usize { usize::MAX }

    #[inline]
    fn num_outputs(&self) -> usize { 1 }
}
