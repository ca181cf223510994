//! Buffered white noise source

use std::sync::Arc;

use dasp_graph::{Buffer, Input};
use rand::Rng;

use crate::node::{AudioNode, ProcessContext};

/// Generate `len` samples of uniform white noise in [-1, 1).
pub fn white_noise<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Arc<[f32]> {
    (0..len).map(|_| rng.gen::<f32>() * 2.0 - 1.0).collect()
}

/// Plays a pre-generated noise buffer, optionally looping.
///
/// The buffer is shared, so several programs can reuse one generation.
/// Its first sample plays at the start frame.
pub struct Noise {
    samples: Arc<[f32]>,
    position: usize,
    looping: bool,
    start: u64,
}

impl Noise {
    pub fn new(samples: Arc<[f32]>, looping: bool) -> Self {
        Self {
            samples,
            position: 0,
            looping,
            start: 0,
        }
    }

    /// Begin playback at clock frame `frame` (builder pattern).
    pub fn starting_at(mut self, frame: u64) -> Self {
        self.start = frame;
        self
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl AudioNode for Noise {
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

        let total = self.samples.len();
        for (i, sample) in first.iter_mut().enumerate() {
            if ctx.frame + (i as u64) < self.start {
                *sample = 0.0;
                continue;
            }
            if self.position >= total {
                if self.looping && total > 0 {
                    self.position = 0;
                } else {
                    *sample = 0.0;
                    continue;
                }
            }
            *sample = self.samples[self.position];
            self.position += 1;
        }

        for buffer in rest.iter_mut() {
            buffer.copy_from_slice(first);
        }
    }
}
