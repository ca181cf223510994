//! Ring buffer capture sink

use dasp_graph::{Buffer, Input};
use rtrb::Producer;

use crate::node::{AudioNode, ProcessContext};

/// Captures the mono graph output into an rtrb ring.
///
/// Terminal node of offline contexts, which drain the consumer after every
/// block. Exactly one block is written per process call (silence when nothing
/// is connected), so the consumer side can count frames. If the ring cannot
/// take a whole block the block is dropped and counted.
pub struct RtrbSink {
    producer: Producer<f32>,
    dropped_blocks: u64,
}

impl RtrbSink {
    pub fn mono(producer: Producer<f32>) -> Self {
        Self {
            producer,
            dropped_blocks: 0,
        }
    }

    /// Free sample slots in the ring
    #[inline]
    pub fn available(&self) -> usize {
        self.producer.slots()
    }

    #[inline]
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks
    }
}

impl AudioNode for RtrbSink {
    type Message = ();

    fn process(
        &mut self,
        ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        inputs: &[Input],
        _outputs: &mut [Buffer],
    ) {
        let chunk = match self.producer.write_chunk_uninit(ctx.buffer_size) {
            Ok(chunk) => chunk,
            Err(_) => {
                self.dropped_blocks += 1;
                return;
            }
        };

        let block = inputs.first().and_then(|input| input.buffers().first());
        let samples = (0..ctx.buffer_size).map(|i| block.map_or(0.0, |buffer| buffer[i]));
        chunk.fill_from_iter(samples);
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 0 }
}
