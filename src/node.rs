//! The node trait every graph member implements.

use dasp_graph::{Buffer, Input};

/// Where in time the block being rendered sits.
///
/// Nodes evaluate [`Param`](crate::Param) automation against `frame`, the
/// output clock position of the block's first sample.
#[derive(Clone, Copy, Debug)]
pub struct ProcessContext {
    pub sample_rate: u32,
    /// Samples per block, `Buffer::LEN`
    pub buffer_size: usize,
    pub frame: u64,
}

impl ProcessContext {
    /// Context time in seconds of sample `i` within the current block.
    #[inline]
    pub fn time_at(&self, i: usize) -> f64 {
        (self.frame + i as u64) as f64 / self.sample_rate as f64
    }

    /// Context time in seconds at the start of the block.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time_at(0)
    }
}

/// Index of a node in the audio graph.
///
/// Stays valid after other nodes are pruned; the renderer is the only
/// place that wires these together.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

/// A unit of mono signal processing driven once per block by the graph.
///
/// Sources take no inputs, effects read their summed inputs and sinks write
/// nothing back into the graph. Automation and control changes arrive as
/// `Message`s, queued from the renderer and drained at the top of every
/// `process` call, so nothing is shared with the caller thread. Nodes that
/// are never steered after construction use `()`.
///
/// ```
/// use moodcue::{AudioNode, ProcessContext};
/// use dasp_graph::{Buffer, Input};
///
/// struct Click {
///     level: f32,
/// }
///
/// impl AudioNode for Click {
///     type Message = f32;
///
///     fn process(
///         &mut self,
///         ctx: &ProcessContext,
///         messages: impl Iterator<Item = f32>,
///         _inputs: &[Input],
///         outputs: &mut [Buffer],
///     ) {
///         for level in messages {
///             self.level = level;
///         }
///         for (i, sample) in outputs[0].iter_mut().enumerate() {
///             *sample = if (ctx.frame + i as u64) % 4800 == 0 { self.level } else { 0.0 };
///         }
///     }
/// }
/// ```
pub trait AudioNode: Send + 'static {
    type Message: Send + 'static;

    /// Render one block.
    ///
    /// `messages` must be drained before any output is written, and every
    /// sample of every output buffer must be assigned, since buffers are
    /// reused between blocks.
    fn process(
        &mut self,
        ctx: &ProcessContext,
        messages: impl Iterator<Item = Self::Message>,
        inputs: &[Input],
        outputs: &mut [Buffer],
    );

    fn num_inputs(&self) -> usize { 0 }

    fn num_outputs(&self) -> usize { 1 }
}
