//! Minimal graph harness for node tests

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, RingBuffer};

use crate::graph::{AudioGraph, NodeHandle, BLOCK_LEN};
use crate::node::{AudioNode, NodeId};
use crate::nodes::sink::RtrbSink;
use crate::nodes::source::Noise;

/// A looping source that outputs `value` forever
pub(crate) fn constant(value: f32) -> Noise {
    Noise::new(vec![value; BLOCK_LEN].into(), true)
}

pub(crate) struct Bench {
    graph: AudioGraph,
    clock: Arc<AtomicU64>,
    sink: NodeId,
    out: Consumer<f32>,
}

impl Bench {
    pub fn new(sample_rate: u32) -> Self {
        let clock = Arc::new(AtomicU64::new(0));
        let mut graph = AudioGraph::new(sample_rate, clock.clone());
        let (producer, out) = RingBuffer::new(1 << 16);
        let sink = graph.add(RtrbSink::mono(producer)).id();
        graph.set_terminal(sink);
        Self { graph, clock, sink, out }
    }

    pub fn add<N: AudioNode>(&mut self, node: N) -> NodeHandle<N::Message> {
        self.graph.add(node)
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        self.graph.connect(from, to);
    }

    pub fn output(&mut self, from: NodeId) {
        self.graph.connect(from, self.sink);
    }

    /// Render `blocks` blocks and return every sample the sink received
    pub fn run(&mut self, blocks: usize) -> Vec<f32> {
        for _ in 0..blocks {
            self.graph.process();
            self.clock.fetch_add(BLOCK_LEN as u64, Ordering::Relaxed);
        }
        let out = &mut self.out;
        core::iter::from_fn(|| out.pop().ok()).collect()
    }
}
