//! Audio graph - owns nodes, message queues and node lifetimes

use core::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dasp_graph::{Buffer, Input, NodeData, Processor};
use hashbrown::HashMap;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::node::{AudioNode, NodeId, ProcessContext};

/// Frames per processing block (fixed by dasp_graph)
pub(crate) const BLOCK_LEN: usize = Buffer::LEN;

/// Internal handle to send messages to a node in an AudioGraph
pub(crate) struct NodeHandle<M: Send + 'static> {
    pub(crate) id: NodeId,
    pub(crate) sender: Producer<M>,
    pub(crate) _marker: PhantomData<M>,
}

impl<M: Send + 'static> NodeHandle<M> {
    /// Send a message to the node (applied next process cycle)
    ///
    /// Returns Err if the queue is full (message dropped)
    pub fn send(&mut self, msg: M) -> Result<(), M> {
        self.sender.push(msg).map_err(|rtrb::PushError::Full(v)| v)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Half-open frame range `[start, stop)` during which a node is audible.
///
/// Outside its window a node is not processed and outputs silence. Once the
/// clock passes `stop` the graph drops the node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Window {
    pub start: u64,
    pub stop: u64,
}

impl Window {
    /// Window from context times in seconds.
    pub fn from_secs(start: f64, stop: f64, sample_rate: u32) -> Self {
        let rate = sample_rate as f64;
        let start = (start.max(0.0) * rate).round() as u64;
        let stop = (stop.max(0.0) * rate).ceil() as u64;
        Self { start, stop: stop.max(start) }
    }
}

// Type-erased wrapper so we can store heterogeneous nodes
trait ErasedNode: Send {
    fn process_erased(&mut self, ctx: &ProcessContext, inputs: &[Input], outputs: &mut [Buffer]);
}

struct NodeWrapper<N: AudioNode> {
    node: N,
    receiver: Consumer<N::Message>,
}

impl<N: AudioNode> ErasedNode for NodeWrapper<N> {
    fn process_erased(&mut self, ctx: &ProcessContext, inputs: &[Input], outputs: &mut [Buffer]) {
        // Split borrow to avoid conflict between receiver and node
        let receiver = &mut self.receiver;
        let node = &mut self.node;

        let messages = core::iter::from_fn(|| receiver.pop().ok());
        node.process(ctx, messages, inputs, outputs);
    }
}

// Adapter for dasp_graph
struct DaspAdapter {
    node: Box<dyn ErasedNode>,
    sample_rate: u32,
    clock: Arc<AtomicU64>,
    window: Option<Window>,
}

fn silence(outputs: &mut [Buffer]) {
    for buffer in outputs.iter_mut() {
        buffer.iter_mut().for_each(|s| *s = 0.0);
    }
}

impl dasp_graph::Node for DaspAdapter {
    fn process(&mut self, inputs: &[Input], outputs: &mut [Buffer]) {
        let frame = self.clock.load(Ordering::Relaxed);
        let ctx = ProcessContext {
            sample_rate: self.sample_rate,
            buffer_size: BLOCK_LEN,
            frame,
        };

        let window = match self.window {
            None => {
                self.node.process_erased(&ctx, inputs, outputs);
                return;
            }
            Some(w) => w,
        };

        let block_end = frame + BLOCK_LEN as u64;
        if block_end <= window.start || frame >= window.stop {
            silence(outputs);
            return;
        }

        self.node.process_erased(&ctx, inputs, outputs);

        // Block straddles an edge of the window: mute the samples outside it
        if frame < window.start || block_end > window.stop {
            for buffer in outputs.iter_mut() {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let f = frame + i as u64;
                    if f < window.start || f >= window.stop {
                        *sample = 0.0;
                    }
                }
            }
        }
    }
}

type InnerGraph = StableGraph<NodeData<DaspAdapter>, ()>;

/// An audio processing graph at a fixed sample rate.
///
/// Backed by a petgraph `StableGraph` so that node indices survive the removal
/// of finished program nodes.
pub(crate) struct AudioGraph {
    graph: InnerGraph,
    processor: Processor<InnerGraph>,
    sample_rate: u32,
    clock: Arc<AtomicU64>,

    node_indices: HashMap<NodeId, NodeIndex>,
    next_node_id: u32,

    /// (stop frame, node) for every scheduled node
    expiries: Vec<(u64, NodeId)>,

    terminal: Option<NodeIndex>,
}

impl AudioGraph {
    /// Create a new graph reading block positions from `clock`
    pub fn new(sample_rate: u32, clock: Arc<AtomicU64>) -> Self {
        Self {
            graph: InnerGraph::with_capacity(64, 64),
            processor: Processor::with_capacity(64),
            sample_rate,
            clock,
            node_indices: HashMap::new(),
            next_node_id: 0,
            expiries: Vec::new(),
            terminal: None,
        }
    }

    /// Add a permanent node, returns a handle for sending messages
    pub fn add<N: AudioNode>(&mut self, node: N) -> NodeHandle<N::Message> {
        self.add_inner(node, 64, None)
    }

    /// Add an unscheduled node whose message queue holds `queue_size` messages
    pub fn add_with_queue<N: AudioNode>(&mut self, node: N, queue_size: usize) -> NodeHandle<N::Message> {
        self.add_inner(node, queue_size.max(1), None)
    }

    /// Add a node that is only audible within `window` and is dropped after it
    pub fn add_scheduled<N: AudioNode>(&mut self, node: N, window: Window) -> NodeHandle<N::Message> {
        // Program nodes are fully described up front; they get no real queue
        self.add_inner(node, 1, Some(window))
    }

    fn add_inner<N: AudioNode>(
        &mut self,
        node: N,
        queue_size: usize,
        window: Option<Window>,
    ) -> NodeHandle<N::Message> {
        let id = NodeId(self.next_node_id);
        self.next_node_id = self.next_node_id.wrapping_add(1);

        let (producer, consumer) = RingBuffer::new(queue_size);

        let num_outputs = node.num_outputs();
        let wrapper = NodeWrapper { node, receiver: consumer };
        let adapter = DaspAdapter {
            node: Box::new(wrapper),
            sample_rate: self.sample_rate,
            clock: self.clock.clone(),
            window,
        };

        let node_data = match num_outputs {
            2 => NodeData::new2(adapter),
            // 0 outputs = sink, but dasp_graph still needs a buffer for inputs
            _ => NodeData::new1(adapter),
        };

        let idx = self.graph.add_node(node_data);
        self.node_indices.insert(id, idx);
        if let Some(w) = window {
            self.expiries.push((w.stop, id));
        }

        NodeHandle {
            id,
            sender: producer,
            _marker: PhantomData,
        }
    }

    /// Connect output of `from` to input of `to`
    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        if let (Some(&from_idx), Some(&to_idx)) = (self.node_indices.get(&from), self.node_indices.get(&to)) {
            self.graph.add_edge(from_idx, to_idx, ());
        }
    }

    /// Set which node to process to (typically a sink)
    pub fn set_terminal(&mut self, id: NodeId) {
        self.terminal = self.node_indices.get(&id).copied();
    }

    /// Process one block of audio through the graph
    pub fn process(&mut self) {
        if let Some(terminal) = self.terminal {
            self.processor.process(&mut self.graph, terminal);
        }
    }

    /// Remove every scheduled node whose window ended at or before `frame`.
    ///
    /// Returns the number of nodes removed.
    pub fn prune(&mut self, frame: u64) -> usize {
        let graph = &mut self.graph;
        let node_indices = &mut self.node_indices;
        let before = self.expiries.len();

        self.expiries.retain(|&(stop, id)| {
            if stop > frame {
                return true;
            }
            if let Some(idx) = node_indices.remove(&id) {
                graph.remove_node(idx);
            }
            false
        });

        before - self.expiries.len()
    }

    /// Number of live nodes, including the permanent ones
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::effect::Gain;
    use crate::nodes::sink::RtrbSink;
    use crate::nodes::source::Oscillator;

    fn graph_with_sink(rate: u32) -> (AudioGraph, Arc<AtomicU64>, NodeId, Consumer<f32>) {
        let clock = Arc::new(AtomicU64::new(0));
        let mut graph = AudioGraph::new(rate, clock.clone());
        let (producer, consumer) = RingBuffer::new(4096);
        let sink = graph.add(RtrbSink::mono(producer)).id();
        graph.set_terminal(sink);
        (graph, clock, sink, consumer)
    }

    fn step(graph: &mut AudioGraph, clock: &AtomicU64) {
        graph.process();
        let now = clock.fetch_add(BLOCK_LEN as u64, Ordering::Relaxed) + BLOCK_LEN as u64;
        graph.prune(now);
    }

    #[test]
    fn window_rounds_outwards_at_stop() {
        let w = Window::from_secs(0.5, 1.00001, 1000);
        assert_eq!(w.start, 500);
        assert_eq!(w.stop, 1001);

        let w = Window::from_secs(-1.0, -0.5, 1000);
        assert_eq!(w, Window { start: 0, stop: 0 });
    }

    #[test]
    fn scheduled_node_is_silent_outside_its_window() {
        let rate = 6400;
        let (mut graph, clock, sink, mut out) = graph_with_sink(rate);

        // Audible for frames [96, 160)
        let window = Window { start: 96, stop: 160 };
        let osc = graph.add_scheduled(Oscillator::sine(400.0), window).id();
        let gain = graph.add(Gain::new(1.0)).id();
        graph.connect(osc, gain);
        graph.connect(gain, sink);

        for _ in 0..4 {
            step(&mut graph, &clock);
        }

        let samples: Vec<f32> = core::iter::from_fn(|| out.pop().ok()).collect();
        assert_eq!(samples.len(), 4 * BLOCK_LEN);
        assert!(samples[..96].iter().all(|&s| s == 0.0));
        assert!(samples[96..160].iter().any(|&s| s != 0.0));
        assert!(samples[160..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn finished_nodes_are_pruned() {
        let (mut graph, clock, sink, _out) = graph_with_sink(48_000);
        let osc = graph.add_scheduled(Oscillator::sine(440.0), Window { start: 0, stop: 100 }).id();
        graph.connect(osc, sink);
        assert_eq!(graph.node_count(), 2);

        step(&mut graph, &clock);
        assert_eq!(graph.node_count(), 2, "window still open after one block");

        step(&mut graph, &clock);
        assert_eq!(graph.node_count(), 1, "only the sink remains");
        assert!(graph.expiries.is_empty());
    }
}
