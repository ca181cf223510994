//! The output context.
//!
//! An [`AudioContext`] is the caller-side half of an audio output: it knows the
//! sample rate, reads the frame clock, flips the run state and pushes
//! [`Program`]s and timed master gain changes into a lock-free command queue.
//! Immediate master gain changes bypass the queue through an atomic level, so
//! muting never depends on queue space. The other half, the [`Renderer`], owns
//! the [`AudioGraph`] and turns those commands into nodes wired to the single
//! master gain stage.
//!
//! Two backends exist:
//!
//! - **Realtime** ([`AudioContext::default_output`], feature `cpal_sink`): the
//!   renderer runs on its own thread, paced against the wall clock a few blocks
//!   ahead of the device.
//! - **Offline** ([`AudioContext::offline`]): the renderer stays in-process and
//!   [`AudioContext::render`] pulls blocks on demand. Used by tests and benches.
//!
//! ```
//! use moodcue::{AudioContext, ContextOptions};
//!
//! let mut ctx = AudioContext::offline(8_000, &ContextOptions::default());
//! let out = ctx.render(640);
//! assert_eq!(out.len(), 640);
//! assert!((ctx.current_time() - 0.08).abs() < 1e-9);
//! ```

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::config::CueConfig;
use crate::error::{CueError, Result};
use crate::graph::{AudioGraph, NodeHandle, Window, BLOCK_LEN};
use crate::node::AudioNode;
use crate::nodes::{Biquad, Gain, GainMessage, Noise, Oscillator, RtrbSink};
use crate::param::ParamEvent;
use crate::program::{Program, Source};

#[cfg(feature = "cpal_sink")]
use crate::device::CpalDevice;

/// Run state of a context.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ContextState {
    /// Clock stopped, nothing rendered
    Suspended = 0,
    Running = 1,
    /// Dropped; the render thread exits
    Closed = 2,
}

impl ContextState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ContextState::Suspended,
            1 => ContextState::Running,
            _ => ContextState::Closed,
        }
    }
}

/// Knobs for building a context.
#[derive(Clone, Debug, PartialEq)]
pub struct ContextOptions {
    /// Initial master gain
    pub master_gain: f32,
    /// Capacity of the command queue
    pub command_queue: usize,
    /// Blocks the realtime renderer keeps ahead of the wall clock
    pub lookahead_blocks: u64,
}

impl Default for ContextOptions {
    fn default() -> Self {
        Self::from(&CueConfig::default())
    }
}

impl From<&CueConfig> for ContextOptions {
    fn from(config: &CueConfig) -> Self {
        Self {
            master_gain: config.master_gain,
            command_queue: config.command_queue.max(1),
            lookahead_blocks: config.lookahead_blocks,
        }
    }
}

pub(crate) enum Command {
    Schedule(Program),
    MasterGain { value: f32, time: f64 },
}

/// Render side of a context.
///
/// Owns the graph; everything it touches per block is lock-free.
pub(crate) struct Renderer {
    graph: AudioGraph,
    commands: Consumer<Command>,
    master: NodeHandle<GainMessage>,
    /// f32 bits of the last immediate master gain request
    master_level: Arc<AtomicU32>,
    applied_level: u32,
    clock: Arc<AtomicU64>,
    state: Arc<AtomicU8>,
    sample_rate: u32,
}

impl Renderer {
    /// Build a graph of `master -> sink` and the command queue feeding it.
    fn new<S: AudioNode<Message = ()>>(
        sample_rate: u32,
        sink: S,
        options: &ContextOptions,
        initial: ContextState,
    ) -> (Self, Producer<Command>) {
        let clock = Arc::new(AtomicU64::new(0));
        let state = Arc::new(AtomicU8::new(initial as u8));
        let mut graph = AudioGraph::new(sample_rate, clock.clone());

        let sink = graph.add(sink).id();
        // Every queued command plus the immediate level may each send two messages
        let master_queue = 2 * (options.command_queue.max(1) + 1);
        let master = graph.add_with_queue(Gain::new(options.master_gain), master_queue);
        graph.connect(master.id(), sink);
        graph.set_terminal(sink);

        let (producer, consumer) = RingBuffer::new(options.command_queue.max(1));
        let level = options.master_gain.to_bits();

        let renderer = Self {
            graph,
            commands: consumer,
            master,
            master_level: Arc::new(AtomicU32::new(level)),
            applied_level: level,
            clock,
            state,
            sample_rate,
        };
        (renderer, producer)
    }

    #[inline]
    fn state(&self) -> ContextState {
        ContextState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Render one block. Returns false, rendering nothing, unless running.
    pub(crate) fn render_block(&mut self) -> bool {
        if self.state() != ContextState::Running {
            return false;
        }

        self.sync_master_level();
        while let Ok(command) = self.commands.pop() {
            self.apply(command);
        }

        self.graph.process();

        let now = self.clock.fetch_add(BLOCK_LEN as u64, Ordering::AcqRel) + BLOCK_LEN as u64;
        let pruned = self.graph.prune(now);
        if pruned > 0 {
            tracing::trace!(pruned, frame = now, "dropped finished nodes");
        }
        true
    }

    /// Pick up an immediate master gain change, starting at this block.
    fn sync_master_level(&mut self) {
        let level = self.master_level.load(Ordering::Acquire);
        if level == self.applied_level {
            return;
        }
        self.applied_level = level;
        let now = self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64;
        self.set_master(f32::from_bits(level), now);
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Schedule(program) => self.realize(program),
            Command::MasterGain { value, time } => self.set_master(value, time),
        }
    }

    fn set_master(&mut self, value: f32, time: f64) {
        // Sized for a full command queue per block, and drained every block
        let _ = self.master.send(GainMessage::CancelFrom(time));
        let _ = self.master.send(GainMessage::Automate(ParamEvent::SetValue { value, time }));
    }

    /// Turn every voice into `source -> [filter] -> gain -> master`.
    fn realize(&mut self, program: Program) {
        let kind = program.kind;
        let voices = program.voices.len();
        let master = self.master.id();

        for voice in program.voices {
            let window = Window::from_secs(voice.start, voice.stop, self.sample_rate);

            let source = match voice.source {
                Source::Oscillator { waveform, frequency } => {
                    self.graph.add_scheduled(Oscillator::new(waveform, frequency).starting_at(window.start), window).id()
                }
                Source::Noise { samples, looping } => {
                    self.graph.add_scheduled(Noise::new(samples, looping).starting_at(window.start), window).id()
                }
            };

            let shaped = match voice.filter {
                Some(filter) => {
                    let biquad = Biquad::new(filter.kind, filter.frequency, filter.q);
                    let id = self.graph.add_scheduled(biquad, window).id();
                    self.graph.connect(source, id);
                    id
                }
                None => source,
            };

            let envelope = self.graph.add_scheduled(Gain::from_param(voice.gain), window).id();
            self.graph.connect(shaped, envelope);
            self.graph.connect(envelope, master);
        }

        tracing::debug!(%kind, voices, nodes = self.graph.node_count(), "program realized");
    }
}

enum Backend {
    /// Placeholder while a context is being assembled
    Detached,
    Offline {
        renderer: Renderer,
        output: Consumer<f32>,
    },
    #[cfg(feature = "cpal_sink")]
    Realtime {
        thread: Option<std::thread::JoinHandle<()>>,
    },
}

/// Handle to an audio output: clock, run state, master gain and command queue.
///
/// Created once and kept for the life of the engine. Dropping it closes the
/// context and joins the render thread, if any.
pub struct AudioContext {
    sample_rate: u32,
    clock: Arc<AtomicU64>,
    state: Arc<AtomicU8>,
    commands: Producer<Command>,
    master_level: Arc<AtomicU32>,
    master_gain: f32,
    backend: Backend,
}

impl AudioContext {
    fn with_backend(renderer: &Renderer, commands: Producer<Command>, options: &ContextOptions) -> Self {
        Self {
            sample_rate: renderer.sample_rate,
            clock: renderer.clock.clone(),
            state: renderer.state.clone(),
            commands,
            master_level: renderer.master_level.clone(),
            master_gain: options.master_gain,
            backend: Backend::Detached,
        }
    }

    /// An in-process context rendering mono samples on demand. Starts running.
    pub fn offline(sample_rate: u32, options: &ContextOptions) -> Self {
        // One block at a time is drained, a few blocks of headroom is plenty
        let (producer, output) = RingBuffer::new(BLOCK_LEN * 16);
        let sink = RtrbSink::mono(producer);
        let (renderer, commands) = Renderer::new(sample_rate, sink, options, ContextState::Running);

        let mut ctx = Self::with_backend(&renderer, commands, options);
        ctx.backend = Backend::Offline { renderer, output };
        ctx
    }

    /// Open the host's default output device and start rendering to it.
    #[cfg(feature = "cpal_sink")]
    pub fn default_output(options: &ContextOptions) -> Result<Self> {
        let device = CpalDevice::default_output()?;
        tracing::info!(
            device = device.name(),
            sample_rate = device.sample_rate(),
            channels = device.channels(),
            "opening output device"
        );

        let sink = device.create_sink()?;
        let (renderer, commands) = Renderer::new(device.sample_rate(), sink, options, ContextState::Running);
        let mut ctx = Self::with_backend(&renderer, commands, options);

        let lookahead = options.lookahead_blocks;
        let thread = std::thread::Builder::new()
            .name("moodcue-render".into())
            .spawn(move || run_realtime(renderer, lookahead))?;
        ctx.backend = Backend::Realtime { thread: Some(thread) };

        Ok(ctx)
    }

    /// Put the context in the suspended state (builder pattern).
    pub fn start_suspended(self) -> Self {
        self.suspend();
        self
    }

    #[inline]
    pub fn state(&self) -> ContextState {
        ContextState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Start (or continue) rendering. No-op once closed.
    pub fn resume(&self) {
        let _ = self.state.compare_exchange(
            ContextState::Suspended as u8,
            ContextState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Stop the clock. No-op once closed.
    pub fn suspend(&self) {
        let _ = self.state.compare_exchange(
            ContextState::Running as u8,
            ContextState::Suspended as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    /// Seconds of audio rendered so far.
    #[inline]
    pub fn current_time(&self) -> f64 {
        self.clock.load(Ordering::Acquire) as f64 / self.sample_rate as f64
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Last master gain value requested.
    #[inline]
    pub fn master_gain(&self) -> f32 {
        self.master_gain
    }

    /// Jump the master gain to `value` from the next rendered block, with no
    /// fade, dropping any later change the renderer already holds.
    ///
    /// Never goes through the command queue, so it cannot fail.
    pub fn set_master_gain(&mut self, value: f32) {
        self.master_level.store(value.to_bits(), Ordering::Release);
        self.master_gain = value;
    }

    /// Jump the master gain to `value` at context time `time`, dropping any
    /// later change.
    ///
    /// Queued behind earlier commands. Within one block an immediate change is
    /// applied before queued ones.
    pub fn set_master_gain_at(&mut self, value: f32, time: f64) -> Result<()> {
        self.push(Command::MasterGain { value, time })?;
        self.master_gain = value;
        Ok(())
    }

    /// Hand a program to the renderer.
    pub fn schedule(&mut self, program: Program) -> Result<()> {
        self.push(Command::Schedule(program))
    }

    fn push(&mut self, command: Command) -> Result<()> {
        self.commands.push(command).map_err(|_| CueError::CommandQueueFull)
    }

    /// Render at least `frames` frames and return the mono samples produced.
    ///
    /// Rendering happens in whole blocks, so the result is `frames` rounded up
    /// to a multiple of 64. A suspended context renders nothing; a realtime
    /// context always returns an empty buffer.
    pub fn render(&mut self, frames: usize) -> Vec<f32> {
        let (renderer, output) = match &mut self.backend {
            Backend::Offline { renderer, output } => (renderer, output),
            _ => return Vec::new(),
        };

        let blocks = (frames + BLOCK_LEN - 1) / BLOCK_LEN;
        let mut samples = Vec::with_capacity(blocks * BLOCK_LEN);
        for _ in 0..blocks {
            if !renderer.render_block() {
                break;
            }
            while let Ok(sample) = output.pop() {
                samples.push(sample);
            }
        }
        samples
    }

    /// Live graph nodes, including master and sink. Offline contexts only.
    pub fn node_count(&self) -> Option<usize> {
        match &self.backend {
            Backend::Offline { renderer, .. } => Some(renderer.graph.node_count()),
            _ => None,
        }
    }
}

impl Drop for AudioContext {
    fn drop(&mut self) {
        self.state.store(ContextState::Closed as u8, Ordering::Release);

        #[cfg(feature = "cpal_sink")]
        {
            if let Backend::Realtime { thread } = &mut self.backend {
                if let Some(thread) = thread.take() {
                    if thread.join().is_err() {
                        tracing::warn!("render thread panicked");
                    }
                }
            }
        }
    }
}

/// Render blocks just ahead of the wall clock until the context closes.
///
/// Pacing restarts from zero after every suspension so a long pause doesn't
/// turn into a burst of catch-up blocks.
#[cfg(feature = "cpal_sink")]
fn run_realtime(mut renderer: Renderer, lookahead: u64) {
    use std::time::{Duration, Instant};

    let rate = renderer.sample_rate as f64;
    // (pacing origin, blocks rendered since)
    let mut origin: Option<(Instant, u64)> = None;

    loop {
        match renderer.state() {
            ContextState::Closed => break,
            ContextState::Suspended => {
                origin = None;
                std::thread::sleep(Duration::from_millis(5));
                continue;
            }
            ContextState::Running => {}
        }

        let (start, rendered) = origin.get_or_insert_with(|| (Instant::now(), 0));
        let target = (start.elapsed().as_secs_f64() * rate / BLOCK_LEN as f64) as u64 + lookahead;

        while *rendered < target {
            if !renderer.render_block() {
                break;
            }
            *rendered += 1;
        }

        std::thread::sleep(Duration::from_micros(500));
    }

    tracing::debug!("render thread stopped");
}
