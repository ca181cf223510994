//! Device output through cpal

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, StreamConfig, SupportedStreamConfig};
use dasp_graph::{Buffer, Input};
use rtrb::{Consumer, Producer, RingBuffer};

use crate::error::{CueError, Result};
use crate::node::{AudioNode, ProcessContext};

/// Counters updated by the device callback.
#[derive(Debug, Default)]
struct StreamStats {
    samples_played: AtomicU64,
    /// Callbacks that ran out of samples
    underruns: AtomicU64,
}

/// Terminal node feeding a cpal output stream.
///
/// The stream lives on a dedicated thread (cpal streams are not `Send` on every
/// host) and drains an rtrb ring that this node fills with interleaved
/// samples, the mono graph output copied to every device channel. A block that
/// does not fit in the ring is dropped whole.
pub struct CpalSink {
    ring: Producer<f32>,
    channels: usize,
    stats: Arc<StreamStats>,
    dropped_blocks: u64,
}

impl CpalSink {
    /// Start a stream on `device` and return the sink feeding it.
    ///
    /// Blocks until the stream thread reports whether playback started.
    pub fn new(device: &cpal::Device, config: &SupportedStreamConfig) -> Result<Self> {
        let channels = config.channels() as usize;
        let format = config.sample_format();
        let stream_config = config.config();

        // ~100ms of audio absorbs render thread jitter
        let capacity = (stream_config.sample_rate.0 as usize / 10 * channels)
            .next_power_of_two()
            .max(8192);
        let (ring, consumer) = RingBuffer::<f32>::new(capacity);

        let stats = Arc::new(StreamStats::default());
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();

        let device = device.clone();
        let thread_stats = stats.clone();
        std::thread::Builder::new()
            .name("moodcue-cpal".into())
            .spawn(move || {
                let started = open_stream(&device, format, &stream_config, consumer, thread_stats)
                    .and_then(|stream| {
                        stream.play().map_err(|err| CueError::PlayStream(err.to_string()))?;
                        Ok(stream)
                    });

                match started {
                    Ok(_stream) => {
                        let _ = ready_tx.send(Ok(()));
                        // The stream plays for as long as this thread holds it
                        loop {
                            std::thread::park();
                        }
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                    }
                }
            })?;

        ready_rx
            .recv()
            .map_err(|_| CueError::BuildStream("stream thread exited before reporting".into()))??;

        tracing::debug!(channels, capacity, ?format, "cpal stream playing");

        Ok(Self {
            ring,
            channels,
            stats,
            dropped_blocks: 0,
        })
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Samples (all channels) handed to the device so far
    pub fn samples_played(&self) -> u64 {
        self.stats.samples_played.load(Ordering::Relaxed)
    }

    /// Device callbacks that found the ring empty
    pub fn underruns(&self) -> u64 {
        self.stats.underruns.load(Ordering::Relaxed)
    }

    /// Blocks discarded because the ring was full
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks
    }
}

fn open_stream(
    device: &cpal::Device,
    format: SampleFormat,
    config: &StreamConfig,
    consumer: Consumer<f32>,
    stats: Arc<StreamStats>,
) -> Result<cpal::Stream> {
    match format {
        SampleFormat::F32 => build::<f32>(device, config, consumer, stats),
        SampleFormat::I16 => build::<i16>(device, config, consumer, stats),
        SampleFormat::U16 => build::<u16>(device, config, consumer, stats),
        SampleFormat::I32 => build::<i32>(device, config, consumer, stats),
        other => Err(CueError::DeviceConfig(format!("unsupported sample format: {:?}", other))),
    }
}

fn build<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mut consumer: Consumer<f32>,
    stats: Arc<StreamStats>,
) -> Result<cpal::Stream>
where
    T: SizedSample + FromSample<f32>,
{
    device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut starved = false;
                for out in data.iter_mut() {
                    let sample = match consumer.pop() {
                        Ok(s) => s.clamp(-1.0, 1.0),
                        Err(_) => {
                            starved = true;
                            0.0
                        }
                    };
                    *out = T::from_sample(sample);
                }
                if starved {
                    stats.underruns.fetch_add(1, Ordering::Relaxed);
                }
                stats.samples_played.fetch_add(data.len() as u64, Ordering::Relaxed);
            },
            |err: cpal::StreamError| tracing::warn!(%err, "cpal stream error"),
            None,
        )
        .map_err(|err| CueError::BuildStream(err.to_string()))
}

impl AudioNode for CpalSink {
    type Message = ();

    fn process(
        &mut self,
        ctx: &ProcessContext,
        _messages: impl Iterator<Item = ()>,
        inputs: &[Input],
        _outputs: &mut [Buffer],
    ) {
        let needed = ctx.buffer_size * self.channels;
        if self.ring.slots() < needed {
            self.dropped_blocks += 1;
            return;
        }

        let mono = inputs.first().and_then(|input| input.buffers().first());
        for i in 0..ctx.buffer_size {
            let sample = mono.map_or(0.0, |buffer| buffer[i]);
            for _ in 0..self.channels {
                let _ = self.ring.push(sample);
            }
        }
    }

    #[inline]
    fn num_inputs(&self) -> usize { 1 }

    #[inline]
    fn num_outputs(&self) -> usize { 0 }
}
