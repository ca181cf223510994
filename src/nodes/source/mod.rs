//! Audio source nodes (generators with no audio inputs)

mod noise;
mod oscillator;

pub use noise::{white_noise, Noise};
pub use oscillator::{Oscillator, Waveform};
