//! The nodes a cue program is realized with.
//!
//! A voice becomes a short chain: one [`source`] ([`Oscillator`] or looped
//! [`Noise`]), an optional [`Biquad`], then a [`Gain`] carrying the voice
//! envelope. Voice gains feed the master [`Gain`], which sums them, and the
//! master feeds a [`sink`]: [`RtrbSink`] when rendering offline, `CpalSink`
//! with the `cpal_sink` feature.
//!
//! Every node is mono.

pub mod source;
pub mod effect;
pub mod sink;

#[cfg(test)]
pub(crate) mod test_util;

pub use source::{white_noise, Noise, Oscillator, Waveform};
pub use effect::{Biquad, FilterKind, Gain, GainMessage};
pub use sink::RtrbSink;

#[cfg(feature = "cpal_sink")]
pub use sink::CpalSink;
