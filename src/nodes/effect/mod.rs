//! Audio effect nodes (processors with audio inputs and outputs)

mod biquad;
mod gain;

pub use biquad::{Biquad, FilterKind};
pub use gain::{Gain, GainMessage};
