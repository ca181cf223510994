//! CPAL device discovery and sink creation.
//!
//! ```no_run
//! use moodcue::CpalDevice;
//!
//! for device in CpalDevice::list_outputs() {
//!     println!("{} ({} Hz, {} ch)", device.name(), device.sample_rate(), device.channels());
//! }
//! ```

use cpal::traits::{DeviceTrait, HostTrait};

use crate::error::{CueError, Result};
use crate::nodes::CpalSink;

/// A discovered audio output device.
pub struct CpalDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    name: String,
    sample_rate: u32,
    channels: u16,
}

impl CpalDevice {
    fn probe(device: cpal::Device) -> Result<Self> {
        let config = device
            .default_output_config()
            .map_err(|err| CueError::DeviceConfig(err.to_string()))?;
        let name = device.name().unwrap_or_else(|_| "Unknown".into());

        Ok(Self {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
            name,
            device,
            config,
        })
    }

    /// The host's default output device.
    pub fn default_output() -> Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(CueError::NoOutputDevice)?;
        Self::probe(device)
    }

    /// Every output device that reports a usable default config.
    ///
    /// Returns an empty list if enumeration fails.
    pub fn list_outputs() -> Vec<Self> {
        let host = cpal::default_host();
        match host.output_devices() {
            Ok(devices) => devices.filter_map(|device| Self::probe(device).ok()).collect(),
            Err(err) => {
                tracing::warn!(%err, "failed to enumerate output devices");
                Vec::new()
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Start a stream on this device and return the sink feeding it.
    pub fn create_sink(&self) -> Result<CpalSink> {
        CpalSink::new(&self.device, &self.config)
    }
}
