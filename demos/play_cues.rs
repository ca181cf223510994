//! Play every cue through the default output device
//!
//! Run with: cargo run --example play_cues --features cpal_sink
//!
//! Optionally pass a TOML config path. Set RUST_LOG=moodcue=debug to watch
//! programs being scheduled and pruned.

use std::thread::sleep;
use std::time::Duration;

use moodcue::{AudioCueEngine, CpalDevice, CueConfig, DefaultDevice, EngineState, Tool};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("moodcue=info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => match CueConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Failed to load {}: {}", path, err);
                return;
            }
        },
        None => CueConfig::default(),
    };

    println!("Available audio output devices:");
    for device in CpalDevice::list_outputs() {
        println!("  {} ({}Hz, {} ch)", device.name(), device.sample_rate(), device.channels());
    }

    let mut engine = AudioCueEngine::new(config.clone(), DefaultDevice);
    engine.initialize();
    if engine.state() != EngineState::Ready {
        eprintln!("No usable audio output, nothing to play");
        return;
    }

    for tool in Tool::ALL.iter().copied() {
        println!("\n{}", tool);
        engine.play_tool_sound(tool);
        sleep(Duration::from_secs_f64(config.completion_delay));

        println!("  chime");
        engine.play_completion_chime();
        sleep(Duration::from_secs_f64(config.timings.chime + 0.5));
    }

    println!("\nMuted shredder (should be silent)");
    engine.set_muted(true);
    engine.play_tool_sound(Tool::Shredder);
    sleep(Duration::from_secs(1));
    engine.set_muted(false);

    println!("Done");
}
