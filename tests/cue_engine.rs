use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use moodcue::{
    AudioContext, AudioCueEngine, ContextState, CueConfig, CueKind, EngineState, NoOutput, Offline, OutputProvider,
    Result, Tool,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

const RATE: usize = 48_000;

fn engine(seed: u64) -> AudioCueEngine {
    AudioCueEngine::with_rng(CueConfig::default(), Offline::default(), StdRng::seed_from_u64(seed))
}

fn render_secs(engine: &mut AudioCueEngine, secs: f64) -> Vec<f32> {
    let ctx = engine.context_mut().expect("engine is initialized");
    ctx.render((secs * RATE as f64) as usize)
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

fn live_count(engine: &AudioCueEngine) -> usize {
    let now = engine.context().map(AudioContext::current_time).unwrap_or(0.0);
    engine.registry().live(now).count()
}

#[test]
fn play_before_initialize_does_nothing() {
    let mut engine = engine(1);

    for tool in Tool::ALL.iter().copied() {
        engine.play_tool_sound(tool);
    }
    engine.play_completion_chime();
    engine.set_muted(true);
    engine.set_muted(false);

    assert_eq!(engine.state(), EngineState::Uninitialized);
    assert!(engine.context().is_none());
    assert!(engine.registry().is_empty());
}

#[test]
fn unsupported_environment_degrades_to_silence() {
    let mut engine = AudioCueEngine::new(CueConfig::default(), NoOutput);
    engine.initialize();
    for tool in Tool::ALL.iter().copied() {
        engine.play_tool_sound(tool);
    }
    engine.play_completion_chime();

    assert_eq!(engine.state(), EngineState::Unsupported);
    assert!(engine.registry().is_empty());
}

#[test]
fn muted_play_keeps_master_gain_at_zero() {
    let mut engine = engine(2);
    engine.initialize();
    engine.set_muted(true);

    for tool in Tool::ALL.iter().copied() {
        engine.play_tool_sound(tool);
        assert_eq!(engine.context().map(|c| c.master_gain()), Some(0.0));
    }
    engine.play_completion_chime();
    assert_eq!(engine.context().map(|c| c.master_gain()), Some(0.0));

    assert!(engine.registry().is_empty());
    assert!(render_secs(&mut engine, 0.5).iter().all(|&s| s == 0.0));
}

#[test]
fn mute_holds_with_a_backed_up_command_queue() {
    let mut engine = engine(12);
    engine.initialize();
    let capacity = engine.config().command_queue;
    for _ in 0..capacity + 8 {
        engine.play_completion_chime();
    }

    engine.set_muted(true);
    assert!(engine.is_muted());
    assert_eq!(engine.context().map(|c| c.master_gain()), Some(0.0));
    assert!(render_secs(&mut engine, 0.1).iter().all(|&s| s == 0.0));

    engine.set_muted(false);
    assert!(peak(&render_secs(&mut engine, 0.1)) > 0.01);
}

#[test]
fn unmute_restores_exact_default_gain() {
    let mut engine = engine(3);
    engine.initialize();
    engine.set_muted(true);
    engine.set_muted(false);

    assert_eq!(engine.context().map(|c| c.master_gain()), Some(0.4));
    assert!(!engine.is_muted());
}

#[test]
fn mute_silences_programs_already_playing() {
    let mut engine = engine(4);
    engine.initialize();
    engine.play_tool_sound(Tool::Shredder);

    let before = render_secs(&mut engine, 0.5);
    assert!(peak(&before) > 0.01);

    engine.set_muted(true);
    let muted = render_secs(&mut engine, 0.5);
    assert!(muted.iter().all(|&s| s == 0.0));

    // The program kept running underneath
    engine.set_muted(false);
    let after = render_secs(&mut engine, 0.5);
    assert!(peak(&after) > 0.01);
}

#[test]
fn initialize_twice_reuses_the_output() {
    let opened = Arc::new(AtomicUsize::new(0));
    let counter = opened.clone();
    let provider = move |config: &CueConfig| -> Result<AudioContext> {
        counter.fetch_add(1, Ordering::SeqCst);
        Offline::default().open(config)
    };

    let mut engine = AudioCueEngine::new(CueConfig::default(), provider);
    engine.initialize();
    engine.play_tool_sound(Tool::Rocket);
    render_secs(&mut engine, 0.1);

    engine.initialize();
    assert_eq!(opened.load(Ordering::SeqCst), 1);

    // Same clock, same graph: the rocket is still in it
    let ctx = engine.context().expect("initialized");
    assert!(ctx.current_time() > 0.09);
    assert_eq!(ctx.node_count(), Some(2 + 3 + 2));
}

#[test]
fn initialize_resumes_a_suspended_output() {
    let mut engine = AudioCueEngine::new(CueConfig::default(), Offline::suspended());
    engine.initialize();
    assert_eq!(engine.context().map(|c| c.state()), Some(ContextState::Running));

    engine.context().expect("initialized").suspend();
    engine.initialize();
    assert_eq!(engine.context().map(|c| c.state()), Some(ContextState::Running));
}

#[test]
fn every_tool_stops_within_bound() {
    let mut engine = engine(5);
    engine.initialize();

    for tool in Tool::ALL.iter().copied() {
        engine.play_tool_sound(tool);
        let record = engine.registry().records().last().expect("program recorded");
        assert_eq!(record.kind, CueKind::Tool(tool));
        assert!(
            record.stop - record.start <= 3.2,
            "{} runs for {}s",
            tool,
            record.stop - record.start
        );
        render_secs(&mut engine, 0.25);
    }
}

#[test]
fn chime_has_four_voices_at_chord_tones() {
    let mut engine = engine(6);
    engine.initialize();
    engine.play_completion_chime();

    let record = &engine.registry().records()[0];
    assert_eq!(record.kind, CueKind::Chime);
    assert_eq!(record.voices, 4);
    assert_eq!(record.frequencies, vec![523.25, 659.25, 783.99, 1046.50]);
    assert!((record.stop - record.start - 3.1).abs() < 1e-9);
}

#[test]
fn shredder_and_chime_overlap() {
    let mut engine = engine(7);
    engine.initialize();
    engine.play_tool_sound(Tool::Shredder);
    render_secs(&mut engine, 1.0);

    engine.play_completion_chime();
    let out = render_secs(&mut engine, 0.5);
    assert!(peak(&out) > 0.01);

    assert_eq!(live_count(&engine), 2);
    // master + sink, shredder (noise, band-pass, gain), chime (4 x osc, gain)
    let ctx = engine.context().expect("initialized");
    assert_eq!(ctx.node_count(), Some(2 + 3 + 8));

    // Shredder ends at 2.5s, the chime carries on
    render_secs(&mut engine, 1.5);
    assert_eq!(live_count(&engine), 1);
    assert_eq!(engine.context().and_then(|c| c.node_count()), Some(2 + 8));
}

#[test]
fn finished_programs_are_pruned() {
    let mut engine = engine(8);
    engine.initialize();
    engine.play_tool_sound(Tool::BlackHole);
    engine.play_tool_sound(Tool::Bubble);

    render_secs(&mut engine, 3.5);
    let ctx = engine.context().expect("initialized");
    assert_eq!(ctx.node_count(), Some(2));
    assert_eq!(live_count(&engine), 0);

    let out = render_secs(&mut engine, 0.2);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn seeded_engines_render_identically() {
    let mut a = engine(42);
    let mut b = engine(42);
    for engine in [&mut a, &mut b].iter_mut() {
        engine.initialize();
        engine.play_tool_sound(Tool::Bubble);
        engine.play_tool_sound(Tool::Rocket);
    }

    let out_a = render_secs(&mut a, 1.0);
    let out_b = render_secs(&mut b, 1.0);
    assert!(peak(&out_a) > 0.01);
    assert_eq!(out_a, out_b);
}

#[test]
fn configured_timings_shape_programs() {
    let config = CueConfig::from_toml_str(
        r#"
        master_gain = 0.5

        [timings]
        shredder = 1.0
        bubble_count = 3
        "#,
    )
    .unwrap();

    let mut engine = AudioCueEngine::with_rng(config, Offline::default(), StdRng::seed_from_u64(9));
    engine.initialize();
    assert_eq!(engine.context().map(|c| c.master_gain()), Some(0.5));

    engine.play_tool_sound(Tool::Shredder);
    engine.play_tool_sound(Tool::Bubble);
    let records = engine.registry().records();
    assert!((records[0].stop - records[0].start - 1.0).abs() < 1e-9);
    assert_eq!(records[1].voices, 3);
}

#[test]
fn completion_delay_is_independent_of_programs() {
    let config = CueConfig::default();
    assert_eq!(config.completion_delay, 4.5);

    let mut engine = engine(10);
    engine.initialize();
    for tool in Tool::ALL.iter().copied() {
        engine.play_tool_sound(tool);
    }
    assert!(engine.registry().records().iter().all(|r| r.stop < config.completion_delay));
}
