//! Sound programs as plain values.
//!
//! A [`Program`] is a complete, self-terminating description of one sound
//! effect: a set of [`Voice`]s, each a source, an optional filter and a gain
//! envelope, with absolute start and stop times on the context clock. Programs
//! are built on the control thread, sent to the renderer in one message, and
//! realized there as graph nodes that drop themselves once their stop time
//! passes. Nothing needs to keep track of them for playback to be correct; the
//! [`ProgramRegistry`] exists only so hosts and tests can see what is playing.

use core::fmt;
use std::sync::Arc;

use crate::nodes::{FilterKind, Waveform};
use crate::param::Param;
use crate::tool::Tool;

/// What a program was triggered for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CueKind {
    Tool(Tool),
    Chime,
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CueKind::Tool(tool) => tool.fmt(f),
            CueKind::Chime => f.write_str("CHIME"),
        }
    }
}

/// Signal source of a voice.
#[derive(Clone, Debug)]
pub enum Source {
    Oscillator { waveform: Waveform, frequency: Param },
    Noise { samples: Arc<[f32]>, looping: bool },
}

/// Filter stage of a voice.
#[derive(Clone, Debug)]
pub struct Filter {
    pub kind: FilterKind,
    pub frequency: Param,
    pub q: f32,
}

impl Filter {
    pub fn new(kind: FilterKind, frequency: Param, q: f32) -> Self {
        Self { kind, frequency, q }
    }
}

/// One source → (filter) → gain chain, audible in `[start, stop)`.
#[derive(Clone, Debug)]
pub struct Voice {
    pub source: Source,
    pub filter: Option<Filter>,
    pub gain: Param,
    pub start: f64,
    pub stop: f64,
}

impl Voice {
    pub fn oscillator(waveform: Waveform, frequency: Param, gain: Param, start: f64, stop: f64) -> Self {
        Self {
            source: Source::Oscillator { waveform, frequency },
            filter: None,
            gain,
            start,
            stop,
        }
    }

    /// Looping noise voice
    pub fn noise(samples: Arc<[f32]>, gain: Param, start: f64, stop: f64) -> Self {
        Self {
            source: Source::Noise { samples, looping: true },
            filter: None,
            gain,
            start,
            stop,
        }
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Oscillator frequency at the voice's start; `None` for noise.
    pub fn base_frequency(&self) -> Option<f32> {
        match &self.source {
            Source::Oscillator { frequency, .. } => Some(frequency.value_at(self.start)),
            Source::Noise { .. } => None,
        }
    }
}

/// A scheduled sound effect.
#[derive(Clone, Debug)]
pub struct Program {
    pub kind: CueKind,
    /// Context time the program was triggered at
    pub start: f64,
    pub voices: Vec<Voice>,
}

impl Program {
    pub fn new(kind: CueKind, start: f64) -> Self {
        Self {
            kind,
            start,
            voices: Vec::new(),
        }
    }

    pub fn push(&mut self, voice: Voice) -> &mut Self {
        self.voices.push(voice);
        self
    }

    /// Time the last voice stops; `start` for an empty program.
    pub fn stop(&self) -> f64 {
        self.voices.iter().map(|v| v.stop).fold(self.start, f64::max)
    }

    pub fn duration(&self) -> f64 {
        self.stop() - self.start
    }
}

/// Identifier handed out by the registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u64);

/// Summary of a scheduled program.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgramRecord {
    pub id: ProgramId,
    pub kind: CueKind,
    pub start: f64,
    pub stop: f64,
    pub voices: usize,
    /// Base frequency of every oscillator voice, in voice order
    pub frequencies: Vec<f32>,
}

/// Introspection-only record of scheduled programs.
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    records: Vec<ProgramRecord>,
    next_id: u64,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, program: &Program) -> ProgramId {
        let id = ProgramId(self.next_id);
        self.next_id += 1;
        self.records.push(ProgramRecord {
            id,
            kind: program.kind,
            start: program.start,
            stop: program.stop(),
            voices: program.voices.len(),
            frequencies: program.voices.iter().filter_map(Voice::base_frequency).collect(),
        });
        id
    }

    /// Forget a record, e.g. when scheduling failed after recording.
    pub fn remove(&mut self, id: ProgramId) -> Option<ProgramRecord> {
        let idx = self.records.iter().position(|r| r.id == id)?;
        Some(self.records.remove(idx))
    }

    /// Records still sounding at `now`
    pub fn live(&self, now: f64) -> impl Iterator<Item = &ProgramRecord> + '_ {
        self.records.iter().filter(move |r| r.stop > now)
    }

    /// Drop records that stopped at or before `now`; returns how many.
    pub fn expire(&mut self, now: f64) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.stop > now);
        before - self.records.len()
    }

    pub fn records(&self) -> &[ProgramRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(freq: f32, start: f64, stop: f64) -> Voice {
        Voice::oscillator(Waveform::Sine, Param::new(freq), Param::new(0.1), start, stop)
    }

    #[test]
    fn stop_is_latest_voice_stop() {
        let mut program = Program::new(CueKind::Chime, 1.0);
        assert_eq!(program.stop(), 1.0);

        program.push(tone(440.0, 1.0, 2.5)).push(tone(880.0, 1.2, 1.4));
        assert_eq!(program.stop(), 2.5);
        assert!((program.duration() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn registry_summarizes_and_expires() {
        let mut registry = ProgramRegistry::new();

        let mut a = Program::new(CueKind::Tool(Tool::Bubble), 0.0);
        a.push(tone(500.0, 0.0, 1.0));
        let mut b = Program::new(CueKind::Chime, 0.5);
        b.push(tone(523.25, 0.5, 3.0))
            .push(Voice::noise(vec![0.0; 4].into(), Param::new(0.2), 0.5, 2.0));

        let id_a = registry.record(&a);
        let id_b = registry.record(&b);
        assert_ne!(id_a, id_b);

        let rec_b = &registry.records()[1];
        assert_eq!(rec_b.voices, 2);
        assert_eq!(rec_b.frequencies, vec![523.25]);

        assert_eq!(registry.live(1.5).count(), 1);
        assert_eq!(registry.expire(1.5), 1);
        assert_eq!(registry.records()[0].id, id_b);
        assert!(registry.remove(id_b).is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn cue_kind_display() {
        assert_eq!(CueKind::Tool(Tool::BlackHole).to_string(), "BLACK_HOLE");
        assert_eq!(CueKind::Chime.to_string(), "CHIME");
    }
}
