//! Automatable parameters.
//!
//! A [`Param`] is a value over time: a default plus an ordered list of
//! [`ParamEvent`]s, with the same evaluation rules as a Web Audio `AudioParam`.
//! An optional [`Lfo`] is summed on top of the automated value, which is how a
//! program modulates a filter cutoff or a gain without a separate graph edge.
//!
//! Evaluation is a pure function of absolute context time, so parameters can be
//! built on the control thread, shipped to the renderer, and inspected in tests.

use core::cmp::Ordering;

use crate::nodes::source::Waveform;

/// A single automation event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamEvent {
    /// Jump to `value` at `time`
    SetValue { value: f32, time: f64 },
    /// Ramp linearly from the previous event to `value`, arriving at `end_time`
    LinearRamp { value: f32, end_time: f64 },
    /// Ramp exponentially from the previous event to `value`, arriving at `end_time`
    ExponentialRamp { value: f32, end_time: f64 },
}

impl ParamEvent {
    /// The time at which this event's target value is reached.
    #[inline]
    pub fn time(&self) -> f64 {
        match *self {
            ParamEvent::SetValue { time, .. } => time,
            ParamEvent::LinearRamp { end_time, .. } => end_time,
            ParamEvent::ExponentialRamp { end_time, .. } => end_time,
        }
    }

    #[inline]
    pub fn value(&self) -> f32 {
        match *self {
            ParamEvent::SetValue { value, .. } => value,
            ParamEvent::LinearRamp { value, .. } => value,
            ParamEvent::ExponentialRamp { value, .. } => value,
        }
    }
}

/// Low-frequency oscillator summed into a parameter.
///
/// The LFO phase is measured from `origin`, normally the start of the program
/// that owns the parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lfo {
    pub waveform: Waveform,
    /// Rate in Hz
    pub frequency: f32,
    /// Peak deviation added to the parameter
    pub depth: f32,
    pub origin: f64,
}

impl Lfo {
    pub fn new(waveform: Waveform, frequency: f32, depth: f32, origin: f64) -> Self {
        Self { waveform, frequency, depth, origin }
    }

    #[inline]
    pub fn value_at(&self, time: f64) -> f32 {
        let elapsed = (time - self.origin).max(0.0);
        let phase = (elapsed * self.frequency as f64).fract();
        self.waveform.sample(phase) * self.depth
    }
}

/// An automatable parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    default: f32,
    events: Vec<ParamEvent>,
    lfo: Option<Lfo>,
}

impl Param {
    pub fn new(default: f32) -> Self {
        Self {
            default,
            events: Vec::new(),
            lfo: None,
        }
    }

    /// Attach a modulator (builder pattern).
    pub fn with_lfo(mut self, lfo: Lfo) -> Self {
        self.lfo = Some(lfo);
        self
    }

    pub fn set_value_at_time(&mut self, value: f32, time: f64) -> &mut Self {
        self.insert(ParamEvent::SetValue { value, time })
    }

    pub fn linear_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) -> &mut Self {
        self.insert(ParamEvent::LinearRamp { value, end_time })
    }

    pub fn exponential_ramp_to_value_at_time(&mut self, value: f32, end_time: f64) -> &mut Self {
        self.insert(ParamEvent::ExponentialRamp { value, end_time })
    }

    /// Drop every event at or after `time`.
    pub fn cancel_scheduled_values(&mut self, time: f64) -> &mut Self {
        self.events.retain(|e| e.time() < time);
        self
    }

    /// Insert keeping events ordered by time; equal times keep insertion order.
    pub fn insert(&mut self, event: ParamEvent) -> &mut Self {
        let time = event.time();
        let idx = self
            .events
            .iter()
            .position(|e| e.time().partial_cmp(&time) == Some(Ordering::Greater))
            .unwrap_or(self.events.len());
        self.events.insert(idx, event);
        self
    }

    #[inline]
    pub fn default_value(&self) -> f32 {
        self.default
    }

    #[inline]
    pub fn events(&self) -> &[ParamEvent] {
        &self.events
    }

    #[inline]
    pub fn lfo(&self) -> Option<&Lfo> {
        self.lfo.as_ref()
    }

    /// Drop events that can no longer affect the value at or after `time`.
    ///
    /// Everything before the last event that has already elapsed is gone; that
    /// event stays as the anchor later ramps start from. Only valid while
    /// evaluation times never go backwards.
    pub fn forget_before(&mut self, time: f64) -> &mut Self {
        if let Some(anchor) = self.events.iter().rposition(|e| e.time() <= time) {
            self.events.drain(..anchor);
        }
        self
    }

    /// Time of the last automation event, if any.
    pub fn last_event_time(&self) -> Option<f64> {
        self.events.last().map(ParamEvent::time)
    }

    /// Automated value plus modulation at `time`.
    #[inline]
    pub fn value_at(&self, time: f64) -> f32 {
        let base = self.automated_value_at(time);
        match &self.lfo {
            Some(lfo) => base + lfo.value_at(time),
            None => base,
        }
    }

    /// Value from the automation timeline alone.
    pub fn automated_value_at(&self, time: f64) -> f32 {
        // (time, value) of the most recent event that has fully elapsed
        let mut prev_time = 0.0f64;
        let mut prev_value = self.default;

        for event in &self.events {
            match *event {
                ParamEvent::SetValue { value, time: at } => {
                    if time < at {
                        return prev_value;
                    }
                    prev_time = at;
                    prev_value = value;
                }
                ParamEvent::LinearRamp { value, end_time } => {
                    if time < end_time {
                        if time <= prev_time {
                            return prev_value;
                        }
                        let span = end_time - prev_time;
                        let frac = ((time - prev_time) / span) as f32;
                        return prev_value + (value - prev_value) * frac;
                    }
                    prev_time = end_time;
                    prev_value = value;
                }
                ParamEvent::ExponentialRamp { value, end_time } => {
                    if time < end_time {
                        if time <= prev_time {
                            return prev_value;
                        }
                        // Zero or sign-crossing endpoints have no exponential path; hold
                        if prev_value == 0.0 || value == 0.0 || (prev_value > 0.0) != (value > 0.0) {
                            return prev_value;
                        }
                        let span = end_time - prev_time;
                        let frac = (time - prev_time) / span;
                        let ratio = (value / prev_value) as f64;
                        return (prev_value as f64 * ratio.powf(frac)) as f32;
                    }
                    prev_time = end_time;
                    prev_value = value;
                }
            }
        }

        prev_value
    }
}

impl From<f32> for Param {
    fn from(value: f32) -> Self {
        Param::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn holds_default_without_events() {
        let p = Param::new(0.4);
        assert_eq!(p.value_at(0.0), 0.4);
        assert_eq!(p.value_at(100.0), 0.4);
    }

    #[test]
    fn set_value_takes_effect_at_its_time() {
        let mut p = Param::new(1.0);
        p.set_value_at_time(0.0, 2.0);
        assert_eq!(p.value_at(1.999), 1.0);
        assert_eq!(p.value_at(2.0), 0.0);
        assert_eq!(p.value_at(5.0), 0.0);
    }

    #[test]
    fn linear_ramp_interpolates_from_previous_event() {
        let mut p = Param::new(0.0);
        p.set_value_at_time(0.0, 1.0)
            .linear_ramp_to_value_at_time(0.8, 1.2)
            .linear_ramp_to_value_at_time(0.0, 4.0);

        assert_eq!(p.value_at(0.5), 0.0);
        assert!(close(p.value_at(1.1), 0.4));
        assert!(close(p.value_at(1.2), 0.8));
        assert!(close(p.value_at(2.6), 0.4));
        assert_eq!(p.value_at(4.0), 0.0);
    }

    #[test]
    fn exponential_ramp_is_geometric() {
        let mut p = Param::new(100.0);
        p.set_value_at_time(100.0, 0.0)
            .exponential_ramp_to_value_at_time(400.0, 2.0);

        // Halfway in time is the geometric mean
        assert!(close(p.value_at(1.0), 200.0));
        assert!(close(p.value_at(2.0), 400.0));
        assert!(close(p.value_at(3.0), 400.0));
    }

    #[test]
    fn exponential_ramp_to_zero_steps_at_end() {
        let mut p = Param::new(0.5);
        p.set_value_at_time(0.5, 0.0)
            .exponential_ramp_to_value_at_time(0.0, 1.0);
        assert_eq!(p.value_at(0.99), 0.5);
        assert_eq!(p.value_at(1.0), 0.0);
    }

    #[test]
    fn events_stay_ordered_regardless_of_insertion_order() {
        let mut p = Param::new(0.0);
        p.linear_ramp_to_value_at_time(1.0, 2.0);
        p.set_value_at_time(0.0, 1.0);
        let times: Vec<f64> = p.events().iter().map(ParamEvent::time).collect();
        assert_eq!(times, vec![1.0, 2.0]);
        assert!(close(p.value_at(1.5), 0.5));
    }

    #[test]
    fn cancel_drops_future_events() {
        let mut p = Param::new(0.4);
        p.set_value_at_time(0.0, 1.0).set_value_at_time(0.4, 3.0);
        p.cancel_scheduled_values(2.0);
        assert_eq!(p.events().len(), 1);
        assert_eq!(p.value_at(10.0), 0.0);
    }

    #[test]
    fn forgetting_elapsed_events_keeps_later_values() {
        let mut p = Param::new(0.0);
        p.set_value_at_time(0.0, 0.0)
            .linear_ramp_to_value_at_time(1.0, 1.0)
            .set_value_at_time(0.5, 2.0)
            .linear_ramp_to_value_at_time(0.1, 4.0);
        let before: Vec<f32> = [2.0, 2.5, 3.0, 5.0].iter().map(|&t| p.value_at(t)).collect();

        p.forget_before(2.5);
        assert_eq!(p.events().len(), 2);
        let after: Vec<f32> = [2.5, 3.0, 5.0].iter().map(|&t| p.value_at(t)).collect();
        assert_eq!(&before[1..], &after[..]);

        // Nothing elapsed yet: untouched
        let mut q = Param::new(0.4);
        q.set_value_at_time(0.0, 1.0);
        q.forget_before(0.5);
        assert_eq!(q.events().len(), 1);
    }

    #[test]
    fn lfo_adds_to_automation() {
        let p = Param::new(400.0).with_lfo(Lfo::new(Waveform::Sine, 1.0, 100.0, 0.0));
        assert!(close(p.value_at(0.0), 400.0));
        assert!(close(p.value_at(0.25), 500.0));
        assert!(close(p.value_at(0.75), 300.0));
        assert_eq!(p.automated_value_at(0.25), 400.0);
    }
}
