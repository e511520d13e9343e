//! Interaction state machine for adjusting one target's count.
//!
//! The adjuster reconciles two input styles on a single surface: discrete
//! taps (increment by one) and continuous vertical drags (scrub the value).
//! A press only becomes a drag once it travels past a per-sample threshold,
//! so "no meaningful movement yet" stays tap-eligible. Pushing the value
//! below zero enters the explicit [`AdjusterState::Clearing`] state, which
//! renders differently and only reacts to upward movement; this keeps the
//! boundary between `0` and "no record" from flickering under jitter.
//!
//! Transitions are pure with respect to the event stream: the same
//! [`GestureEvent`]s produce the same commits whether they originate from
//! mouse, touch, or key input.

use thiserror::Error;

use crate::models::{clamp_count, Commit, MAX_COUNT};

/// Rows of pointer travel that map to one value step while dragging.
pub const DRAG_SENSITIVITY: f64 = 2.0;

/// Movement below this many rows keeps a press tap-eligible.
pub const DRAG_THRESHOLD: i32 = 1;

/// Upward travel, in rows within one sample, required to leave `Clearing`.
pub const CLEAR_EXIT_DELTA: i32 = 2;

/// A feedback pulse for the host to forward to whatever haptic channel
/// exists (vibration, terminal bell); hosts without one drop it silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse(pub u16);

impl Pulse {
    /// Light pulse for a tap increment.
    pub const TAP: Pulse = Pulse(8);
    /// Pulse for a drag step that changed the value.
    pub const STEP: Pulse = Pulse(50);
    /// Pulse for crossing into or out of the clearing state.
    pub const BOUNDARY: Pulse = Pulse(20);
    /// Pulse for an increment absorbed at the cap.
    pub const CAPPED: Pulse = Pulse(30);
}

/// The adjuster's position in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjusterState {
    /// Holding a concrete value.
    Idle(u8),
    /// About to delete the record; the next commit is a clear.
    Clearing,
    /// Session ended; all further events are ignored.
    Closed,
}

/// One raw input sample, in the coordinate space of the host surface.
///
/// Rows grow downward, matching both pixel and terminal conventions, so an
/// upward swipe produces a positive delta against the previous sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    /// A completed tap that never became a press (key activation).
    Tap,
    /// Pointer pressed at this row.
    Down(u16),
    /// Pointer moved to this row while pressed.
    Drag(u16),
    /// Pointer released.
    Up,
    /// The surface was dismissed.
    Close,
}

/// What a transition produced: at most one commit and one feedback pulse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Value decision to report upward, if the value actually changed.
    pub commit: Option<Commit>,
    /// Feedback to forward to the haptic channel.
    pub feedback: Option<Pulse>,
}

impl Outcome {
    fn none() -> Self {
        Outcome::default()
    }

    fn feedback(pulse: Pulse) -> Self {
        Outcome {
            commit: None,
            feedback: Some(pulse),
        }
    }
}

/// One open adjuster session for a single target.
///
/// Created when the surface opens, dropped when it closes; only the commits
/// it emitted outlive it.
#[derive(Debug, Clone)]
pub struct Adjuster {
    state: AdjusterState,
    anchor: Option<u16>,
    dragging: bool,
    last_emitted: Commit,
}

impl Adjuster {
    /// Open a session over the target's current value.
    ///
    /// An absent value starts the session in `Clearing`, so the first tap
    /// commits `0` rather than `1`.
    pub fn new(initial: Option<u8>) -> Self {
        match initial {
            Some(value) => {
                let value = value.min(MAX_COUNT);
                Adjuster {
                    state: AdjusterState::Idle(value),
                    anchor: None,
                    dragging: false,
                    last_emitted: Commit::Set(value),
                }
            }
            None => Adjuster {
                state: AdjusterState::Clearing,
                anchor: None,
                dragging: false,
                last_emitted: Commit::Clear,
            },
        }
    }

    /// Current state.
    pub fn state(&self) -> AdjusterState {
        self.state
    }

    /// The live working value, or `None` while clearing or closed.
    pub fn value(&self) -> Option<u8> {
        match self.state {
            AdjusterState::Idle(value) => Some(value),
            _ => None,
        }
    }

    /// Whether the next commit would delete the record.
    pub fn is_clearing(&self) -> bool {
        self.state == AdjusterState::Clearing
    }

    /// Whether the session has ended.
    pub fn is_closed(&self) -> bool {
        self.state == AdjusterState::Closed
    }

    /// Advance the machine by one event.
    pub fn handle(&mut self, event: GestureEvent) -> Outcome {
        if self.is_closed() {
            return Outcome::none();
        }
        match event {
            GestureEvent::Tap => self.tap(),
            GestureEvent::Down(row) => {
                self.anchor = Some(row);
                self.dragging = false;
                Outcome::none()
            }
            GestureEvent::Drag(row) => self.drag_to(row),
            GestureEvent::Up => {
                let pressed = self.anchor.take().is_some();
                let dragged = std::mem::take(&mut self.dragging);
                if pressed && !dragged {
                    // A press that never travelled is a tap.
                    self.tap()
                } else {
                    self.finish_drag()
                }
            }
            GestureEvent::Close => {
                self.state = AdjusterState::Closed;
                self.anchor = None;
                self.dragging = false;
                Outcome::none()
            }
        }
    }

    fn tap(&mut self) -> Outcome {
        match self.state {
            AdjusterState::Clearing => {
                self.state = AdjusterState::Idle(0);
                self.emit(Commit::Set(0), Pulse::BOUNDARY)
            }
            AdjusterState::Idle(value) => {
                if value >= MAX_COUNT {
                    // Absorbed at the cap; cue, no commit.
                    return Outcome::feedback(Pulse::CAPPED);
                }
                let next = value + 1;
                self.state = AdjusterState::Idle(next);
                self.emit(Commit::Set(next), Pulse::TAP)
            }
            AdjusterState::Closed => Outcome::none(),
        }
    }

    fn drag_to(&mut self, row: u16) -> Outcome {
        let Some(anchor) = self.anchor else {
            return Outcome::none();
        };
        // Upward movement (toward smaller rows) is positive.
        let delta = i32::from(anchor) - i32::from(row);
        if !self.dragging && delta.abs() < DRAG_THRESHOLD {
            return Outcome::none();
        }
        self.dragging = true;
        // Deltas are taken against the previous sample, not the press
        // origin, so sensitivity is uniform over the whole drag.
        self.anchor = Some(row);

        match self.state {
            AdjusterState::Clearing => {
                if delta >= CLEAR_EXIT_DELTA {
                    self.state = AdjusterState::Idle(0);
                    self.emit(Commit::Set(0), Pulse::BOUNDARY)
                } else {
                    // Below the clearing state there is nothing to scrub to.
                    Outcome::none()
                }
            }
            AdjusterState::Idle(value) => {
                let steps = (f64::from(delta) / DRAG_SENSITIVITY).round() as i32;
                if steps == 0 {
                    return Outcome::none();
                }
                let candidate = i32::from(value) + steps;
                if candidate < 0 {
                    self.state = AdjusterState::Clearing;
                    self.emit(Commit::Clear, Pulse::BOUNDARY)
                } else {
                    let next = clamp_count(i64::from(candidate));
                    let absorbed = candidate > i32::from(MAX_COUNT);
                    if next == value {
                        if absorbed {
                            return Outcome::feedback(Pulse::CAPPED);
                        }
                        return Outcome::none();
                    }
                    self.state = AdjusterState::Idle(next);
                    let pulse = if absorbed { Pulse::CAPPED } else { Pulse::STEP };
                    self.emit(Commit::Set(next), pulse)
                }
            }
            AdjusterState::Closed => Outcome::none(),
        }
    }

    fn finish_drag(&mut self) -> Outcome {
        let current = match self.state {
            AdjusterState::Idle(value) => Commit::Set(value),
            AdjusterState::Clearing => Commit::Clear,
            AdjusterState::Closed => return Outcome::none(),
        };
        // Intermediate emissions already happened per sample; this only
        // fires if a final sample was swallowed by dedupe bookkeeping.
        self.emit(current, Pulse::STEP)
    }

    fn emit(&mut self, commit: Commit, pulse: Pulse) -> Outcome {
        if commit == self.last_emitted {
            return Outcome::none();
        }
        self.last_emitted = commit;
        Outcome {
            commit: Some(commit),
            feedback: Some(pulse),
        }
    }
}

/// How discrete-mode entry treats values above [`MAX_COUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePolicy {
    /// Clamp to the maximum (day cells).
    Clamp,
    /// Reject with a validation error (the weekly goal).
    Reject,
}

/// Rejected discrete-mode input. Never mutates state; the user re-invokes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Not a non-negative integer.
    #[error("enter a whole number of 0 or more, or leave blank to clear")]
    NotACount,
    /// Above the maximum under [`RangePolicy::Reject`].
    #[error("enter a number between 0 and {MAX_COUNT}, or leave blank to clear")]
    OutOfRange,
}

/// Parse one discrete-mode entry into a commit.
///
/// An empty or whitespace-only entry commits a clear. Cancellation never
/// reaches this function; the host simply discards the prompt.
pub fn parse_entry(input: &str, policy: RangePolicy) -> Result<Commit, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Commit::Clear);
    }
    let value: i64 = trimmed.parse().map_err(|_| ValidationError::NotACount)?;
    if value < 0 {
        return Err(ValidationError::NotACount);
    }
    if value > i64::from(MAX_COUNT) {
        return match policy {
            RangePolicy::Clamp => Ok(Commit::Set(MAX_COUNT)),
            RangePolicy::Reject => Err(ValidationError::OutOfRange),
        };
    }
    Ok(Commit::Set(value as u8))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(adjuster: &mut Adjuster, events: &[GestureEvent]) -> Vec<Commit> {
        events
            .iter()
            .filter_map(|event| adjuster.handle(*event).commit)
            .collect()
    }

    #[test]
    fn opens_clearing_when_value_absent() {
        let adjuster = Adjuster::new(None);
        assert!(adjuster.is_clearing());
        assert_eq!(adjuster.value(), None);
    }

    #[test]
    fn opens_idle_on_existing_value() {
        let adjuster = Adjuster::new(Some(7));
        assert_eq!(adjuster.state(), AdjusterState::Idle(7));
        assert_eq!(adjuster.value(), Some(7));
    }

    #[test]
    fn tap_from_clearing_commits_zero_not_one() {
        let mut adjuster = Adjuster::new(None);
        let outcome = adjuster.handle(GestureEvent::Tap);
        assert_eq!(outcome.commit, Some(Commit::Set(0)));
        assert_eq!(adjuster.state(), AdjusterState::Idle(0));
    }

    #[test]
    fn tap_from_zero_commits_one() {
        let mut adjuster = Adjuster::new(Some(0));
        let outcome = adjuster.handle(GestureEvent::Tap);
        assert_eq!(outcome.commit, Some(Commit::Set(1)));
    }

    #[test]
    fn taps_stay_open_and_keep_counting() {
        let mut adjuster = Adjuster::new(Some(3));
        let commits = drain(
            &mut adjuster,
            &[GestureEvent::Tap, GestureEvent::Tap, GestureEvent::Tap],
        );
        assert_eq!(
            commits,
            vec![Commit::Set(4), Commit::Set(5), Commit::Set(6)]
        );
        assert!(!adjuster.is_closed());
    }

    #[test]
    fn tap_at_cap_is_absorbed() {
        let mut adjuster = Adjuster::new(Some(MAX_COUNT));
        let outcome = adjuster.handle(GestureEvent::Tap);
        assert_eq!(outcome.commit, None);
        assert_eq!(outcome.feedback, Some(Pulse::CAPPED));
        assert_eq!(adjuster.value(), Some(MAX_COUNT));
    }

    #[test]
    fn press_without_travel_resolves_as_tap() {
        let mut adjuster = Adjuster::new(Some(2));
        let commits = drain(&mut adjuster, &[GestureEvent::Down(20), GestureEvent::Up]);
        assert_eq!(commits, vec![Commit::Set(3)]);
    }

    #[test]
    fn upward_drag_increments_per_sensitivity() {
        let mut adjuster = Adjuster::new(Some(5));
        adjuster.handle(GestureEvent::Down(20));
        // Two rows up is one step at the default sensitivity.
        let outcome = adjuster.handle(GestureEvent::Drag(18));
        assert_eq!(outcome.commit, Some(Commit::Set(6)));
        // Press that travelled does not also count as a tap on release.
        assert_eq!(adjuster.handle(GestureEvent::Up).commit, None);
        assert_eq!(adjuster.value(), Some(6));
    }

    #[test]
    fn drag_deltas_are_per_sample_not_from_press_origin() {
        let mut adjuster = Adjuster::new(Some(5));
        adjuster.handle(GestureEvent::Down(20));
        assert_eq!(
            adjuster.handle(GestureEvent::Drag(18)).commit,
            Some(Commit::Set(6))
        );
        // Returning to the origin row undoes exactly one step.
        assert_eq!(
            adjuster.handle(GestureEvent::Drag(20)).commit,
            Some(Commit::Set(5))
        );
    }

    #[test]
    fn downward_drag_reaches_zero_then_clearing_never_negative() {
        let mut adjuster = Adjuster::new(Some(1));
        adjuster.handle(GestureEvent::Down(10));
        // One step down lands exactly on zero.
        assert_eq!(
            adjuster.handle(GestureEvent::Drag(12)).commit,
            Some(Commit::Set(0))
        );
        assert_eq!(adjuster.state(), AdjusterState::Idle(0));
        // The next downward step pushes below zero and enters Clearing.
        let outcome = adjuster.handle(GestureEvent::Drag(14));
        assert_eq!(outcome.commit, Some(Commit::Clear));
        assert!(adjuster.is_clearing());
    }

    #[test]
    fn small_downward_drag_while_clearing_is_noop() {
        let mut adjuster = Adjuster::new(None);
        adjuster.handle(GestureEvent::Down(10));
        let outcome = adjuster.handle(GestureEvent::Drag(11));
        assert_eq!(outcome, Outcome::default());
        assert!(adjuster.is_clearing());
    }

    #[test]
    fn large_upward_drag_exits_clearing_at_zero() {
        let mut adjuster = Adjuster::new(None);
        adjuster.handle(GestureEvent::Down(10));
        let outcome = adjuster.handle(GestureEvent::Drag(10 - CLEAR_EXIT_DELTA as u16));
        assert_eq!(outcome.commit, Some(Commit::Set(0)));
        assert_eq!(adjuster.state(), AdjusterState::Idle(0));
    }

    #[test]
    fn emissions_never_leave_the_valid_range() {
        let mut adjuster = Adjuster::new(Some(90));
        adjuster.handle(GestureEvent::Down(200));
        let mut commits = Vec::new();
        for row in (0..200).rev() {
            if let Some(commit) = adjuster.handle(GestureEvent::Drag(row)).commit {
                commits.push(commit);
            }
        }
        assert!(commits
            .iter()
            .all(|commit| commit.value().is_some_and(|v| v <= MAX_COUNT)));
        assert_eq!(adjuster.value(), Some(MAX_COUNT));
    }

    #[test]
    fn repeated_samples_at_same_value_are_deduplicated() {
        let mut adjuster = Adjuster::new(Some(5));
        adjuster.handle(GestureEvent::Down(20));
        assert_eq!(
            adjuster.handle(GestureEvent::Drag(18)).commit,
            Some(Commit::Set(6))
        );
        // Sub-step wiggle emits nothing further.
        assert_eq!(adjuster.handle(GestureEvent::Drag(18)).commit, None);
        assert_eq!(adjuster.handle(GestureEvent::Up).commit, None);
    }

    #[test]
    fn close_is_terminal() {
        let mut adjuster = Adjuster::new(Some(4));
        assert_eq!(adjuster.handle(GestureEvent::Close).commit, None);
        assert!(adjuster.is_closed());
        assert_eq!(adjuster.handle(GestureEvent::Tap), Outcome::default());
        assert_eq!(adjuster.handle(GestureEvent::Down(5)), Outcome::default());
    }

    #[test]
    fn clearing_round_trip_commits_in_order() {
        let mut adjuster = Adjuster::new(Some(1));
        adjuster.handle(GestureEvent::Down(10));
        let mut commits = Vec::new();
        for event in [
            GestureEvent::Drag(12),
            GestureEvent::Drag(14),
            GestureEvent::Drag(14 - CLEAR_EXIT_DELTA as u16),
        ] {
            if let Some(commit) = adjuster.handle(event).commit {
                commits.push(commit);
            }
        }
        assert_eq!(
            commits,
            vec![Commit::Set(0), Commit::Clear, Commit::Set(0)]
        );
    }

    #[test]
    fn discrete_valid_values_round_trip() {
        for value in [0u8, 1, 42, MAX_COUNT] {
            assert_eq!(
                parse_entry(&value.to_string(), RangePolicy::Clamp),
                Ok(Commit::Set(value))
            );
        }
    }

    #[test]
    fn discrete_blank_clears() {
        assert_eq!(parse_entry("", RangePolicy::Clamp), Ok(Commit::Clear));
        assert_eq!(parse_entry("   ", RangePolicy::Reject), Ok(Commit::Clear));
    }

    #[test]
    fn discrete_rejects_garbage_and_negatives() {
        for bad in ["three", "3.5", "-1", "1e2"] {
            assert_eq!(
                parse_entry(bad, RangePolicy::Clamp),
                Err(ValidationError::NotACount)
            );
        }
    }

    #[test]
    fn discrete_range_policy_split() {
        assert_eq!(
            parse_entry("105", RangePolicy::Clamp),
            Ok(Commit::Set(MAX_COUNT))
        );
        assert_eq!(
            parse_entry("105", RangePolicy::Reject),
            Err(ValidationError::OutOfRange)
        );
    }
}
