//! Trial sequencing state machine for the aiming task.
//!
//! One session runs `trial_count` discrete trials: a target appears at a
//! random position and size, the subject clicks at it through the
//! impairment transform, and each successful hit is timed and recorded.
//! All state mutation funnels through `tick` and `submit_input`; delayed
//! evaluations are plain data in a scheduler queue drained by `tick`, so
//! there is exactly one dispatch path even though input evaluation can be
//! deferred by the simulated reaction lag.

use crate::config::{ConfigurationError, SessionConfig};
use crate::event::SessionEvent;
use crate::sway::SwayState;
use crate::transform::transform_input;
use fitts_core::{ImpairmentProfile, Point, TargetSpec, TrialDataset, TrialObservation};
use fitts_timing::{Clock, Scheduler};
use rand::Rng;
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Debug, Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("session has already been started")]
    AlreadyStarted,
    #[error("session is not complete; the dataset is still mutable")]
    NotComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Countdown,
    Presenting,
    AwaitingInput,
    /// Transient: only ever observed from within an evaluating call.
    Evaluating,
    Complete,
}

/// Snapshot bound at `submit_input` time for deferred evaluation.
///
/// The trial index and target are captured here, not re-read when the
/// delay expires: by the time a deferred input fires, the session may
/// have advanced past the captured trial (which can only happen because
/// that trial already succeeded via another input), and evaluating the
/// late input against whatever target happens to be live would let it
/// hit a target the subject never aimed at.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingEvaluation {
    trial_index: usize,
    target: TargetSpec,
    position: Point,
}

pub struct TrialController<C: Clock, R: Rng> {
    clock: C,
    rng: R,
    config: SessionConfig,
    profile: ImpairmentProfile,
    state: SessionState,
    /// 1-based index of the live trial; 0 before the first presentation.
    trial_index: usize,
    target: Option<TargetSpec>,
    sway: SwayState,
    presentation_start_ms: u64,
    previous_hit_point: Point,
    countdown_started_ms: u64,
    countdown_value: Option<u64>,
    pending: Scheduler<PendingEvaluation>,
    dataset: TrialDataset,
}

impl<C: Clock, R: Rng> TrialController<C, R> {
    pub fn new(config: SessionConfig, profile: ImpairmentProfile, clock: C, rng: R) -> Self {
        let sway = SwayState::new(profile.sway_px);
        let previous_hit_point = config.surface.center();
        let dataset = TrialDataset::new(profile.level);
        Self {
            clock,
            rng,
            config,
            profile,
            state: SessionState::Idle,
            trial_index: 0,
            target: None,
            sway,
            presentation_start_ms: 0,
            previous_hit_point,
            countdown_started_ms: 0,
            countdown_value: None,
            pending: Scheduler::new(),
            dataset,
        }
    }

    /// Validates the configuration and opens the pre-trial countdown.
    pub fn start(&mut self) -> Result<Vec<SessionEvent>, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::AlreadyStarted);
        }
        self.config.validate()?;

        self.countdown_started_ms = self.clock.now_ms();
        self.countdown_value = Some(self.config.countdown_secs);
        self.state = SessionState::Countdown;
        debug!(level = %self.profile.level, trials = self.config.trial_count, "session started");
        Ok(vec![SessionEvent::CountdownTick(self.config.countdown_secs)])
    }

    /// Advances timers: countdown steps, sway re-rolls and due deferred
    /// evaluations. Never records data except through a fired evaluation.
    pub fn tick(&mut self) -> Vec<SessionEvent> {
        let now = self.clock.now_ms();
        let mut events = Vec::new();

        match self.state {
            SessionState::Idle | SessionState::Complete => {}
            SessionState::Countdown => {
                let elapsed_steps = self.clock.elapsed_ms(self.countdown_started_ms) / 1_000;
                if elapsed_steps > self.config.countdown_secs {
                    // The final "0" second has elapsed; show trial 1.
                    self.present_next_target(now, &mut events);
                } else {
                    let value = self.config.countdown_secs - elapsed_steps;
                    if self.countdown_value != Some(value) {
                        self.countdown_value = Some(value);
                        events.push(SessionEvent::CountdownTick(value));
                    }
                }
            }
            SessionState::Presenting => {
                self.state = SessionState::AwaitingInput;
                self.advance_sway(now, &mut events);
                self.fire_due_evaluations(now, &mut events);
            }
            SessionState::AwaitingInput => {
                self.advance_sway(now, &mut events);
                self.fire_due_evaluations(now, &mut events);
            }
            // Transient within an evaluating call; tick never sees it.
            SessionState::Evaluating => {}
        }

        events
    }

    /// The only path into trial evaluation. Outside `AwaitingInput` the
    /// event is dropped without side effect: stray clicks before a target
    /// is up (or after the session ended) must not produce records.
    pub fn submit_input(&mut self, raw_position: Point) -> Vec<SessionEvent> {
        if self.state != SessionState::AwaitingInput {
            trace!(state = ?self.state, "input ignored");
            return Vec::new();
        }
        let target = match self.target {
            Some(target) => target,
            None => return Vec::new(),
        };

        let now = self.clock.now_ms();
        let transformed =
            transform_input(raw_position, &self.profile, self.config.surface, &mut self.rng);
        let snapshot = PendingEvaluation {
            trial_index: self.trial_index,
            target,
            position: transformed.position,
        };

        let mut events = Vec::new();
        if transformed.delay_ms > 0 {
            let fire_at_ms = now + transformed.delay_ms;
            self.pending.schedule(fire_at_ms, snapshot);
            events.push(SessionEvent::InputDeferred {
                trial_index: self.trial_index,
                fire_at_ms,
            });
        } else {
            self.evaluate(snapshot, now, &mut events);
        }
        events
    }

    /// Force-terminates the session, cancelling all deferred evaluations
    /// and freezing whatever observations exist. Always succeeds.
    pub fn end(&mut self) -> Vec<SessionEvent> {
        if self.state == SessionState::Complete {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.complete(&mut events);
        events
    }

    /// Consumes the controller and releases the finalized dataset.
    pub fn into_dataset(self) -> Result<TrialDataset, SessionError> {
        if self.state != SessionState::Complete {
            return Err(SessionError::NotComplete);
        }
        Ok(self.dataset)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// 1-based index of the live trial, if a target is up.
    pub fn trial_index(&self) -> Option<usize> {
        self.target.map(|_| self.trial_index)
    }

    pub fn current_target(&self) -> Option<TargetSpec> {
        self.target
    }

    /// Where the live target should be drawn right now, sway included.
    pub fn rendered_target_center(&self) -> Option<Point> {
        self.target.as_ref().map(|t| self.sway.swayed_center(t))
    }

    pub fn countdown_value(&self) -> Option<u64> {
        match self.state {
            SessionState::Countdown => self.countdown_value,
            _ => None,
        }
    }

    pub fn recorded(&self) -> usize {
        self.dataset.len()
    }

    pub fn pending_evaluations(&self) -> usize {
        self.pending.len()
    }

    fn advance_sway(&mut self, now: u64, events: &mut Vec<SessionEvent>) {
        if self
            .sway
            .advance(now, self.config.sway_interval_ms, &mut self.rng)
        {
            if let Some(target) = &self.target {
                events.push(SessionEvent::TargetSwayed {
                    trial_index: self.trial_index,
                    center: self.sway.swayed_center(target),
                });
            }
        }
    }

    fn fire_due_evaluations(&mut self, now: u64, events: &mut Vec<SessionEvent>) {
        for snapshot in self.pending.pop_due(now) {
            self.evaluate(snapshot, now, events);
            if self.state == SessionState::Complete {
                break;
            }
        }
    }

    fn evaluate(&mut self, snapshot: PendingEvaluation, now: u64, events: &mut Vec<SessionEvent>) {
        // A deferred evaluation may fire after cancellation; the terminal
        // state wins and the finalized dataset stays untouched.
        if self.state == SessionState::Complete {
            return;
        }
        // Stale snapshot: the captured trial already succeeded through an
        // earlier input, so this late input can only duplicate a finished
        // trial or poach the next target. Drop it.
        if snapshot.trial_index != self.trial_index {
            debug!(
                captured = snapshot.trial_index,
                live = self.trial_index,
                "discarding stale deferred evaluation"
            );
            return;
        }

        self.state = SessionState::Evaluating;

        // Hit-test against the latest swayed center, not the generated one.
        let evaluated_center = self.sway.swayed_center(&snapshot.target);
        if !snapshot
            .target
            .contains(snapshot.position, evaluated_center, self.config.hit_tolerance_px)
        {
            events.push(SessionEvent::Miss {
                trial_index: self.trial_index,
            });
            self.state = SessionState::AwaitingInput;
            return;
        }

        let elapsed_ms = now.saturating_sub(self.presentation_start_ms) as f64;
        let distance_px = self.previous_hit_point.distance_to(snapshot.target.center);
        match TrialObservation::new(
            self.trial_index,
            snapshot.target.diameter_px(),
            distance_px,
            elapsed_ms,
        ) {
            Ok(observation) => {
                self.dataset.push(observation);
                self.previous_hit_point = snapshot.target.center;
                events.push(SessionEvent::Hit { observation });
                if self.trial_index >= self.config.trial_count {
                    self.complete(events);
                } else {
                    self.present_next_target(now, events);
                }
            }
            Err(err) => {
                // Zero elapsed time means the clock did not move between
                // presentation and evaluation; treat as a fault, not data.
                warn!(trial = self.trial_index, %err, "rejected observation");
                self.state = SessionState::AwaitingInput;
            }
        }
    }

    fn present_next_target(&mut self, now: u64, events: &mut Vec<SessionEvent>) {
        self.trial_index += 1;
        let target = self.generate_target();
        self.target = Some(target);
        self.sway.reset(now);
        self.presentation_start_ms = now;
        self.countdown_value = None;
        self.state = SessionState::Presenting;
        events.push(SessionEvent::TargetPresented {
            trial_index: self.trial_index,
            target,
        });
    }

    fn generate_target(&mut self) -> TargetSpec {
        let radius = self
            .rng
            .random_range(self.config.min_radius_px..=self.config.max_radius_px);
        let cx = self.rng.random_range(radius..=self.config.surface.width - radius);
        let cy = self
            .rng
            .random_range(radius..=self.config.surface.height - radius);
        TargetSpec::new(Point::new(cx, cy), radius)
    }

    fn complete(&mut self, events: &mut Vec<SessionEvent>) {
        self.pending.cancel_all();
        self.target = None;
        self.countdown_value = None;
        self.state = SessionState::Complete;
        debug!(recorded = self.dataset.len(), "session complete");
        events.push(SessionEvent::SessionComplete {
            recorded: self.dataset.len(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitts_core::ImpairmentLevel;
    use fitts_timing::ManualClock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn controller(
        profile: ImpairmentProfile,
        trial_count: usize,
    ) -> (TrialController<ManualClock, StdRng>, ManualClock) {
        let clock = ManualClock::new();
        let config = SessionConfig {
            trial_count,
            ..SessionConfig::default()
        };
        let controller =
            TrialController::new(config, profile, clock.clone(), StdRng::seed_from_u64(1234));
        (controller, clock)
    }

    /// Runs the countdown out so the first target is up and awaited.
    fn run_countdown(
        controller: &mut TrialController<ManualClock, StdRng>,
        clock: &ManualClock,
    ) {
        controller.start().unwrap();
        clock.advance(4_000);
        controller.tick();
        assert_eq!(controller.state(), SessionState::Presenting);
        controller.tick();
        assert_eq!(controller.state(), SessionState::AwaitingInput);
    }

    fn hit_current_target(
        controller: &mut TrialController<ManualClock, StdRng>,
        clock: &ManualClock,
    ) -> Vec<SessionEvent> {
        clock.advance(300);
        controller.tick();
        let center = controller.rendered_target_center().unwrap();
        controller.submit_input(center)
    }

    #[test]
    fn start_rejects_invalid_config() {
        let clock = ManualClock::new();
        let config = SessionConfig {
            trial_count: 0,
            ..SessionConfig::default()
        };
        let mut controller = TrialController::new(
            config,
            ImpairmentLevel::Normal.profile(),
            clock,
            StdRng::seed_from_u64(0),
        );
        assert_eq!(
            controller.start(),
            Err(SessionError::Configuration(
                ConfigurationError::ZeroTrialCount
            ))
        );
        assert_eq!(controller.state(), SessionState::Idle);
    }

    #[test]
    fn start_twice_is_an_error() {
        let (mut controller, _clock) = controller(ImpairmentLevel::Normal.profile(), 3);
        controller.start().unwrap();
        assert_eq!(controller.start(), Err(SessionError::AlreadyStarted));
    }

    #[test]
    fn countdown_steps_once_per_second() {
        let (mut controller, clock) = controller(ImpairmentLevel::Normal.profile(), 3);
        let events = controller.start().unwrap();
        assert_eq!(events, vec![SessionEvent::CountdownTick(3)]);

        clock.advance(400);
        assert!(controller.tick().is_empty());

        clock.advance(600);
        assert_eq!(controller.tick(), vec![SessionEvent::CountdownTick(2)]);
        assert_eq!(controller.countdown_value(), Some(2));

        clock.advance(2_000);
        assert_eq!(controller.tick(), vec![SessionEvent::CountdownTick(0)]);

        clock.advance(1_000);
        let events = controller.tick();
        assert!(matches!(
            events[0],
            SessionEvent::TargetPresented { trial_index: 1, .. }
        ));
        assert_eq!(controller.countdown_value(), None);
    }

    #[test]
    fn input_before_target_is_ignored() {
        let (mut controller, clock) = controller(ImpairmentLevel::Normal.profile(), 3);
        assert!(controller.submit_input(Point::new(10.0, 10.0)).is_empty());
        controller.start().unwrap();
        clock.advance(500);
        controller.tick();
        assert!(controller.submit_input(Point::new(10.0, 10.0)).is_empty());
        assert_eq!(controller.recorded(), 0);
    }

    #[test]
    fn three_hits_complete_a_three_trial_session() {
        let (mut controller, clock) = controller(ImpairmentLevel::Normal.profile(), 3);
        run_countdown(&mut controller, &clock);

        for trial in 1..=2 {
            let events = hit_current_target(&mut controller, &clock);
            assert!(events.iter().any(|e| matches!(e, SessionEvent::Hit { .. })));
            assert_eq!(controller.recorded(), trial);
            controller.tick();
            assert_eq!(controller.state(), SessionState::AwaitingInput);
        }

        let events = hit_current_target(&mut controller, &clock);
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::SessionComplete { recorded: 3 })));
        assert_eq!(controller.state(), SessionState::Complete);

        // A 4th input after completion is a no-op.
        assert!(controller
            .submit_input(Point::new(400.0, 300.0))
            .is_empty());

        let dataset = controller.into_dataset().unwrap();
        assert_eq!(dataset.len(), 3);
        for (i, obs) in dataset.observations().iter().enumerate() {
            assert_eq!(obs.trial_index, i + 1);
            assert!(obs.movement_time_ms > 0.0);
        }
    }

    #[test]
    fn first_trial_distance_is_measured_from_surface_center() {
        let (mut controller, clock) = controller(ImpairmentLevel::Normal.profile(), 1);
        run_countdown(&mut controller, &clock);
        let target = controller.current_target().unwrap();
        let expected = SessionConfig::default()
            .surface
            .center()
            .distance_to(target.center);

        let events = hit_current_target(&mut controller, &clock);
        let observation = events
            .iter()
            .find_map(|e| match e {
                SessionEvent::Hit { observation } => Some(*observation),
                _ => None,
            })
            .unwrap();
        assert!((observation.distance_px - expected).abs() < 1e-9);
        assert_eq!(observation.target_diameter_px, target.diameter_px());
    }

    #[test]
    fn miss_keeps_target_live_and_records_nothing() {
        let (mut controller, clock) = controller(ImpairmentLevel::Normal.profile(), 2);
        run_countdown(&mut controller, &clock);
        let target = controller.current_target().unwrap();

        clock.advance(200);
        let far = Point::new(
            target.center.x + target.radius_px + 50.0,
            target.center.y,
        );
        let events = controller.submit_input(far);
        assert_eq!(events, vec![SessionEvent::Miss { trial_index: 1 }]);
        assert_eq!(controller.recorded(), 0);
        assert_eq!(controller.state(), SessionState::AwaitingInput);
        assert_eq!(controller.current_target(), Some(target));
    }

    #[test]
    fn zero_elapsed_hit_is_rejected_not_recorded() {
        let (mut controller, clock) = controller(ImpairmentLevel::Normal.profile(), 1);
        run_countdown(&mut controller, &clock);
        // No clock movement since presentation: elapsed would be 0 ms.
        let center = controller.rendered_target_center().unwrap();
        controller.submit_input(center);
        assert_eq!(controller.recorded(), 0);
        assert_eq!(controller.state(), SessionState::AwaitingInput);
        // Once the clock moves the same click lands.
        clock.advance(150);
        controller.submit_input(center);
        assert_eq!(controller.recorded(), 1);
    }

    #[test]
    fn delayed_input_waits_for_its_deadline() {
        let (mut controller, clock) = controller(ImpairmentLevel::Moderate.profile(), 1);
        run_countdown(&mut controller, &clock);

        clock.advance(400);
        controller.tick();
        let center = controller.rendered_target_center().unwrap();
        let events = controller.submit_input(center);
        let fire_at = events
            .iter()
            .find_map(|e| match e {
                SessionEvent::InputDeferred { fire_at_ms, .. } => Some(*fire_at_ms),
                _ => None,
            })
            .expect("moderate profile must defer evaluation");
        assert_eq!(controller.pending_evaluations(), 1);
        assert_eq!(controller.recorded(), 0);

        // Before the deadline nothing fires.
        clock.set(fire_at - 1);
        controller.tick();
        assert_eq!(controller.pending_evaluations(), 1);

        clock.set(fire_at);
        let events = controller.tick();
        assert_eq!(controller.pending_evaluations(), 0);
        // The moderate profile also jitters the position, so the deferred
        // click may hit or miss; either way it was evaluated.
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::Hit { .. } | SessionEvent::Miss { .. })));
    }

    #[test]
    fn stale_deferred_evaluation_cannot_touch_the_next_trial() {
        // Delay but no jitter/reversal, so clicks land where aimed.
        let profile = ImpairmentProfile::custom(ImpairmentLevel::Moderate, 100, 0.0, 0.0, 0.0)
            .unwrap();
        let (mut controller, clock) = controller(profile, 2);
        run_countdown(&mut controller, &clock);

        clock.advance(250);
        controller.tick();
        let first_center = controller.rendered_target_center().unwrap();
        // Two inputs against trial 1: both get deferred.
        controller.submit_input(first_center);
        controller.submit_input(first_center);
        assert_eq!(controller.pending_evaluations(), 2);

        // Both deadlines pass in one tick: the first records trial 1 and
        // advances; the second is stale and must not hit trial 2.
        clock.advance(200);
        let events = controller.tick();
        let hits = events
            .iter()
            .filter(|e| matches!(e, SessionEvent::Hit { .. }))
            .count();
        assert_eq!(hits, 1);
        assert_eq!(controller.recorded(), 1);
        assert_eq!(controller.trial_index(), Some(2));
        controller.tick();
        assert_eq!(controller.state(), SessionState::AwaitingInput);
    }

    #[test]
    fn end_cancels_pending_and_freezes_dataset() {
        let profile = ImpairmentProfile::custom(ImpairmentLevel::Severe, 200, 0.0, 0.0, 0.0)
            .unwrap();
        let (mut controller, clock) = controller(profile, 3);
        run_countdown(&mut controller, &clock);

        clock.advance(300);
        controller.tick();
        let center = controller.rendered_target_center().unwrap();
        controller.submit_input(center);
        assert_eq!(controller.pending_evaluations(), 1);

        let events = controller.end();
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::SessionComplete { recorded: 0 })));
        assert_eq!(controller.pending_evaluations(), 0);

        // The scheduled deadline passing afterwards must not mutate anything.
        clock.advance(1_000);
        assert!(controller.tick().is_empty());
        let dataset = controller.into_dataset().unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn into_dataset_requires_completion() {
        let (mut controller, _clock) = controller(ImpairmentLevel::Normal.profile(), 3);
        controller.start().unwrap();
        let err = controller.into_dataset().unwrap_err();
        assert_eq!(err, SessionError::NotComplete);
    }

    #[test]
    fn severe_profile_sways_the_rendered_center() {
        let (mut controller, clock) = controller(ImpairmentLevel::Severe.profile(), 1);
        run_countdown(&mut controller, &clock);
        let generated = controller.current_target().unwrap().center;

        let mut moved = false;
        for _ in 0..20 {
            clock.advance(50);
            let events = controller.tick();
            if events
                .iter()
                .any(|e| matches!(e, SessionEvent::TargetSwayed { .. }))
            {
                moved = true;
            }
        }
        assert!(moved);
        let rendered = controller.rendered_target_center().unwrap();
        assert!(rendered.distance_to(generated) <= 8.0 * std::f64::consts::SQRT_2 + 1e-9);
    }
}
