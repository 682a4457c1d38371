use fitts_core::{Point, TargetSpec, TrialObservation};

/// Observable transitions emitted by `tick` and `submit_input`, so a
/// rendering shell can redraw without reaching into controller state.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Countdown display changed; 0 is the final tick before trial 1.
    CountdownTick(u64),
    TargetPresented {
        trial_index: usize,
        target: TargetSpec,
    },
    /// The live target's rendered center drifted.
    TargetSwayed {
        trial_index: usize,
        center: Point,
    },
    /// Input accepted but evaluation postponed by the impairment delay.
    InputDeferred {
        trial_index: usize,
        fire_at_ms: u64,
    },
    Miss {
        trial_index: usize,
    },
    Hit {
        observation: TrialObservation,
    },
    SessionComplete {
        recorded: usize,
    },
}
