use fitts_core::{Point, TargetSpec};
use rand::Rng;

/// Bounded random-walk offset applied to the rendered target center
/// while a target is live. Evaluation always reads the latest offset.
#[derive(Debug, Clone, PartialEq)]
pub struct SwayState {
    magnitude_px: f64,
    offset_x: f64,
    offset_y: f64,
    last_roll_ms: u64,
}

impl SwayState {
    pub fn new(magnitude_px: f64) -> Self {
        Self {
            magnitude_px,
            offset_x: 0.0,
            offset_y: 0.0,
            last_roll_ms: 0,
        }
    }

    /// Recenters the walk when a new target is presented.
    pub fn reset(&mut self, now_ms: u64) {
        self.offset_x = 0.0;
        self.offset_y = 0.0;
        self.last_roll_ms = now_ms;
    }

    /// Re-rolls the walk if the cadence interval has elapsed. Returns
    /// true when the offset changed. Each step moves at most half the
    /// magnitude per axis; the total offset is clamped to the magnitude.
    pub fn advance<R: Rng>(&mut self, now_ms: u64, interval_ms: u64, rng: &mut R) -> bool {
        if self.magnitude_px <= 0.0 {
            return false;
        }
        if now_ms.saturating_sub(self.last_roll_ms) < interval_ms {
            return false;
        }
        let step = self.magnitude_px / 2.0;
        self.offset_x =
            (self.offset_x + rng.random_range(-step..=step)).clamp(-self.magnitude_px, self.magnitude_px);
        self.offset_y =
            (self.offset_y + rng.random_range(-step..=step)).clamp(-self.magnitude_px, self.magnitude_px);
        self.last_roll_ms = now_ms;
        true
    }

    pub fn swayed_center(&self, target: &TargetSpec) -> Point {
        target.center.offset(self.offset_x, self.offset_y)
    }
}
