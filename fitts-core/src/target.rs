use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// A circular aiming target, generated fresh for each trial.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub center: Point,
    pub radius_px: f64,
}

impl TargetSpec {
    pub fn new(center: Point, radius_px: f64) -> Self {
        debug_assert!(radius_px > 0.0);
        Self { center, radius_px }
    }

    pub fn diameter_px(&self) -> f64 {
        self.radius_px * 2.0
    }

    /// Hit test against an arbitrary center (the controller passes the
    /// swayed center, which may differ from the generated one).
    pub fn contains(&self, point: Point, center: Point, tolerance_px: f64) -> bool {
        point.distance_to(center) <= self.radius_px + tolerance_px
    }
}
