//! Pointer-input perturbation. Pure given the rng: the same raw event,
//! profile and rng state always yield the same output, which is what
//! makes the impairment model testable with a seeded generator.

use fitts_core::{ImpairmentProfile, Point, Surface};
use rand::Rng;

/// Outcome of pushing one raw pointer event through the impairment model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformedInput {
    pub position: Point,
    /// Scheduling delay before the position may be evaluated; 0 means
    /// evaluate immediately.
    pub delay_ms: u64,
}

/// Applies jitter, directional reversal and reaction delay in that order.
pub fn transform_input<R: Rng>(
    raw: Point,
    profile: &ImpairmentProfile,
    surface: Surface,
    rng: &mut R,
) -> TransformedInput {
    let mut position = raw;

    if profile.jitter_px > 0.0 {
        let dx = rng.random_range(-profile.jitter_px..=profile.jitter_px);
        let dy = rng.random_range(-profile.jitter_px..=profile.jitter_px);
        position = position.offset(dx, dy);
    }

    if profile.reverse_chance > 0.0 && rng.random_bool(profile.reverse_chance) {
        position = surface.mirror(position);
    }

    // Reaction lag is itself noisy: uniform around the configured base
    // rather than a fixed constant.
    let delay_ms = if profile.delay_ms > 0 {
        rng.random_range(profile.delay_ms / 2..=profile.delay_ms * 3 / 2)
    } else {
        0
    };

    TransformedInput { position, delay_ms }
}
