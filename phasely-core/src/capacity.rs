//! Daily task capacity per phase.

use crate::phase::Phase;

pub const DEFAULT_DAILY_TASK_LIMIT: u32 = 4;

/// Fixed per-phase scale applied to the user's base daily limit.
pub fn phase_multiplier(phase: Phase) -> f64 {
    match phase {
        Phase::Menstrual => 0.50,
        Phase::Follicular => 0.75,
        Phase::Ovulation => 1.25,
        Phase::Luteal => 0.75,
    }
}

/// Maximum tasks for a day in `phase`: `max(1, round(base * multiplier))`.
pub fn capacity(phase: Phase, daily_task_limit: u32) -> u32 {
    let scaled = (daily_task_limit as f64 * phase_multiplier(phase)).round() as u32;
    scaled.max(1)
}
