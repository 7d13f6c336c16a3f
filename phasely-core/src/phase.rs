//! Cycle phases and the four contiguous phase windows of a single cycle.
//!
//! Day numbering is 1-based from the cycle start S:
//! - menstrual:  days 1..=M
//! - follicular: days M+1..=13
//! - ovulation:  days 14..=15 (always two days)
//! - luteal:     days 16..=L
//!
//! M is clamped to `1..=MAX_MENSTRUAL_DAYS`, so the follicular window can shrink
//! to empty but never inverts or overlaps ovulation. A cycle shorter than 16 days
//! has an empty luteal window. Empty windows are stored as `end = start - 1`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time::add_days;

/// Longest menstrual duration the window model accepts.
pub const MAX_MENSTRUAL_DAYS: u32 = 13;
/// Last day (1-based) of the follicular window.
pub const FOLLICULAR_LAST_DAY: u32 = 13;
/// First day (1-based) of the two-day ovulation window.
pub const OVULATION_FIRST_DAY: u32 = 14;
pub const OVULATION_DAYS: u32 = 2;

pub const DEFAULT_MENSTRUAL_DAYS: u32 = 5;
pub const DEFAULT_CYCLE_LENGTH: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulation,
    Luteal,
}

impl Phase {
    /// Fixed matching order within a cycle.
    pub const ALL: [Phase; 4] = [
        Phase::Menstrual,
        Phase::Follicular,
        Phase::Ovulation,
        Phase::Luteal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Menstrual => "menstrual",
            Phase::Follicular => "follicular",
            Phase::Ovulation => "ovulation",
            Phase::Luteal => "luteal",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PhaseWindow {
    /// Build a window, collapsing `end < start` to the canonical empty form.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self {
                start,
                end: add_days(start, -1),
            }
        } else {
            Self { start, end }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        !self.is_empty() && self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() as u32 + 1
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseWindows {
    pub menstrual: PhaseWindow,
    pub follicular: PhaseWindow,
    pub ovulation: PhaseWindow,
    pub luteal: PhaseWindow,
}

impl PhaseWindows {
    pub fn compute(start: NaiveDate, menstrual_days: u32, cycle_length: u32) -> Self {
        let m = menstrual_days.clamp(1, MAX_MENSTRUAL_DAYS) as i64;
        let l = cycle_length as i64;
        let ovulation_first = OVULATION_FIRST_DAY as i64 - 1;
        let ovulation_last = ovulation_first + OVULATION_DAYS as i64 - 1;

        Self {
            menstrual: PhaseWindow::new(start, add_days(start, m - 1)),
            follicular: PhaseWindow::new(
                add_days(start, m),
                add_days(start, FOLLICULAR_LAST_DAY as i64 - 1),
            ),
            ovulation: PhaseWindow::new(
                add_days(start, ovulation_first),
                add_days(start, ovulation_last),
            ),
            luteal: PhaseWindow::new(add_days(start, ovulation_last + 1), add_days(start, l - 1)),
        }
    }

    pub fn window(&self, phase: Phase) -> &PhaseWindow {
        match phase {
            Phase::Menstrual => &self.menstrual,
            Phase::Follicular => &self.follicular,
            Phase::Ovulation => &self.ovulation,
            Phase::Luteal => &self.luteal,
        }
    }

    /// First window containing `date`, in the fixed menstrual..luteal order.
    pub fn phase_of(&self, date: NaiveDate) -> Option<Phase> {
        Phase::ALL
            .into_iter()
            .find(|p| self.window(*p).contains(date))
    }

    /// Day 1 of the cycle these windows were computed from.
    pub fn cycle_start(&self) -> NaiveDate {
        self.menstrual.start
    }

    /// Last covered day (the luteal end, or the ovulation end when luteal is empty).
    pub fn last_day(&self) -> NaiveDate {
        if self.luteal.is_empty() {
            self.ovulation.end
        } else {
            self.luteal.end
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_default_windows() {
        let w = PhaseWindows::compute(d("2026-01-05"), 5, 28);
        assert_eq!(w.menstrual, PhaseWindow::new(d("2026-01-05"), d("2026-01-09")));
        assert_eq!(w.follicular, PhaseWindow::new(d("2026-01-10"), d("2026-01-17")));
        assert_eq!(w.ovulation, PhaseWindow::new(d("2026-01-18"), d("2026-01-19")));
        assert_eq!(w.luteal, PhaseWindow::new(d("2026-01-20"), d("2026-02-01")));
        assert_eq!(w.ovulation.len_days(), 2);
    }

    #[test]
    fn test_ovulation_ignores_menstrual_and_cycle_length() {
        let a = PhaseWindows::compute(d("2026-01-05"), 3, 24);
        let b = PhaseWindows::compute(d("2026-01-05"), 8, 40);
        assert_eq!(a.ovulation, b.ovulation);
    }

    #[test]
    fn test_long_menstruation_empties_follicular_without_inverting() {
        let w = PhaseWindows::compute(d("2026-01-01"), 20, 28);
        assert_eq!(w.menstrual.len_days(), MAX_MENSTRUAL_DAYS);
        assert!(w.follicular.is_empty());
        assert_eq!(w.follicular.len_days(), 0);
        assert!(!w.follicular.contains(d("2026-01-13")));
        assert_eq!(w.phase_of(d("2026-01-14")), Some(Phase::Ovulation));
    }

    #[test]
    fn test_short_cycle_has_empty_luteal() {
        let w = PhaseWindows::compute(d("2026-01-01"), 5, 15);
        assert!(w.luteal.is_empty());
        assert_eq!(w.last_day(), d("2026-01-15"));
        assert_eq!(w.phase_of(d("2026-01-16")), None);
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Phase::Ovulation).unwrap(), "\"ovulation\"");
    }
}
