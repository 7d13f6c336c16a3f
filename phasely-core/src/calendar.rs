//! Phase Calendar: maps any date to a cycle phase.
//!
//! Resolution order for a date D:
//! 1. logged cycles, newest start first. Logged history is authoritative for
//!    every date it covers and is never overridden by a prediction.
//! 2. D after the newest start: project forward in averaged-length steps.
//! 3. D before the oldest start: project backward in averaged-length steps.
//!
//! Anything still unresolved has no phase; callers default to luteal.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::cycle::{average_cycle_length, average_menstrual_days, Cycle};
use crate::phase::{Phase, PhaseWindows};
use crate::time::{add_days, days_between};

/// Phase used when no cycle data resolves a date.
pub const DEFAULT_PHASE: Phase = Phase::Luteal;

/// Phase of `date` within a single cycle's precomputed windows.
pub fn phase_for_date(date: NaiveDate, cycle: &Cycle) -> Option<Phase> {
    cycle.phases.phase_of(date)
}

/// Windows of the logged or projected cycle whose phases contain `date`.
fn resolve_windows(date: NaiveDate, cycles: &[Cycle]) -> Option<PhaseWindows> {
    let mut newest_first: Vec<&Cycle> = cycles.iter().collect();
    newest_first.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    if let Some(c) = newest_first
        .iter()
        .find(|c| phase_for_date(date, c).is_some())
    {
        return Some(c.phases);
    }

    let latest = newest_first.first()?.start_date;
    let earliest = newest_first.last()?.start_date;

    let avg_len = average_cycle_length(cycles).max(1) as i64;
    let avg_menstrual = average_menstrual_days(cycles);

    let projected_start = if date > latest {
        let cycle_number = days_between(latest, date) / avg_len;
        add_days(latest, cycle_number * avg_len)
    } else if date < earliest {
        let days_back = days_between(date, earliest);
        let cycles_back = (days_back + avg_len - 1) / avg_len;
        add_days(earliest, -cycles_back * avg_len)
    } else {
        return None;
    };

    let windows = PhaseWindows::compute(projected_start, avg_menstrual, avg_len as u32);
    windows.phase_of(date).map(|_| windows)
}

/// Phase of `date` using logged history, forward prediction, or backward projection.
pub fn phase_for_date_advanced(date: NaiveDate, cycles: &[Cycle]) -> Option<Phase> {
    resolve_windows(date, cycles).and_then(|w| w.phase_of(date))
}

/// Like [`phase_for_date_advanced`] but never empty.
pub fn phase_or_default(date: NaiveDate, cycles: &[Cycle]) -> Phase {
    phase_for_date_advanced(date, cycles).unwrap_or(DEFAULT_PHASE)
}

/// 1-based day of the logged or projected cycle containing `date`.
pub fn cycle_day_for_date(date: NaiveDate, cycles: &[Cycle]) -> Option<u32> {
    resolve_windows(date, cycles).map(|w| days_between(w.cycle_start(), date) as u32 + 1)
}

/// A maximal run of consecutive days sharing one phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhasePeriod {
    pub phase: Phase,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl PhasePeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn len_days(&self) -> u32 {
        days_between(self.start, self.end) as u32 + 1
    }
}

/// Segment `today .. today + days - 1` into same-phase runs.
pub fn upcoming_phase_periods(cycles: &[Cycle], today: NaiveDate, days: u32) -> Vec<PhasePeriod> {
    let mut periods: Vec<PhasePeriod> = Vec::new();

    for offset in 0..days as i64 {
        let date = add_days(today, offset);
        let phase = phase_or_default(date, cycles);
        match periods.last_mut() {
            Some(last) if last.phase == phase => last.end = date,
            _ => periods.push(PhasePeriod {
                phase,
                start: date,
                end: date,
            }),
        }
    }

    periods
}
