//! Logged cycles and the history-derived parameters used for prediction.

use anyhow::{bail, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::phase::{PhaseWindows, DEFAULT_CYCLE_LENGTH, DEFAULT_MENSTRUAL_DAYS};
use crate::time::{add_days, days_between};

/// Gaps outside this range are ignored when averaging cycle length.
pub const MIN_VALID_CYCLE_GAP: u32 = 21;
pub const MAX_VALID_CYCLE_GAP: u32 = 45;

/// One logged period, anchored at its start date (day 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,

    /// Inclusive start..end day count. `None` when no end was logged.
    #[serde(default)]
    pub menstrual_duration: Option<u32>,

    /// Gap to the next logged start. `None` for the newest cycle.
    #[serde(default)]
    pub cycle_length: Option<u32>,

    pub phases: PhaseWindows,
}

impl Cycle {
    /// A standalone cycle; phases use the default 28-day length until history is known.
    pub fn new(id: impl Into<String>, start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        let menstrual_duration =
            end_date.map(|end| (days_between(start_date, end) + 1).max(1) as u32);
        Self {
            id: id.into(),
            start_date,
            end_date,
            menstrual_duration,
            cycle_length: None,
            phases: PhaseWindows::compute(
                start_date,
                menstrual_duration.unwrap_or(DEFAULT_MENSTRUAL_DAYS),
                DEFAULT_CYCLE_LENGTH,
            ),
        }
    }

    pub fn with_menstrual_days(mut self, days: u32) -> Self {
        self.menstrual_duration = Some(days);
        self.refresh_phases(DEFAULT_CYCLE_LENGTH);
        self
    }

    pub fn with_cycle_length(mut self, length: u32) -> Self {
        self.cycle_length = Some(length);
        self.refresh_phases(DEFAULT_CYCLE_LENGTH);
        self
    }

    pub fn menstrual_days(&self) -> u32 {
        self.menstrual_duration.unwrap_or(DEFAULT_MENSTRUAL_DAYS)
    }

    /// Last day of the logged (or defaulted) period.
    pub fn period_end(&self) -> NaiveDate {
        self.end_date
            .unwrap_or_else(|| add_days(self.start_date, self.menstrual_days() as i64 - 1))
    }

    /// Recompute `phases`, using `fallback_length` when this cycle has no known length.
    pub fn refresh_phases(&mut self, fallback_length: u32) {
        let length = self.cycle_length.unwrap_or(fallback_length);
        self.phases = PhaseWindows::compute(self.start_date, self.menstrual_days(), length);
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must be non-empty".to_string());
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(format!(
                    "end_date {end} is before start_date {}",
                    self.start_date
                ));
            }
        }
        if self.menstrual_duration == Some(0) {
            return Err("menstrual_duration must be at least 1".to_string());
        }
        if self.cycle_length == Some(0) {
            return Err("cycle_length must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Gaps in days between consecutive start dates, oldest first.
fn start_gaps(cycles: &[Cycle]) -> Vec<u32> {
    let mut starts: Vec<NaiveDate> = cycles.iter().map(|c| c.start_date).collect();
    starts.sort();
    starts
        .windows(2)
        .map(|w| days_between(w[0], w[1]).max(0) as u32)
        .collect()
}

fn rounded_mean(values: &[u32]) -> Option<u32> {
    if values.is_empty() {
        return None;
    }
    let sum: u64 = values.iter().map(|v| *v as u64).sum();
    Some((sum as f64 / values.len() as f64).round() as u32)
}

/// Mean of the 21..=45 day gaps between logged starts, rounded; 28 without usable history.
pub fn average_cycle_length(cycles: &[Cycle]) -> u32 {
    let valid: Vec<u32> = start_gaps(cycles)
        .into_iter()
        .filter(|g| (MIN_VALID_CYCLE_GAP..=MAX_VALID_CYCLE_GAP).contains(g))
        .collect();
    rounded_mean(&valid).unwrap_or(DEFAULT_CYCLE_LENGTH)
}

/// Mean logged menstrual duration, rounded; cycles without one are ignored. 5 by default.
pub fn average_menstrual_days(cycles: &[Cycle]) -> u32 {
    let known: Vec<u32> = cycles.iter().filter_map(|c| c.menstrual_duration).collect();
    rounded_mean(&known).unwrap_or(DEFAULT_MENSTRUAL_DAYS)
}

/// Set each cycle's length to the gap to the next chronological start and
/// recompute every phase window. Leaves `cycles` sorted oldest first.
pub fn recompute_cycle_lengths(cycles: &mut [Cycle]) {
    cycles.sort_by_key(|c| c.start_date);

    let n = cycles.len();
    for i in 0..n {
        cycles[i].cycle_length = if i + 1 < n {
            Some(days_between(cycles[i].start_date, cycles[i + 1].start_date).max(1) as u32)
        } else {
            None
        };
    }

    let fallback = average_cycle_length(cycles);
    for c in cycles.iter_mut() {
        c.refresh_phases(fallback);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedPeriod {
    /// Full updated history, oldest first.
    pub cycles: Vec<Cycle>,
    /// Ids of existing cycles dropped because their period overlapped the new one.
    pub replaced: Vec<String>,
}

/// Record a new period.
///
/// Any existing cycle whose period date range overlaps the new one is dropped
/// first: the newest user entry always wins over stale records.
pub fn log_period(
    cycles: Vec<Cycle>,
    id: impl Into<String>,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<LoggedPeriod> {
    if let Some(end) = end {
        if end < start {
            bail!("period end {end} is before its start {start}");
        }
    }

    let new_cycle = Cycle::new(id, start, end);
    let new_end = new_cycle.period_end();

    let (replaced, mut kept): (Vec<Cycle>, Vec<Cycle>) = cycles
        .into_iter()
        .partition(|c| c.start_date <= new_end && start <= c.period_end());

    kept.push(new_cycle);
    recompute_cycle_lengths(&mut kept);

    Ok(LoggedPeriod {
        cycles: kept,
        replaced: replaced.into_iter().map(|c| c.id).collect(),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    pub cycle_count: usize,
    pub average_cycle_length: u32,
    pub average_menstrual_days: u32,
    pub shortest_gap: Option<u32>,
    pub longest_gap: Option<u32>,
    pub latest_start: Option<NaiveDate>,
}

pub fn cycle_stats(cycles: &[Cycle]) -> CycleStats {
    let gaps = start_gaps(cycles);
    CycleStats {
        cycle_count: cycles.len(),
        average_cycle_length: average_cycle_length(cycles),
        average_menstrual_days: average_menstrual_days(cycles),
        shortest_gap: gaps.iter().copied().min(),
        longest_gap: gaps.iter().copied().max(),
        latest_start: cycles.iter().map(|c| c.start_date).max(),
    }
}

/// Expected start of the next period: latest start plus the averaged cycle length.
pub fn predict_next_period(cycles: &[Cycle]) -> Option<NaiveDate> {
    let latest = cycles.iter().map(|c| c.start_date).max()?;
    Some(add_days(latest, average_cycle_length(cycles) as i64))
}
