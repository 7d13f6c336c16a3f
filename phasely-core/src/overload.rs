//! Overload Detector: scans the coming weeks for phase windows that are
//! overbooked, hold mismatched work, or sit idle at peak energy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{upcoming_phase_periods, PhasePeriod};
use crate::capacity::capacity;
use crate::cycle::Cycle;
use crate::phase::Phase;
use crate::preferences::UserPreferences;
use crate::task::{EnergyLevel, Task};

pub const OVERLOAD_LOOKAHEAD_DAYS: u32 = 30;
/// More than this many tasks in a menstrual window is an overload.
pub const MENSTRUAL_OVERLOAD_THRESHOLD: usize = 3;
/// Minimum free ovulation slots before the window counts as underused.
pub const UNDERUTILIZED_MIN_FREE: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    Overload,
    EnergyMismatch,
    Underutilized,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::Overload => "overload",
            WarningKind::EnergyMismatch => "energy_mismatch",
            WarningKind::Underutilized => "underutilized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One finding for a phase window.
///
/// `id` is stable across runs for the same window or task so a caller can
/// remember dismissals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub id: String,
    pub kind: WarningKind,
    pub severity: Severity,
    pub phase: Phase,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub task_ids: Vec<String>,
    pub message: String,
    pub recommendation: String,
}

fn tasks_in<'a>(tasks: &'a [Task], period: &PhasePeriod) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.is_active())
        .filter(|t| t.scheduled_date.is_some_and(|d| period.contains(d)))
        .collect()
}

fn overload_warning(period: &PhasePeriod, in_period: &[&Task]) -> Option<Warning> {
    if period.phase != Phase::Menstrual || in_period.len() <= MENSTRUAL_OVERLOAD_THRESHOLD {
        return None;
    }
    let any_high = in_period
        .iter()
        .any(|t| t.energy_level == Some(EnergyLevel::High));
    Some(Warning {
        id: format!("{}-{}", WarningKind::Overload.as_str(), period.start),
        kind: WarningKind::Overload,
        severity: if any_high { Severity::High } else { Severity::Medium },
        phase: period.phase,
        period_start: period.start,
        period_end: period.end,
        task_ids: in_period.iter().map(|t| t.id.clone()).collect(),
        message: format!(
            "{} tasks scheduled during your menstrual phase ({} to {})",
            in_period.len(),
            period.start,
            period.end
        ),
        recommendation: "Move non-urgent tasks into your follicular or ovulation phase.".to_string(),
    })
}

fn mismatch_warning(period: &PhasePeriod, task: &Task) -> Option<Warning> {
    let low_energy_phase = matches!(period.phase, Phase::Menstrual | Phase::Luteal);
    if !low_energy_phase || task.energy_level != Some(EnergyLevel::High) {
        return None;
    }
    let recommendation = match task.deadline {
        Some(deadline) => format!(
            "Split it into smaller steps, or push the deadline ({deadline}) past this phase if you can."
        ),
        None => "Move it into your next ovulation window.".to_string(),
    };
    Some(Warning {
        id: format!("{}-{}", WarningKind::EnergyMismatch.as_str(), task.id),
        kind: WarningKind::EnergyMismatch,
        severity: Severity::Medium,
        phase: period.phase,
        period_start: period.start,
        period_end: period.end,
        task_ids: vec![task.id.clone()],
        message: format!(
            "\"{}\" needs high energy but falls in your {} phase",
            task.name, period.phase
        ),
        recommendation,
    })
}

fn underutilized_warning(
    period: &PhasePeriod,
    in_period: &[&Task],
    prefs: &UserPreferences,
) -> Option<Warning> {
    if period.phase != Phase::Ovulation {
        return None;
    }
    let free = capacity(Phase::Ovulation, prefs.daily_task_limit) as i64 - in_period.len() as i64;
    if free < UNDERUTILIZED_MIN_FREE as i64 {
        return None;
    }
    Some(Warning {
        id: format!("{}-{}", WarningKind::Underutilized.as_str(), period.start),
        kind: WarningKind::Underutilized,
        severity: Severity::Low,
        phase: period.phase,
        period_start: period.start,
        period_end: period.end,
        task_ids: in_period.iter().map(|t| t.id.clone()).collect(),
        message: format!(
            "Your ovulation phase ({} to {}) has room for {free} more tasks",
            period.start, period.end
        ),
        recommendation: "Pull demanding tasks forward to use your peak energy.".to_string(),
    })
}

/// Warnings for the next [`OVERLOAD_LOOKAHEAD_DAYS`] days, in period order.
pub fn detect_overload_situations(
    tasks: &[Task],
    cycles: &[Cycle],
    prefs: &UserPreferences,
    today: NaiveDate,
) -> Vec<Warning> {
    let mut warnings = Vec::new();

    for period in upcoming_phase_periods(cycles, today, OVERLOAD_LOOKAHEAD_DAYS) {
        let in_period = tasks_in(tasks, &period);

        warnings.extend(overload_warning(&period, &in_period));
        warnings.extend(in_period.iter().filter_map(|t| mismatch_warning(&period, t)));
        warnings.extend(underutilized_warning(&period, &in_period, prefs));
    }

    warnings
}
