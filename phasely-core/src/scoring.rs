//! Candidate Scorer: soft score of placing a task on a date.
//!
//! Four independent 0..=100 sub-scores combined with the user's weights:
//! energy/phase match, deadline urgency, workload balance, day preference.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::calendar::phase_or_default;
use crate::capacity::capacity;
use crate::cycle::Cycle;
use crate::phase::Phase;
use crate::preferences::UserPreferences;
use crate::task::{open_task_count, EnergyLevel, Task};
use crate::time::{days_between, is_weekend};

/// How well a phase suits a task's energy demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyFit {
    Perfect,
    Good,
    Poor,
}

impl EnergyFit {
    pub fn score(&self) -> f64 {
        match self {
            EnergyFit::Perfect => 100.0,
            EnergyFit::Good => 60.0,
            EnergyFit::Poor => 20.0,
        }
    }
}

pub fn energy_fit(energy: EnergyLevel, phase: Phase) -> EnergyFit {
    use EnergyLevel::*;
    use Phase::*;
    match (energy, phase) {
        (High, Ovulation) => EnergyFit::Perfect,
        (High, Follicular) => EnergyFit::Good,
        (High, Menstrual | Luteal) => EnergyFit::Poor,

        (Medium, Follicular | Luteal) => EnergyFit::Perfect,
        (Medium, Ovulation) => EnergyFit::Good,
        (Medium, Menstrual) => EnergyFit::Poor,

        (Low, Luteal | Menstrual) => EnergyFit::Perfect,
        (Low, Follicular) => EnergyFit::Good,
        (Low, Ovulation) => EnergyFit::Poor,
    }
}

/// Unset energy is neutral (50).
pub fn energy_match_score(energy: Option<EnergyLevel>, phase: Phase) -> f64 {
    match energy {
        None => 50.0,
        Some(e) => energy_fit(e, phase).score(),
    }
}

/// Banded by whole days left until the deadline. No deadline is neutral (50).
pub fn deadline_urgency_score(date: NaiveDate, deadline: Option<NaiveDate>) -> f64 {
    let Some(deadline) = deadline else {
        return 50.0;
    };
    match days_between(date, deadline) {
        d if d < 0 => 0.0,
        0 => 30.0,
        1 => 95.0,
        2 => 90.0,
        d if d <= 7 => 80.0,
        d if d <= 14 => 60.0,
        d if d <= 30 => 40.0,
        _ => 20.0,
    }
}

/// Banded by utilization of the day's phase capacity.
pub fn workload_balance_score(tasks_on_date: usize, day_capacity: u32) -> f64 {
    if tasks_on_date == 0 {
        return 100.0;
    }
    let utilization = tasks_on_date as f64 / day_capacity.max(1) as f64;
    match utilization {
        u if u < 0.3 => 90.0,
        u if u < 0.5 => 80.0,
        u if u < 0.7 => 60.0,
        u if u < 0.85 => 40.0,
        u if u < 1.0 => 20.0,
        _ => 0.0,
    }
}

/// Exact weekday membership when the task has preferences, else a mild weekday bias.
pub fn day_preference_score(date: NaiveDate, preferred_days: &[Weekday]) -> f64 {
    if !preferred_days.is_empty() {
        return if preferred_days.contains(&date.weekday()) {
            100.0
        } else {
            0.0
        };
    }
    if is_weekend(date) { 60.0 } else { 80.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub energy_match: f64,
    pub deadline_urgency: f64,
    pub workload_balance: f64,
    pub day_preference: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub date: NaiveDate,
    pub total_score: f64,
    pub breakdown: ScoreBreakdown,
    pub phase: Phase,
}

/// Score placing `task` on `date` given everything already on the calendar.
///
/// `task` itself is never counted against the day's workload, so re-scoring an
/// already placed task compares like with like.
pub fn score_date(
    date: NaiveDate,
    task: &Task,
    all_tasks: &[Task],
    cycles: &[Cycle],
    prefs: &UserPreferences,
) -> ScoreResult {
    let phase = phase_or_default(date, cycles);
    let on_date = open_task_count(all_tasks, date, Some(task.id.as_str()));

    let breakdown = ScoreBreakdown {
        energy_match: energy_match_score(task.energy_level, phase),
        deadline_urgency: deadline_urgency_score(date, task.deadline),
        workload_balance: workload_balance_score(on_date, capacity(phase, prefs.daily_task_limit)),
        day_preference: day_preference_score(date, &task.preferred_days),
    };

    let w = prefs.weights.normalized();
    let total_score = breakdown.energy_match * w.energy
        + breakdown.deadline_urgency * w.deadline
        + breakdown.workload_balance * w.workload
        + breakdown.day_preference * w.day_preference;

    ScoreResult {
        date,
        total_score,
        breakdown,
        phase,
    }
}
