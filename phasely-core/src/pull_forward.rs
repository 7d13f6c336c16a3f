//! Pull-Forward Optimizer: fills idle ovulation windows with demanding work
//! that is currently parked later on the calendar.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::{upcoming_phase_periods, PhasePeriod};
use crate::cycle::Cycle;
use crate::phase::Phase;
use crate::preferences::UserPreferences;
use crate::scoring::{score_date, ScoreResult};
use crate::task::{EnergyLevel, Task};
use crate::time::date_range;

pub const PULL_FORWARD_LOOKAHEAD_DAYS: u32 = 45;
/// Slots per ovulation window, independent of the user's daily limit.
pub const OVULATION_SLOT_CAPACITY: usize = 5;
pub const MIN_AVAILABLE_SLOTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyMatchLabel {
    Perfect,
    Good,
}

impl EnergyMatchLabel {
    fn for_energy(energy: EnergyLevel) -> Option<Self> {
        match energy {
            EnergyLevel::High => Some(EnergyMatchLabel::Perfect),
            EnergyLevel::Medium => Some(EnergyMatchLabel::Good),
            EnergyLevel::Low => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullForwardSuggestion {
    pub task_id: String,
    pub task_name: String,
    pub current_date: NaiveDate,
    pub suggested_date: NaiveDate,
    pub score: f64,
    pub energy_match: EnergyMatchLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PullForwardGroup {
    pub period: PhasePeriod,
    pub available_slots: usize,
    pub suggestions: Vec<PullForwardSuggestion>,
}

/// Candidates for `period`, high energy first, then earliest current date.
fn candidates<'a>(
    tasks: &'a [Task],
    period: &PhasePeriod,
    taken: &HashSet<String>,
) -> Vec<(&'a Task, NaiveDate, EnergyMatchLabel)> {
    let mut found: Vec<(&Task, NaiveDate, EnergyMatchLabel)> = tasks
        .iter()
        .filter(|t| t.is_active() && t.auto_scheduled && t.deadline.is_none())
        .filter(|t| !taken.contains(&t.id))
        .filter_map(|t| {
            let date = t.scheduled_date.filter(|d| *d > period.end)?;
            let label = EnergyMatchLabel::for_energy(t.energy_level?)?;
            Some((t, date, label))
        })
        .collect();

    found.sort_by(|a, b| {
        let rank = |t: &Task| u8::from(t.energy_level != Some(EnergyLevel::High));
        rank(a.0).cmp(&rank(b.0)).then(a.1.cmp(&b.1))
    });
    found
}

/// Best date for `task` inside the window; ties keep the earliest date.
fn best_in_window(
    window: &[NaiveDate],
    task: &Task,
    working: &[Task],
    cycles: &[Cycle],
    prefs: &UserPreferences,
) -> Option<ScoreResult> {
    window
        .iter()
        .map(|d| score_date(*d, task, working, cycles, prefs))
        .fold(None, |best: Option<ScoreResult>, s| match best {
            Some(b) if b.total_score >= s.total_score => Some(b),
            _ => Some(s),
        })
}

/// Pull-forward proposals for each ovulation window in the next
/// [`PULL_FORWARD_LOOKAHEAD_DAYS`] days. Windows without proposals are omitted.
///
/// A task is proposed at most once, for the earliest window that can take it.
pub fn suggest_pull_forward(
    tasks: &[Task],
    cycles: &[Cycle],
    prefs: &UserPreferences,
    today: NaiveDate,
) -> Vec<PullForwardGroup> {
    let mut working: Vec<Task> = tasks.to_vec();
    let mut taken: HashSet<String> = HashSet::new();
    let mut groups = Vec::new();

    let ovulation = upcoming_phase_periods(cycles, today, PULL_FORWARD_LOOKAHEAD_DAYS)
        .into_iter()
        .filter(|p| p.phase == Phase::Ovulation);

    for period in ovulation {
        let booked = tasks
            .iter()
            .filter(|t| t.is_active() && t.scheduled_date.is_some_and(|d| period.contains(d)))
            .count();
        let available = OVULATION_SLOT_CAPACITY.saturating_sub(booked);
        if available < MIN_AVAILABLE_SLOTS {
            continue;
        }

        let window = date_range(period.start.max(today), period.end);
        let mut suggestions = Vec::new();

        for (task, current_date, energy_match) in candidates(tasks, &period, &taken)
            .into_iter()
            .take(available)
        {
            let Some(best) = best_in_window(&window, task, &working, cycles, prefs) else {
                continue;
            };
            if let Some(t) = working.iter_mut().find(|t| t.id == task.id) {
                t.scheduled_date = Some(best.date);
            }
            taken.insert(task.id.clone());
            suggestions.push(PullForwardSuggestion {
                task_id: task.id.clone(),
                task_name: task.name.clone(),
                current_date,
                suggested_date: best.date,
                score: best.total_score,
                energy_match,
            });
        }

        if !suggestions.is_empty() {
            groups.push(PullForwardGroup {
                period,
                available_slots: available,
                suggestions,
            });
        }
    }

    groups
}
