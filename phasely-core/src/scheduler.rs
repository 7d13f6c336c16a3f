//! Scheduler: picks the best calendar date for a task.
//!
//! Hard constraints, in order: not in the past, strictly before the deadline,
//! remaining phase capacity on the day. Survivors are ranked by soft score with
//! a stable sort, so ties go to the earliest date.
//!
//! When nothing survives, the constraints are relaxed along [`RELAXATION_CASCADE`]
//! (capacity goes first, the deadline never does). If even that leaves no date,
//! tomorrow is returned unconditionally.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::phase_or_default;
use crate::capacity::capacity;
use crate::cycle::Cycle;
use crate::preferences::UserPreferences;
use crate::scoring::{score_date, ScoreResult};
use crate::task::{open_task_count, Task};
use crate::time::{add_days, date_range};

/// Search horizon for tasks without a deadline.
pub const NO_DEADLINE_HORIZON_DAYS: i64 = 60;
/// Alternatives returned next to the chosen date.
pub const MAX_ALTERNATIVES: usize = 3;

/// Constraint set a placement was found under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relaxation {
    /// Past, deadline and capacity all enforced.
    Strict,
    /// Capacity dropped; past and deadline still enforced.
    IgnoreCapacity,
    /// Nothing enforced: tomorrow, whatever it holds.
    LastResort,
    /// Task already completed; it keeps its date (or today when it never had one).
    Kept,
}

/// Tiers tried in order before falling back to [`Relaxation::LastResort`].
pub const RELAXATION_CASCADE: [Relaxation; 2] = [Relaxation::Strict, Relaxation::IgnoreCapacity];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub date: NaiveDate,
    pub score: ScoreResult,
    pub relaxation: Relaxation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOutcome {
    pub date: NaiveDate,
    pub score: ScoreResult,
    /// False when every candidate was already full and the best overall was taken.
    pub within_capacity: bool,
    /// Other within-capacity dates, best first.
    pub alternatives: Vec<ScoreResult>,
}

/// Inputs shared by every step of one scheduling decision.
#[derive(Debug, Clone, Copy)]
struct Request<'a> {
    task: &'a Task,
    existing: &'a [Task],
    cycles: &'a [Cycle],
    prefs: &'a UserPreferences,
    today: NaiveDate,
}

impl Request<'_> {
    /// today..deadline when a deadline is set, else today..today+60.
    fn window(&self) -> Vec<NaiveDate> {
        let end = self
            .task
            .deadline
            .unwrap_or_else(|| add_days(self.today, NO_DEADLINE_HORIZON_DAYS));
        date_range(self.today, end)
    }

    fn has_capacity(&self, date: NaiveDate) -> bool {
        let booked = open_task_count(self.existing, date, Some(self.task.id.as_str()));
        let limit = capacity(phase_or_default(date, self.cycles), self.prefs.daily_task_limit);
        (booked as u32) < limit
    }

    fn admits(&self, date: NaiveDate, relaxation: Relaxation) -> bool {
        let not_past = date >= self.today;
        let before_deadline = self.task.deadline.is_none_or(|dl| date < dl);
        match relaxation {
            Relaxation::Strict => not_past && before_deadline && self.has_capacity(date),
            Relaxation::IgnoreCapacity => not_past && before_deadline,
            Relaxation::LastResort => true,
            Relaxation::Kept => Some(date) == self.task.scheduled_date,
        }
    }

    fn candidates(&self, relaxation: Relaxation) -> Vec<NaiveDate> {
        self.window()
            .into_iter()
            .filter(|d| self.admits(*d, relaxation))
            .collect()
    }

    fn score(&self, date: NaiveDate) -> ScoreResult {
        score_date(date, self.task, self.existing, self.cycles, self.prefs)
    }

    /// Scores for `dates`, best first; equal scores keep chronological order.
    fn rank(&self, dates: &[NaiveDate]) -> Vec<ScoreResult> {
        let mut scored: Vec<ScoreResult> = dates.iter().map(|d| self.score(*d)).collect();
        scored.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        scored
    }

    fn tomorrow(&self) -> NaiveDate {
        add_days(self.today, 1)
    }

    /// Completed tasks are never candidates for a new date.
    fn kept(&self) -> Option<Placement> {
        if !self.task.completed {
            return None;
        }
        let date = self.task.scheduled_date.unwrap_or(self.today);
        Some(Placement {
            date,
            score: self.score(date),
            relaxation: Relaxation::Kept,
        })
    }
}

/// Best placement for `task`, with the tier it was found under.
///
/// A completed task is not moved: it comes back with [`Relaxation::Kept`].
pub fn place_task(
    task: &Task,
    existing: &[Task],
    cycles: &[Cycle],
    prefs: &UserPreferences,
    today: NaiveDate,
) -> Placement {
    let req = Request {
        task,
        existing,
        cycles,
        prefs,
        today,
    };

    if let Some(kept) = req.kept() {
        return kept;
    }

    for relaxation in RELAXATION_CASCADE {
        let candidates = req.candidates(relaxation);
        if let Some(best) = req.rank(&candidates).into_iter().next() {
            debug!(
                target: "phasely::scheduler",
                task_id = %task.id,
                date = %best.date,
                score = best.total_score,
                ?relaxation,
                candidates = candidates.len(),
                "placed task"
            );
            return Placement {
                date: best.date,
                score: best,
                relaxation,
            };
        }
        debug!(target: "phasely::scheduler", task_id = %task.id, ?relaxation, "no candidates");
    }

    let date = req.tomorrow();
    debug!(target: "phasely::scheduler", task_id = %task.id, %date, "falling back to tomorrow");
    Placement {
        date,
        score: req.score(date),
        relaxation: Relaxation::LastResort,
    }
}

/// Best date for `task`. Always returns a date.
pub fn schedule_task(
    task: &Task,
    existing: &[Task],
    cycles: &[Cycle],
    prefs: &UserPreferences,
    today: NaiveDate,
) -> NaiveDate {
    place_task(task, existing, cycles, prefs, today).date
}

/// Like [`schedule_task`], but also reports whether the pick fits within capacity
/// and up to three ranked within-capacity alternatives.
///
/// Lets a caller warn before committing a task to an already full day.
pub fn schedule_task_with_alternatives(
    task: &Task,
    existing: &[Task],
    cycles: &[Cycle],
    prefs: &UserPreferences,
    today: NaiveDate,
) -> ScheduleOutcome {
    let req = Request {
        task,
        existing,
        cycles,
        prefs,
        today,
    };

    if let Some(kept) = req.kept() {
        return ScheduleOutcome {
            date: kept.date,
            score: kept.score,
            within_capacity: req.has_capacity(kept.date),
            alternatives: Vec::new(),
        };
    }

    let ranked = req.rank(&req.candidates(Relaxation::IgnoreCapacity));
    let (fits, full): (Vec<ScoreResult>, Vec<ScoreResult>) =
        ranked.into_iter().partition(|s| req.has_capacity(s.date));

    let (score, within_capacity) = match (fits.first(), full.first()) {
        (Some(best), _) => (*best, true),
        (None, Some(best)) => (*best, false),
        (None, None) => {
            let date = req.tomorrow();
            (req.score(date), req.has_capacity(date))
        }
    };

    let alternatives = fits
        .iter()
        .filter(|s| s.date != score.date)
        .take(MAX_ALTERNATIVES)
        .copied()
        .collect();

    ScheduleOutcome {
        date: score.date,
        score,
        within_capacity,
        alternatives,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;
    use crate::task::EnergyLevel;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn fill(date: NaiveDate, n: usize, prefix: &str) -> Vec<Task> {
        (0..n)
            .map(|i| Task::new(format!("{prefix}-{date}-{i}"), "filler").scheduled_on(date))
            .collect()
    }

    #[test]
    fn test_empty_calendar_picks_today_on_a_weekday() {
        let monday = d("2026-03-02");
        let task = Task::new("t", "anything");
        let date = schedule_task(&task, &[], &[], &UserPreferences::default(), monday);
        assert_eq!(date, monday);
    }

    #[test]
    fn test_empty_calendar_on_a_weekend_waits_for_monday() {
        // Weekday bias: Saturday and Sunday score 61, Monday 63.
        let saturday = d("2026-03-07");
        let task = Task::new("t", "anything");
        let date = schedule_task(&task, &[], &[], &UserPreferences::default(), saturday);
        assert_eq!(date, d("2026-03-09"));
    }

    #[test]
    fn test_completed_task_keeps_its_date() {
        let today = d("2026-03-02");
        let done = Task::new("t", "shipped")
            .auto_scheduled_on(d("2026-03-10"))
            .mark_completed(chrono::Utc::now());
        let p = place_task(&done, &[], &[], &UserPreferences::default(), today);
        assert_eq!(p.relaxation, Relaxation::Kept);
        assert_eq!(p.date, d("2026-03-10"));

        let out = schedule_task_with_alternatives(&done, &[], &[], &UserPreferences::default(), today);
        assert_eq!(out.date, d("2026-03-10"));
        assert!(out.alternatives.is_empty());

        let never_placed = Task::new("u", "done").mark_completed(chrono::Utc::now());
        assert_eq!(
            schedule_task(&never_placed, &[], &[], &UserPreferences::default(), today),
            today
        );
    }

    #[test]
    fn test_never_on_or_after_deadline() {
        let today = d("2026-03-02");
        let task = Task::new("t", "report").with_deadline(d("2026-03-05"));
        let p = place_task(&task, &[], &[], &UserPreferences::default(), today);
        assert!(p.date >= today && p.date < d("2026-03-05"));
        assert_eq!(p.relaxation, Relaxation::Strict);
    }

    #[test]
    fn test_full_days_relax_capacity_but_keep_deadline() {
        // No cycles: every day is luteal with capacity 3.
        let today = d("2026-03-02");
        let mut existing = fill(today, 3, "a");
        existing.extend(fill(d("2026-03-03"), 3, "b"));
        let task = Task::new("t", "urgent").with_deadline(d("2026-03-04"));

        let p = place_task(&task, &existing, &[], &UserPreferences::default(), today);
        assert_eq!(p.relaxation, Relaxation::IgnoreCapacity);
        assert!(p.date < d("2026-03-04"));
    }

    #[test]
    fn test_deadline_today_falls_back_to_tomorrow() {
        let today = d("2026-03-02");
        let task = Task::new("t", "late").with_deadline(today);
        let p = place_task(&task, &[], &[], &UserPreferences::default(), today);
        assert_eq!(p.relaxation, Relaxation::LastResort);
        assert_eq!(p.date, d("2026-03-03"));

        let overdue = Task::new("t2", "later").with_deadline(d("2026-02-20"));
        assert_eq!(
            schedule_task(&overdue, &[], &[], &UserPreferences::default(), today),
            d("2026-03-03")
        );
    }

    #[test]
    fn test_completed_tasks_do_not_use_capacity() {
        let monday = d("2026-03-02");
        let done: Vec<Task> = fill(monday, 5, "done")
            .into_iter()
            .map(|t| t.mark_completed(chrono::Utc::now()))
            .collect();
        let task = Task::new("t", "x");
        let p = place_task(&task, &done, &[], &UserPreferences::default(), monday);
        assert_eq!(p.date, monday);
        assert_eq!(p.relaxation, Relaxation::Strict);
    }

    #[test]
    fn test_alternatives_exclude_choice_and_full_days() {
        let monday = d("2026-03-02");
        let existing = fill(d("2026-03-03"), 3, "full");
        let task = Task::new("t", "x").with_deadline(d("2026-03-09"));
        let out = schedule_task_with_alternatives(
            &task,
            &existing,
            &[],
            &UserPreferences::default(),
            monday,
        );
        assert!(out.within_capacity);
        assert_eq!(out.alternatives.len(), MAX_ALTERNATIVES);
        assert!(out.alternatives.iter().all(|a| a.date != out.date));
        assert!(out.alternatives.iter().all(|a| a.date != d("2026-03-03")));
        for w in out.alternatives.windows(2) {
            assert!(w[0].total_score >= w[1].total_score);
        }
        assert!(out.score.total_score >= out.alternatives[0].total_score);
    }

    #[test]
    fn test_alternatives_flag_over_capacity() {
        let today = d("2026-03-02");
        let existing = fill(today, 3, "full");
        let task = Task::new("t", "x").with_deadline(d("2026-03-03"));
        let out =
            schedule_task_with_alternatives(&task, &existing, &[], &UserPreferences::default(), today);
        assert_eq!(out.date, today);
        assert!(!out.within_capacity);
        assert!(out.alternatives.is_empty());
    }

    #[test]
    fn test_high_energy_prefers_ovulation() {
        let cycles = vec![Cycle::new("c", d("2026-01-05"), None)
            .with_menstrual_days(5)
            .with_cycle_length(28)];
        let task = Task::new("t", "pitch")
            .with_energy(EnergyLevel::High)
            .with_deadline(d("2026-02-20"));
        let p = place_task(&task, &[], &cycles, &UserPreferences::default(), d("2026-02-10"));
        assert_eq!(p.score.phase, Phase::Ovulation);
        assert_eq!(p.date, d("2026-02-16"));
    }
}
