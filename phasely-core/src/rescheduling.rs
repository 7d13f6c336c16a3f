//! Rescheduling Advisor: revisits engine-placed tasks after cycle data
//! changes and proposes (or applies) moves that clearly improve their score.

use anyhow::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cycle::Cycle;
use crate::preferences::{ReschedulingBehavior, UserPreferences};
use crate::scheduler::place_task;
use crate::scoring::score_date;
use crate::store::{HistoryAction, RecordStore, TaskUpdate};
use crate::task::Task;

/// Minimum total-score gain worth moving a task for.
pub const IMPROVEMENT_THRESHOLD: f64 = 20.0;
/// Sub-score gain that earns a named reason.
pub const REASON_THRESHOLD: f64 = 20.0;
/// Float slack on the threshold, so a gain of exactly 20 is never lost to rounding.
const SCORE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleSuggestion {
    pub task_id: String,
    pub task_name: String,
    pub current_date: NaiveDate,
    pub suggested_date: NaiveDate,
    pub current_score: f64,
    pub suggested_score: f64,
    pub improvement: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleReport {
    pub mode: ReschedulingBehavior,
    /// Pending approval (ask-permission mode).
    pub suggestions: Vec<RescheduleSuggestion>,
    /// Already applied (automatic mode).
    pub rescheduled: Vec<RescheduleSuggestion>,
}

fn is_eligible(task: &Task, today: NaiveDate) -> bool {
    task.auto_scheduled && !task.completed && task.scheduled_date.is_some_and(|d| d > today)
}

/// Plan moves for every auto-scheduled future task.
///
/// Planned moves are folded into a working copy of the task list as they are
/// made, so later tasks see the workload of earlier moves.
pub fn plan_reschedules(
    tasks: &[Task],
    cycles: &[Cycle],
    prefs: &UserPreferences,
    today: NaiveDate,
) -> Vec<RescheduleSuggestion> {
    let mut working: Vec<Task> = tasks.to_vec();
    let mut suggestions = Vec::new();

    for task in tasks.iter().filter(|t| is_eligible(t, today)) {
        let Some(current_date) = task.scheduled_date else {
            continue;
        };

        let current = score_date(current_date, task, &working, cycles, prefs);
        let best = place_task(task, &working, cycles, prefs, today).score;
        if best.date == current_date {
            continue;
        }

        let improvement = best.total_score - current.total_score;
        if improvement + SCORE_EPSILON < IMPROVEMENT_THRESHOLD {
            debug!(
                target: "phasely::advisor",
                task_id = %task.id,
                improvement,
                "gain below threshold"
            );
            continue;
        }

        let mut reasons = Vec::new();
        if best.breakdown.energy_match - current.breakdown.energy_match > REASON_THRESHOLD {
            reasons.push("better energy match");
        }
        if best.breakdown.workload_balance - current.breakdown.workload_balance > REASON_THRESHOLD {
            reasons.push("lighter workload");
        }
        let reason = if reasons.is_empty() {
            "overall better fit".to_string()
        } else {
            reasons.join(" + ")
        };

        if let Some(t) = working.iter_mut().find(|t| t.id == task.id) {
            t.scheduled_date = Some(best.date);
        }

        suggestions.push(RescheduleSuggestion {
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            current_date,
            suggested_date: best.date,
            current_score: current.total_score,
            suggested_score: best.total_score,
            improvement,
            reason,
        });
    }

    suggestions
}

/// Persist every suggestion: new date, still auto-scheduled, plus a history record.
///
/// Stops at the first store error; moves already written stay written.
pub async fn apply_suggestions<S>(
    store: &S,
    suggestions: &[RescheduleSuggestion],
) -> Result<Vec<RescheduleSuggestion>>
where
    S: RecordStore + ?Sized,
{
    for s in suggestions {
        store
            .update_task(&s.task_id, TaskUpdate::reschedule(s.suggested_date))
            .await?;
        store
            .append_history(
                &s.task_id,
                HistoryAction::Rescheduled,
                serde_json::json!({
                    "from": s.current_date,
                    "to": s.suggested_date,
                    "reason": s.reason,
                    "improvement": s.improvement,
                }),
            )
            .await?;
        info!(
            target: "phasely::advisor",
            task_id = %s.task_id,
            from = %s.current_date,
            to = %s.suggested_date,
            reason = %s.reason,
            "rescheduled task"
        );
    }
    Ok(suggestions.to_vec())
}

/// Apply only the suggestions whose task id is in `task_ids`.
pub async fn accept_suggestions<S>(
    store: &S,
    suggestions: &[RescheduleSuggestion],
    task_ids: &[String],
) -> Result<Vec<RescheduleSuggestion>>
where
    S: RecordStore + ?Sized,
{
    let chosen: Vec<RescheduleSuggestion> = suggestions
        .iter()
        .filter(|s| task_ids.contains(&s.task_id))
        .cloned()
        .collect();
    apply_suggestions(store, &chosen).await
}

/// Load the current snapshot, plan, and apply or hand back depending on the user's mode.
pub async fn check_and_reschedule<S>(store: &S, today: NaiveDate) -> Result<RescheduleReport>
where
    S: RecordStore + ?Sized,
{
    let prefs = store.load_preferences().await?;
    let tasks = store.list_tasks().await?;
    let cycles = store.list_cycles().await?;

    let planned = plan_reschedules(&tasks, &cycles, &prefs, today);
    debug!(target: "phasely::advisor", count = planned.len(), mode = ?prefs.rescheduling_behavior, "planned");

    match prefs.rescheduling_behavior {
        ReschedulingBehavior::Automatic => Ok(RescheduleReport {
            mode: prefs.rescheduling_behavior,
            suggestions: Vec::new(),
            rescheduled: apply_suggestions(store, &planned).await?,
        }),
        ReschedulingBehavior::AskPermission => Ok(RescheduleReport {
            mode: prefs.rescheduling_behavior,
            suggestions: planned,
            rescheduled: Vec::new(),
        }),
    }
}
