use anyhow::Result;
use chrono::NaiveDate;
use phasely_core::{
    accept_suggestions, apply_suggestions, check_and_reschedule, detect_overload_situations,
    suggest_pull_forward, RecordStore, RescheduleReport, RescheduleSuggestion, Severity,
};

use crate::cycle_cmd::short;
use crate::store::JsonStore;

pub async fn warnings(store: &JsonStore, today: NaiveDate) -> Result<()> {
    let prefs = store.load_preferences().await?;
    if !prefs.notifications.overload_warnings {
        println!("Overload warnings are turned off in config.toml.");
        return Ok(());
    }

    let tasks = store.list_tasks().await?;
    let cycles = store.list_cycles().await?;
    let found = detect_overload_situations(&tasks, &cycles, &prefs, today);
    if found.is_empty() {
        println!("No warnings for the next 30 days.");
        return Ok(());
    }

    for w in &found {
        let tag = match w.severity {
            Severity::High => "HIGH",
            Severity::Medium => "MED ",
            Severity::Low => "LOW ",
        };
        println!("[{tag}] {}", w.message);
        println!("       {}", w.recommendation);
    }
    Ok(())
}

fn print_suggestion(s: &RescheduleSuggestion) {
    println!(
        "  {}  {}: {} -> {}  (+{:.0}, {})",
        short(&s.task_id),
        s.task_name,
        s.current_date,
        s.suggested_date,
        s.improvement,
        s.reason
    );
}

pub fn print_report(report: &RescheduleReport) {
    if !report.rescheduled.is_empty() {
        println!("Rescheduled {} task(s):", report.rescheduled.len());
        report.rescheduled.iter().for_each(print_suggestion);
    }
    if !report.suggestions.is_empty() {
        println!("{} task(s) could move to a better day:", report.suggestions.len());
        report.suggestions.iter().for_each(print_suggestion);
        println!("Apply with: phasely reschedule --accept <id>... | --all");
    }
}

pub async fn reschedule(
    store: &JsonStore,
    accept: &[String],
    all: bool,
    today: NaiveDate,
) -> Result<()> {
    let (applied, pending) = settle_reschedules(store, accept, all, today).await?;
    if applied.is_empty() && pending.is_empty() {
        println!("Everything is already well placed.");
        return Ok(());
    }

    if !applied.is_empty() {
        println!("Applied {} change(s):", applied.len());
        applied.iter().for_each(print_suggestion);
    }
    if !pending.is_empty() {
        println!("{} task(s) could move to a better day:", pending.len());
        pending.iter().for_each(print_suggestion);
        println!("Apply with: phasely reschedule --accept <id>... | --all");
    }
    Ok(())
}

/// Runs a rescheduling pass and applies what the user asked for.
///
/// Returns (applied, still pending). Moves made by automatic mode count as applied.
async fn settle_reschedules<S: RecordStore + ?Sized>(
    store: &S,
    accept: &[String],
    all: bool,
    today: NaiveDate,
) -> Result<(Vec<RescheduleSuggestion>, Vec<RescheduleSuggestion>)> {
    let report = check_and_reschedule(store, today).await?;
    let mut applied = report.rescheduled;

    if all {
        applied.extend(apply_suggestions(store, &report.suggestions).await?);
        return Ok((applied, Vec::new()));
    }

    if !accept.is_empty() {
        let ids: Vec<String> = report
            .suggestions
            .iter()
            .filter(|s| accept.iter().any(|a| s.task_id.starts_with(a.as_str())))
            .map(|s| s.task_id.clone())
            .collect();
        applied.extend(accept_suggestions(store, &report.suggestions, &ids).await?);
        let pending = report
            .suggestions
            .into_iter()
            .filter(|s| !ids.contains(&s.task_id))
            .collect();
        return Ok((applied, pending));
    }

    Ok((applied, report.suggestions))
}

pub async fn pull_forward(store: &JsonStore, today: NaiveDate) -> Result<()> {
    let prefs = store.load_preferences().await?;
    if !prefs.notifications.pull_forward_suggestions {
        println!("Pull-forward suggestions are turned off in config.toml.");
        return Ok(());
    }

    let tasks = store.list_tasks().await?;
    let cycles = store.list_cycles().await?;
    let groups = suggest_pull_forward(&tasks, &cycles, &prefs, today);
    if groups.is_empty() {
        println!("Nothing to pull forward.");
        return Ok(());
    }

    for g in &groups {
        println!(
            "Ovulation {} .. {} ({} open slots):",
            g.period.start, g.period.end, g.available_slots
        );
        for s in &g.suggestions {
            println!(
                "  {}  {}: {} -> {}  [{:?} match, score {:.0}]",
                short(&s.task_id),
                s.task_name,
                s.current_date,
                s.suggested_date,
                s.energy_match,
                s.score
            );
        }
    }
    Ok(())
}
