use anyhow::Result;
use chrono::NaiveDate;
use clap::Subcommand;
use phasely_core::time::parse_iso_date;
use phasely_core::{
    capacity, check_and_reschedule, cycle_day_for_date, cycle_stats, log_period,
    phase_for_date_advanced, predict_next_period, upcoming_phase_periods, RecordStore,
    RescheduleReport, ReschedulingBehavior, DEFAULT_PHASE,
};

use crate::advice_cmd::print_report;
use crate::store::JsonStore;

#[derive(Subcommand, Debug)]
pub enum CycleCommand {
    /// Record a period; an overlapping earlier entry is replaced
    Log {
        /// First day of the period (YYYY-MM-DD)
        #[arg(long)]
        start: String,

        /// Last day of the period, if known
        #[arg(long)]
        end: Option<String>,
    },

    /// List logged cycles, newest first
    List,

    /// Averages, gap range and the next predicted start
    Stats,
}

pub async fn run(store: &JsonStore, cmd: CycleCommand, today: NaiveDate) -> Result<()> {
    match cmd {
        CycleCommand::Log { start, end } => log(store, &start, end.as_deref(), today).await,
        CycleCommand::List => list(store).await,
        CycleCommand::Stats => stats(store).await,
    }
}

async fn log(store: &JsonStore, start: &str, end: Option<&str>, today: NaiveDate) -> Result<()> {
    let start = parse_iso_date(start)?;
    let end = end.map(parse_iso_date).transpose()?;

    let existing = store.list_cycles().await?;
    let logged = log_period(existing, uuid::Uuid::new_v4().to_string(), start, end)?;
    store.save_cycles(&logged.cycles).await?;

    println!("Logged period starting {start}");
    for id in &logged.replaced {
        println!("  replaced overlapping entry {}", short(id));
    }

    if let Some(report) = refresh_after_cycle_change(store, today).await? {
        print_report(&report);
    }
    Ok(())
}

/// New cycle data can make earlier placements worse.
///
/// Automatic mode always re-places tasks; the notification toggle only decides
/// whether the report is handed back for display.
pub async fn refresh_after_cycle_change<S: RecordStore + ?Sized>(
    store: &S,
    today: NaiveDate,
) -> Result<Option<RescheduleReport>> {
    let prefs = store.load_preferences().await?;
    let notify = prefs.notifications.reschedule_suggestions;
    if prefs.rescheduling_behavior != ReschedulingBehavior::Automatic && !notify {
        return Ok(None);
    }
    let report = check_and_reschedule(store, today).await?;
    Ok(notify.then_some(report))
}

async fn list(store: &JsonStore) -> Result<()> {
    let mut cycles = store.list_cycles().await?;
    if cycles.is_empty() {
        println!("No cycles logged. Run: phasely cycle log --start YYYY-MM-DD");
        return Ok(());
    }
    cycles.sort_by(|a, b| b.start_date.cmp(&a.start_date));

    for c in &cycles {
        let end = c
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "?".to_string());
        let length = c
            .cycle_length
            .map(|l| format!("{l} days"))
            .unwrap_or_else(|| "current".to_string());
        println!(
            "{}  {} .. {}  period {}d  cycle {}",
            short(&c.id),
            c.start_date,
            end,
            c.menstrual_days(),
            length
        );
    }
    Ok(())
}

async fn stats(store: &JsonStore) -> Result<()> {
    let cycles = store.list_cycles().await?;
    let s = cycle_stats(&cycles);

    println!("Cycles logged:        {}", s.cycle_count);
    println!("Average cycle length: {} days", s.average_cycle_length);
    println!("Average period:       {} days", s.average_menstrual_days);
    if let (Some(lo), Some(hi)) = (s.shortest_gap, s.longest_gap) {
        println!("Gap range:            {lo}..{hi} days");
    }
    match predict_next_period(&cycles) {
        Some(next) => println!("Next period expected: {next}"),
        None => println!("Next period expected: (log a period first)"),
    }
    Ok(())
}

pub async fn phase(
    store: &JsonStore,
    date: Option<String>,
    days: Option<u32>,
    today: NaiveDate,
) -> Result<()> {
    let cycles = store.list_cycles().await?;
    let prefs = store.load_preferences().await?;
    let date = date.as_deref().map(parse_iso_date).transpose()?.unwrap_or(today);

    if let Some(days) = days {
        for p in upcoming_phase_periods(&cycles, date, days) {
            println!(
                "{} .. {}  {:<10}  {} tasks/day",
                p.start,
                p.end,
                p.phase,
                capacity(p.phase, prefs.daily_task_limit)
            );
        }
        return Ok(());
    }

    match phase_for_date_advanced(date, &cycles) {
        Some(phase) => {
            let day = cycle_day_for_date(date, &cycles)
                .map(|d| format!(" (cycle day {d})"))
                .unwrap_or_default();
            println!("{date}: {phase}{day}");
        }
        None => println!("{date}: no cycle data, assuming {DEFAULT_PHASE}"),
    }
    Ok(())
}

/// First 8 characters of an id, enough to tell uuids apart on screen.
pub fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
