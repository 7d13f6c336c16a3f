use anyhow::{bail, Result};
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use phasely_core::time::{parse_iso_date, parse_weekdays};
use phasely_core::{
    phase_or_default, schedule_task_with_alternatives, EnergyLevel, HistoryAction, RecordStore,
    Task, TaskUpdate,
};

use crate::cycle_cmd::short;
use crate::store::JsonStore;

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task; without --on it is placed automatically
    Add {
        name: String,

        /// low | medium | high
        #[arg(long)]
        energy: Option<String>,

        /// Hard deadline (YYYY-MM-DD); the task lands strictly before it
        #[arg(long)]
        deadline: Option<String>,

        /// Preferred weekdays, e.g. mon,wed,fri
        #[arg(long)]
        days: Option<String>,

        /// Pin to this date instead of auto-scheduling
        #[arg(long)]
        on: Option<String>,
    },

    /// List open tasks by date
    List {
        /// Include completed tasks
        #[arg(long, default_value_t = false)]
        all: bool,
    },

    /// Mark a task completed (id prefix accepted)
    Done { id: String },
}

pub async fn run(store: &JsonStore, cmd: TaskCommand, today: NaiveDate) -> Result<()> {
    match cmd {
        TaskCommand::Add {
            name,
            energy,
            deadline,
            days,
            on,
        } => add(store, name, energy, deadline, days, on, today).await,
        TaskCommand::List { all } => list(store, all).await,
        TaskCommand::Done { id } => done(store, &id).await,
    }
}

async fn add(
    store: &JsonStore,
    name: String,
    energy: Option<String>,
    deadline: Option<String>,
    days: Option<String>,
    on: Option<String>,
    today: NaiveDate,
) -> Result<()> {
    let mut task = Task::new(uuid::Uuid::new_v4().to_string(), name);
    if let Some(e) = energy {
        task = task.with_energy(e.parse::<EnergyLevel>().map_err(anyhow::Error::msg)?);
    }
    if let Some(d) = deadline {
        task = task.with_deadline(parse_iso_date(&d)?);
    }
    if let Some(d) = days {
        task = task.with_preferred_days(parse_weekdays(&d)?);
    }

    if let Some(on) = on {
        let date = parse_iso_date(&on)?;
        let task = task.scheduled_on(date);
        println!("Added {} on {date}", short(&task.id));
        return store.insert_task(task).await;
    }

    let existing = store.list_tasks().await?;
    let cycles = store.list_cycles().await?;
    let prefs = store.load_preferences().await?;

    let outcome = schedule_task_with_alternatives(&task, &existing, &cycles, &prefs, today);
    let task = task.auto_scheduled_on(outcome.date);

    println!(
        "Scheduled {} on {} ({} phase, score {:.0})",
        short(&task.id),
        outcome.date,
        outcome.score.phase,
        outcome.score.total_score
    );
    if !outcome.within_capacity {
        println!("  warning: {}", over_capacity_warning(&task));
    }
    if !outcome.alternatives.is_empty() {
        println!("  alternatives:");
        for alt in &outcome.alternatives {
            println!(
                "    {} ({} phase, score {:.0})",
                alt.date, alt.phase, alt.total_score
            );
        }
    }

    store.insert_task(task).await
}

async fn list(store: &JsonStore, all: bool) -> Result<()> {
    let cycles = store.list_cycles().await?;
    let mut tasks: Vec<Task> = store
        .list_tasks()
        .await?
        .into_iter()
        .filter(|t| all || !t.completed)
        .collect();
    if tasks.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    tasks.sort_by_key(|t| t.scheduled_date);

    for t in &tasks {
        let when = match t.scheduled_date {
            Some(d) => format!("{d} {:<10}", phase_or_default(d, &cycles).to_string()),
            None => format!("{:<21}", "unscheduled"),
        };
        let energy = t
            .energy_level
            .map(|e| format!("{e:?}").to_lowercase())
            .unwrap_or_else(|| "-".to_string());
        let mark = if t.completed {
            "x"
        } else if t.auto_scheduled {
            "a"
        } else {
            " "
        };
        let due = t
            .deadline
            .map(|d| format!("  due {d}"))
            .unwrap_or_default();
        println!("[{mark}] {}  {when}  {energy:<6}  {}{due}", short(&t.id), t.name);
    }
    Ok(())
}

/// Full id of the one task whose id starts with `prefix`.
pub fn resolve_id(tasks: &[Task], prefix: &str) -> Result<String> {
    let matches: Vec<&Task> = tasks.iter().filter(|t| t.id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [one] => Ok(one.id.clone()),
        [] => bail!("no task matches id {prefix}"),
        _ => bail!("id {prefix} is ambiguous ({} tasks)", matches.len()),
    }
}

async fn done(store: &JsonStore, prefix: &str) -> Result<()> {
    let tasks = store.list_tasks().await?;
    let id = resolve_id(&tasks, prefix)?;
    let at = Utc::now();
    store.update_task(&id, TaskUpdate::complete(at)).await?;
    store
        .append_history(
            &id,
            HistoryAction::Completed,
            serde_json::json!({ "completed_at": at }),
        )
        .await?;
    println!("Completed {}", short(&id));
    Ok(())
}

fn over_capacity_warning(task: &Task) -> &'static str {
    if task.deadline.is_some() {
        "every day before the deadline is already at capacity"
    } else {
        "every day in the next 60 days is already at capacity"
    }
}
