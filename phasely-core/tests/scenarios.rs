use chrono::NaiveDate;
use phasely_core::{
    check_and_reschedule, detect_overload_situations, log_period, schedule_task,
    schedule_task_with_alternatives, suggest_pull_forward, EnergyLevel, MemoryStore, Phase,
    RecordStore, ReschedulingBehavior, Severity, Task, UserPreferences, WarningKind,
};

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn january() -> Vec<phasely_core::Cycle> {
    log_period(vec![], "jan", d("2026-01-05"), Some(d("2026-01-09")))
        .unwrap()
        .cycles
}

#[test]
fn high_energy_task_lands_in_predicted_ovulation() {
    let task = Task::new("t", "investor pitch")
        .with_energy(EnergyLevel::High)
        .with_deadline(d("2026-02-20"));
    let out = schedule_task_with_alternatives(
        &task,
        &[],
        &january(),
        &UserPreferences::default(),
        d("2026-02-10"),
    );

    assert_eq!(out.date, d("2026-02-16"));
    assert_eq!(out.score.phase, Phase::Ovulation);
    assert!(out.within_capacity);
    // Sunday, the other ovulation day, is the runner-up.
    assert_eq!(out.alternatives[0].date, d("2026-02-15"));
    assert!(out.alternatives[0].total_score > 0.0);
}

#[test]
fn four_high_energy_tasks_in_a_logged_period() {
    let cycles = log_period(vec![], "mar", d("2026-03-02"), Some(d("2026-03-06")))
        .unwrap()
        .cycles;
    let tasks: Vec<Task> = ["03", "04", "05", "06"]
        .iter()
        .enumerate()
        .map(|(i, day)| {
            Task::new(format!("t{i}"), format!("task {i}"))
                .with_energy(EnergyLevel::High)
                .auto_scheduled_on(d(&format!("2026-03-{day}")))
        })
        .collect();

    let warnings = detect_overload_situations(&tasks, &cycles, &UserPreferences::default(), d("2026-03-02"));

    let overloads: Vec<_> = warnings.iter().filter(|w| w.kind == WarningKind::Overload).collect();
    assert_eq!(overloads.len(), 1);
    assert_eq!(overloads[0].severity, Severity::High);
    assert_eq!(
        warnings.iter().filter(|w| w.kind == WarningKind::EnergyMismatch).count(),
        4
    );
}

#[test]
fn scheduling_fills_days_up_to_capacity() {
    // No cycles: luteal everywhere, capacity 3.
    let today = d("2026-03-02");
    let prefs = UserPreferences::default();
    let mut placed: Vec<Task> = Vec::new();

    for i in 0..4 {
        let task = Task::new(format!("t{i}"), "same day please").with_deadline(d("2026-03-03"));
        let date = schedule_task(&task, &placed, &[], &prefs, today);
        assert_eq!(date, today);
        placed.push(task.auto_scheduled_on(date));
    }

    // The fourth one could only fit over capacity.
    let late = Task::new("late", "x").with_deadline(d("2026-03-03"));
    let out = schedule_task_with_alternatives(&late, &placed, &[], &prefs, today);
    assert!(!out.within_capacity);
}

#[test]
fn pull_forward_respects_slots_and_skips_deadlines() {
    let cycles = january();
    let today = d("2026-02-03");
    let mut tasks: Vec<Task> = (0..6)
        .map(|i| {
            Task::new(format!("h{i}"), "deep work")
                .with_energy(EnergyLevel::High)
                .auto_scheduled_on(d("2026-02-25"))
        })
        .collect();
    tasks.push(
        Task::new("dl", "has deadline")
            .with_energy(EnergyLevel::High)
            .with_deadline(d("2026-03-01"))
            .auto_scheduled_on(d("2026-02-25")),
    );

    let groups = suggest_pull_forward(&tasks, &cycles, &UserPreferences::default(), today);
    let first = &groups[0];
    assert_eq!(first.period.start, d("2026-02-15"));
    assert!(first.suggestions.len() <= first.available_slots);
    assert_eq!(first.available_slots, 5);
    assert!(first.suggestions.iter().all(|s| s.task_id != "dl"));
}

#[tokio::test]
async fn logging_a_new_period_triggers_reschedule() {
    // Task placed while only January was known, landing in what is now a period.
    let cycles = log_period(january(), "feb", d("2026-02-12"), Some(d("2026-02-16")))
        .unwrap()
        .cycles;
    let task = Task::new("t", "quarterly review")
        .with_energy(EnergyLevel::High)
        .with_deadline(d("2026-03-10"))
        .auto_scheduled_on(d("2026-02-16"));

    let prefs = UserPreferences {
        rescheduling_behavior: ReschedulingBehavior::Automatic,
        ..UserPreferences::default()
    };
    let store = MemoryStore::new(vec![task], cycles.clone(), prefs);
    let report = check_and_reschedule(&store, d("2026-02-12")).await.unwrap();

    assert_eq!(report.rescheduled.len(), 1);
    let moved = &store.list_tasks().await.unwrap()[0];
    let new_date = moved.scheduled_date.unwrap();
    assert_eq!(
        phasely_core::phase_or_default(new_date, &cycles),
        Phase::Ovulation
    );
}
