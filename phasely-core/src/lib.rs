//! phasely-core: phase-aware scheduling engine.
//!
//! Pure functions over snapshots of tasks, cycles and preferences. The only
//! I/O seam is [`store::RecordStore`], used by the rescheduling advisor.

pub mod calendar;
pub mod capacity;
pub mod cycle;
pub mod overload;
pub mod phase;
pub mod preferences;
pub mod pull_forward;
pub mod rescheduling;
pub mod scheduler;
pub mod scoring;
pub mod store;
pub mod task;
pub mod time;

pub use calendar::{
    cycle_day_for_date, phase_for_date, phase_for_date_advanced, phase_or_default,
    upcoming_phase_periods, PhasePeriod, DEFAULT_PHASE,
};
pub use capacity::{capacity, phase_multiplier, DEFAULT_DAILY_TASK_LIMIT};
pub use cycle::{
    average_cycle_length, average_menstrual_days, cycle_stats, log_period, predict_next_period,
    recompute_cycle_lengths, Cycle, CycleStats, LoggedPeriod,
};
pub use overload::{detect_overload_situations, Severity, Warning, WarningKind};
pub use phase::{Phase, PhaseWindow, PhaseWindows};
pub use preferences::{NotificationSettings, ReschedulingBehavior, ScoringWeights, UserPreferences};
pub use pull_forward::{
    suggest_pull_forward, EnergyMatchLabel, PullForwardGroup, PullForwardSuggestion,
};
pub use rescheduling::{
    accept_suggestions, apply_suggestions, check_and_reschedule, plan_reschedules,
    RescheduleReport, RescheduleSuggestion,
};
pub use scheduler::{
    place_task, schedule_task, schedule_task_with_alternatives, Placement, Relaxation,
    ScheduleOutcome,
};
pub use scoring::{score_date, EnergyFit, ScoreBreakdown, ScoreResult};
pub use store::{HistoryAction, HistoryEntry, MemoryStore, RecordStore, TaskUpdate};
pub use task::{EnergyLevel, Task};
