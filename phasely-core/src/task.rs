//! Task model for the phase-aware scheduler.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Energy a task demands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyLevel {
    Low,
    Medium,
    High,
}

impl std::str::FromStr for EnergyLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(EnergyLevel::Low),
            "medium" | "med" => Ok(EnergyLevel::Medium),
            "high" => Ok(EnergyLevel::High),
            other => Err(format!("unknown energy level: {other}")),
        }
    }
}

/// Core task record.
///
/// Storage is an external concern; the engine only ever sees snapshots of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub energy_level: Option<EnergyLevel>,

    /// Hard deadline. Scheduling always lands strictly before this day.
    #[serde(default)]
    pub deadline: Option<NaiveDate>,

    /// Empty means no preference.
    #[serde(default)]
    pub preferred_days: Vec<Weekday>,

    #[serde(default)]
    pub scheduled_date: Option<NaiveDate>,

    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,

    /// True when the engine chose `scheduled_date`, false when the user did.
    #[serde(default)]
    pub auto_scheduled: bool,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            energy_level: None,
            deadline: None,
            preferred_days: Vec::new(),
            scheduled_date: None,
            completed: false,
            completed_at: None,
            auto_scheduled: false,
        }
    }

    pub fn with_energy(mut self, energy: EnergyLevel) -> Self {
        self.energy_level = Some(energy);
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_preferred_days(mut self, days: Vec<Weekday>) -> Self {
        self.preferred_days = days;
        self
    }

    /// Pin to a date chosen by the user.
    pub fn scheduled_on(mut self, date: NaiveDate) -> Self {
        self.scheduled_date = Some(date);
        self.auto_scheduled = false;
        self
    }

    /// Place on a date chosen by the engine.
    pub fn auto_scheduled_on(mut self, date: NaiveDate) -> Self {
        self.scheduled_date = Some(date);
        self.auto_scheduled = true;
        self
    }

    pub fn mark_completed(mut self, at: DateTime<Utc>) -> Self {
        self.completed = true;
        self.completed_at = Some(at);
        self
    }

    /// Incomplete and placed on the calendar.
    pub fn is_active(&self) -> bool {
        !self.completed && self.scheduled_date.is_some()
    }

    /// Incomplete and on `date`.
    pub fn is_open_on(&self, date: NaiveDate) -> bool {
        !self.completed && self.scheduled_date == Some(date)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("id must be non-empty".to_string());
        }
        if self.name.trim().is_empty() {
            return Err("name must be non-empty".to_string());
        }
        if self.completed_at.is_some() && !self.completed {
            return Err("completed_at set on an incomplete task".to_string());
        }
        Ok(())
    }
}

/// Open tasks on `date`, not counting the task identified by `exclude_id`.
pub fn open_task_count(tasks: &[Task], date: NaiveDate, exclude_id: Option<&str>) -> usize {
    tasks
        .iter()
        .filter(|t| t.is_open_on(date))
        .filter(|t| exclude_id != Some(t.id.as_str()))
        .count()
}
