//! Record store contract between the engine and whatever persists its data.
//!
//! The engine itself only reads snapshots and returns plain values; the
//! advisor is the one place that writes back, and it does so through this trait.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::cycle::Cycle;
use crate::preferences::UserPreferences;
use crate::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Updated,
    Completed,
    Deleted,
    Split,
    Rescheduled,
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub task_id: String,
    pub action: HistoryAction,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Partial update to a task. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_scheduled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskUpdate {
    /// Engine-chosen move to `date`.
    pub fn reschedule(date: NaiveDate) -> Self {
        Self {
            scheduled_date: Some(date),
            auto_scheduled: Some(true),
            ..Self::default()
        }
    }

    pub fn complete(at: DateTime<Utc>) -> Self {
        Self {
            completed: Some(true),
            completed_at: Some(at),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(date) = self.scheduled_date {
            task.scheduled_date = Some(date);
        }
        if let Some(auto) = self.auto_scheduled {
            task.auto_scheduled = auto;
        }
        if let Some(done) = self.completed {
            task.completed = done;
            if !done {
                task.completed_at = None;
            }
        }
        if let Some(at) = self.completed_at {
            task.completed_at = Some(at);
        }
    }
}

/// Persistence the engine depends on. Errors pass through untouched.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn list_tasks(&self) -> Result<Vec<Task>>;
    async fn list_cycles(&self) -> Result<Vec<Cycle>>;
    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<()>;
    async fn append_history(
        &self,
        task_id: &str,
        action: HistoryAction,
        metadata: serde_json::Value,
    ) -> Result<()>;
    async fn load_preferences(&self) -> Result<UserPreferences>;
    async fn save_preferences(&self, prefs: &UserPreferences) -> Result<()>;
}

#[derive(Debug, Default)]
struct MemoryState {
    tasks: Vec<Task>,
    cycles: Vec<Cycle>,
    history: Vec<HistoryEntry>,
    preferences: UserPreferences,
}

/// In-process store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new(tasks: Vec<Task>, cycles: Vec<Cycle>, preferences: UserPreferences) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                tasks,
                cycles,
                history: Vec::new(),
                preferences,
            }),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    pub fn history(&self) -> Result<Vec<HistoryEntry>> {
        Ok(self.state()?.history.clone())
    }

    pub fn task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.state()?.tasks.iter().find(|t| t.id == id).cloned())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.state()?.tasks.clone())
    }

    async fn list_cycles(&self) -> Result<Vec<Cycle>> {
        Ok(self.state()?.cycles.clone())
    }

    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<()> {
        let mut state = self.state()?;
        let Some(task) = state.tasks.iter_mut().find(|t| t.id == id) else {
            bail!("task not found: {id}");
        };
        update.apply_to(task);
        Ok(())
    }

    async fn append_history(
        &self,
        task_id: &str,
        action: HistoryAction,
        metadata: serde_json::Value,
    ) -> Result<()> {
        self.state()?.history.push(HistoryEntry {
            task_id: task_id.to_string(),
            action,
            metadata,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    async fn load_preferences(&self) -> Result<UserPreferences> {
        Ok(self.state()?.preferences)
    }

    async fn save_preferences(&self, prefs: &UserPreferences) -> Result<()> {
        self.state()?.preferences = *prefs;
        Ok(())
    }
}
