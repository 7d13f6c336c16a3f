//! File-backed record store under the phasely home directory.
//!
//! tasks.json and cycles.json are rewritten whole; history.jsonl is append-only.
//! Preferences live in the `[preferences]` table of config.toml.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use phasely_core::{
    Cycle, HistoryAction, HistoryEntry, RecordStore, Task, TaskUpdate, UserPreferences,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::config::{load_config_from, save_config_to};
use crate::state::ensure_phasely_home;

pub struct JsonStore {
    home: PathBuf,
}

impl JsonStore {
    pub fn open() -> Result<Self> {
        Ok(Self::at(ensure_phasely_home()?))
    }

    pub fn at(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    fn tasks_path(&self) -> PathBuf {
        self.home.join("tasks.json")
    }

    fn cycles_path(&self) -> PathBuf {
        self.home.join("cycles.json")
    }

    fn history_path(&self) -> PathBuf {
        self.home.join("history.jsonl")
    }

    fn config_path(&self) -> PathBuf {
        self.home.join("config.toml")
    }

    pub async fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        write_json(&self.tasks_path(), &tasks).await
    }

    pub async fn save_cycles(&self, cycles: &[Cycle]) -> Result<()> {
        write_json(&self.cycles_path(), &cycles).await
    }

    /// Add a new task and record its creation.
    pub async fn insert_task(&self, task: Task) -> Result<()> {
        if let Err(e) = task.validate() {
            bail!("invalid task: {e}");
        }
        let mut tasks = self.list_tasks().await?;
        if tasks.iter().any(|t| t.id == task.id) {
            bail!("task already exists: {}", task.id);
        }
        let metadata = serde_json::json!({
            "name": task.name,
            "scheduled_date": task.scheduled_date,
            "auto_scheduled": task.auto_scheduled,
        });
        let id = task.id.clone();
        tasks.push(task);
        self.save_tasks(&tasks).await?;
        self.append_history(&id, HistoryAction::Created, metadata).await
    }

    /// Every history record, oldest first. Unparseable lines are skipped with a warning.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        let p = self.history_path();
        if !p.exists() {
            return Ok(Vec::new());
        }
        let s = fs::read_to_string(&p)
            .await
            .with_context(|| format!("read {}", p.display()))?;

        let mut entries = Vec::new();
        for (n, line) in s.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(
                    path = %p.display(),
                    line = n + 1,
                    "skipping malformed history line: {e}"
                ),
            }
        }
        Ok(entries)
    }
}

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Ok(T::default());
    }
    let s = fs::read_to_string(path)
        .await
        .with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)
        .await
        .with_context(|| format!("write {}", path.display()))
}

#[async_trait]
impl RecordStore for JsonStore {
    async fn list_tasks(&self) -> Result<Vec<Task>> {
        read_json(&self.tasks_path()).await
    }

    async fn list_cycles(&self) -> Result<Vec<Cycle>> {
        read_json(&self.cycles_path()).await
    }

    async fn update_task(&self, id: &str, update: TaskUpdate) -> Result<()> {
        let mut tasks = self.list_tasks().await?;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            bail!("task not found: {id}");
        };
        update.apply_to(task);
        self.save_tasks(&tasks).await
    }

    async fn append_history(
        &self,
        task_id: &str,
        action: HistoryAction,
        metadata: serde_json::Value,
    ) -> Result<()> {
        let entry = HistoryEntry {
            task_id: task_id.to_string(),
            action,
            metadata,
            timestamp: Utc::now(),
        };
        let p = self.history_path();
        let mut f = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&p)
            .await
            .with_context(|| format!("open {}", p.display()))?;
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        f.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn load_preferences(&self) -> Result<UserPreferences> {
        Ok(load_config_from(&self.config_path())?.preferences)
    }

    async fn save_preferences(&self, prefs: &UserPreferences) -> Result<()> {
        let p = self.config_path();
        let mut cfg = load_config_from(&p)?;
        cfg.preferences = *prefs;
        save_config_to(&p, &cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[tokio::test]
    async fn test_empty_home_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::at(dir.path());
        assert!(store.list_tasks().await.unwrap().is_empty());
        assert!(store.list_cycles().await.unwrap().is_empty());
        assert!(store.history().await.unwrap().is_empty());
        assert_eq!(store.load_preferences().await.unwrap(), UserPreferences::default());
    }

    #[tokio::test]
    async fn test_insert_update_and_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::at(dir.path());

        store
            .insert_task(Task::new("t1", "write").auto_scheduled_on(d("2026-03-02")))
            .await
            .unwrap();
        assert!(store.insert_task(Task::new("t1", "dup")).await.is_err());

        store
            .update_task("t1", TaskUpdate::reschedule(d("2026-03-05")))
            .await
            .unwrap();
        store
            .append_history("t1", HistoryAction::Rescheduled, serde_json::json!({"to": "2026-03-05"}))
            .await
            .unwrap();

        let tasks = store.list_tasks().await.unwrap();
        assert_eq!(tasks[0].scheduled_date, Some(d("2026-03-05")));

        let history = store.history().await.unwrap();
        let actions: Vec<HistoryAction> = history.iter().map(|h| h.action).collect();
        assert_eq!(actions, vec![HistoryAction::Created, HistoryAction::Rescheduled]);

        assert!(store.update_task("nope", TaskUpdate::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_history_skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::at(dir.path());

        store
            .append_history("t1", HistoryAction::Created, serde_json::json!({}))
            .await
            .unwrap();
        let path = dir.path().join("history.jsonl");
        let mut raw = std::fs::read_to_string(&path).unwrap();
        raw.push_str("{\"task_id\": truncated\n\n");
        std::fs::write(&path, raw).unwrap();
        store
            .append_history("t1", HistoryAction::Completed, serde_json::json!({}))
            .await
            .unwrap();

        let actions: Vec<HistoryAction> =
            store.history().await.unwrap().iter().map(|h| h.action).collect();
        assert_eq!(actions, vec![HistoryAction::Created, HistoryAction::Completed]);
    }

    #[tokio::test]
    async fn test_preferences_persist_in_config() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::at(dir.path());
        let prefs = UserPreferences {
            daily_task_limit: 9,
            ..UserPreferences::default()
        };
        store.save_preferences(&prefs).await.unwrap();
        assert_eq!(store.load_preferences().await.unwrap().daily_task_limit, 9);
        assert!(dir.path().join("config.toml").exists());
    }
}
