use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use phasely_core::time::today_in_tz;
use phasely_core::{RecordStore, ReschedulingBehavior, UserPreferences};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::state::ensure_phasely_home;
use crate::store::JsonStore;

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write a default config.toml if none exists
    Init,

    /// Print the effective config
    Show,

    /// Set the base number of tasks per day (scaled per phase)
    SetLimit { limit: u32 },

    /// How reschedules are handled: automatic | ask_permission
    SetMode { mode: String },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: ProfileSection,
    #[serde(default)]
    pub preferences: UserPreferences,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSection {
    /// IANA zone used to decide what "today" is.
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for ProfileSection {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
        }
    }
}

fn default_timezone() -> String {
    "UTC".to_string()
}

impl Config {
    pub fn today(&self) -> Result<NaiveDate> {
        today_in_tz(Utc::now(), &self.profile.timezone)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_phasely_home()?.join("config.toml"))
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: Config = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    if let Err(e) = cfg.preferences.validate() {
        tracing::warn!(path = %path.display(), "preferences: {e}");
    }
    Ok(cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&p, &Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config() -> Result<()> {
    let p = config_path()?;
    let cfg = load_config_from(&p)?;
    if !p.exists() {
        println!("# {} not found; showing defaults", p.display());
    }
    print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
    Ok(())
}

pub async fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Init => init_config(),
        ConfigCommand::Show => show_config(),
        ConfigCommand::SetLimit { limit } => {
            if limit == 0 {
                bail!("daily task limit must be at least 1");
            }
            update_preferences(|p| p.daily_task_limit = limit).await?;
            println!("Daily task limit set to {limit}");
            Ok(())
        }
        ConfigCommand::SetMode { mode } => {
            let behavior: ReschedulingBehavior = mode.parse().map_err(anyhow::Error::msg)?;
            update_preferences(|p| p.rescheduling_behavior = behavior).await?;
            println!("Rescheduling mode set to {behavior:?}");
            Ok(())
        }
    }
}

async fn update_preferences(change: impl FnOnce(&mut UserPreferences)) -> Result<()> {
    let store = JsonStore::open()?;
    let mut prefs = store.load_preferences().await?;
    change(&mut prefs);
    store.save_preferences(&prefs).await
}
