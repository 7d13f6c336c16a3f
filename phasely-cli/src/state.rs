use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$PHASELY_HOME`, else `~/.phasely`.
pub fn phasely_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("PHASELY_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".phasely"))
}

pub fn ensure_phasely_home() -> Result<PathBuf> {
    let dir = phasely_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
