use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$RELOCATE_HOME`, or `~/.relocate`.
pub fn relocate_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("RELOCATE_HOME") {
        if !dir.trim().is_empty() {
            return Ok(PathBuf::from(dir));
        }
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".relocate"))
}

pub fn ensure_relocate_home() -> Result<PathBuf> {
    let dir = relocate_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
