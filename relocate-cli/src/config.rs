use anyhow::{Context, Result};
use relocate_core::UpdateMode;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::state::{ensure_relocate_home, relocate_home};
use crate::todoist::DEFAULT_BASE_URL;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub todoist: TodoistSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodoistSection {
    pub base_url: String,

    /// Environment variable holding the bearer token.
    pub token_env: String,

    /// Send `project_id` and `parent_id` in one update. Only enable for API
    /// versions known to accept both fields together.
    pub combined_updates: bool,

    /// HTTP timeout per request, in seconds.
    pub timeout_secs: u64,
}

impl Default for TodoistSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_env: "TODOIST_API_TOKEN".to_string(),
            combined_updates: false,
            timeout_secs: 30,
        }
    }
}

impl TodoistSection {
    pub fn update_mode(&self) -> UpdateMode {
        if self.combined_updates {
            UpdateMode::Combined
        } else {
            UpdateMode::Sequential
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(relocate_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<PathBuf> {
    let p = ensure_relocate_home()?.join("config.toml");
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(p)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    let p = save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}
