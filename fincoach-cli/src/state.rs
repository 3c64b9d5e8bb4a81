use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Overrides the default `~/.fincoach` location.
pub const HOME_ENV: &str = "FINCOACH_HOME";

pub fn fincoach_home() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".fincoach"))
}

pub fn ensure_fincoach_home() -> Result<PathBuf> {
    let dir = fincoach_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
