//! Simulator configuration stored under `.simulator/config.toml`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::presets::builtin_presets;

/// Simulator configuration (TOML).
///
/// Edited by humans; missing fields fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Delay between two replay activations, in milliseconds.
    pub tick_interval_ms: u64,

    /// Absolute tolerance when comparing a result with its expected value.
    pub match_tolerance: f64,

    /// Preset loaded into a fresh session.
    pub default_preset: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 220,
            match_tolerance: 1e-9,
            default_preset: 0,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(anyhow!("tick_interval_ms must be > 0"));
        }
        if !self.match_tolerance.is_finite() || self.match_tolerance < 0.0 {
            return Err(anyhow!("match_tolerance must be a finite number >= 0"));
        }
        let preset_count = builtin_presets().len();
        if self.default_preset >= preset_count {
            return Err(anyhow!(
                "default_preset must be < {preset_count}, got {}",
                self.default_preset
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SimulatorConfig::default()`.
pub fn load_config(path: &Path) -> Result<SimulatorConfig> {
    if !path.exists() {
        let cfg = SimulatorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SimulatorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &SimulatorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, SimulatorConfig::default());
        assert_eq!(cfg.tick_interval(), Duration::from_millis(220));
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("config.toml");
        let cfg = SimulatorConfig {
            tick_interval_ms: 50,
            match_tolerance: 0.01,
            default_preset: 2,
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "tick_interval_ms = 40\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.tick_interval_ms, 40);
        assert_eq!(cfg.default_preset, 0);
    }

    #[test]
    fn rejects_zero_interval_and_unknown_preset() {
        let cfg = SimulatorConfig {
            tick_interval_ms: 0,
            ..SimulatorConfig::default()
        };
        assert!(cfg.validate().is_err());

        let cfg = SimulatorConfig {
            default_preset: 9,
            ..SimulatorConfig::default()
        };
        let err = cfg.validate().expect_err("should reject");
        assert!(err.to_string().contains("default_preset"));
    }
}
