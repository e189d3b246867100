//! Initialization helpers for `.simulator/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};

use super::config::{SimulatorConfig, write_config};
use super::input_store::write_input;
use crate::core::input::INPUT_SCHEMA;
use crate::core::presets::builtin_presets;

/// All canonical paths within `.simulator/` for a project root.
#[derive(Debug, Clone)]
pub struct SimulatorPaths {
    pub root: PathBuf,
    pub sim_dir: PathBuf,
    pub inputs_dir: PathBuf,
    pub config_path: PathBuf,
    pub schema_path: PathBuf,
}

impl SimulatorPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let sim_dir = root.join(".simulator");
        Self {
            root: root.clone(),
            sim_dir: sim_dir.clone(),
            inputs_dir: sim_dir.join("inputs"),
            config_path: sim_dir.join("config.toml"),
            schema_path: sim_dir.join("schema.json"),
        }
    }

    /// Location of the sample input written for a preset.
    pub fn input_path(&self, slug: &str) -> PathBuf {
        self.inputs_dir.join(format!("{slug}.json"))
    }
}

/// Options for `init_simulator`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite existing simulator-owned files.
    pub force: bool,
}

/// Create `.simulator/` scaffolding in `root`.
///
/// Fails if `.simulator/` already exists unless `options.force` is set.
pub fn init_simulator(root: &Path, options: &InitOptions) -> Result<SimulatorPaths> {
    let paths = SimulatorPaths::new(root);
    if paths.sim_dir.exists() && !paths.sim_dir.is_dir() {
        return Err(anyhow!(
            "simulator init: .simulator exists but is not a directory"
        ));
    }
    if paths.sim_dir.exists() && !options.force {
        return Err(anyhow!(
            "simulator init: .simulator already exists (use --force to overwrite)"
        ));
    }

    create_dir(&paths.sim_dir)?;
    create_dir(&paths.inputs_dir)?;

    write_config(&paths.config_path, &SimulatorConfig::default())?;
    fs::write(&paths.schema_path, INPUT_SCHEMA)
        .with_context(|| format!("write {}", paths.schema_path.display()))?;
    for preset in builtin_presets() {
        write_input(&paths.input_path(preset.slug), &preset.input)?;
    }

    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}
