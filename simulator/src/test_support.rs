//! Test-only helpers for constructing inputs and scratch projects.

use std::path::Path;

use anyhow::Result;
use tempfile::TempDir;

use crate::core::input::{Direction, FactorInput, MsgType, NettingMode, SecType};
use crate::io::init::{InitOptions, SimulatorPaths, init_simulator};

/// Eligible futures position with unit multiplier and price.
pub fn position(hold_qty: i64, netting_mode: NettingMode, direction: Direction) -> FactorInput {
    FactorInput {
        sec_type: SecType::Fut,
        msg_type: MsgType::Position,
        hold_qty,
        buy_qty: 0,
        sell_qty: 0,
        multiplier: 1.0,
        latest_price: 1.0,
        direction,
        netting_mode,
    }
}

/// Eligible options trade with unit multiplier and price.
pub fn trade(
    buy_qty: i64,
    sell_qty: i64,
    netting_mode: NettingMode,
    direction: Direction,
) -> FactorInput {
    FactorInput {
        sec_type: SecType::Opt,
        msg_type: MsgType::Trade,
        hold_qty: 0,
        buy_qty,
        sell_qty,
        multiplier: 1.0,
        latest_price: 1.0,
        direction,
        netting_mode,
    }
}

/// Temporary project directory with `.simulator/` initialized.
pub struct TestProject {
    dir: TempDir,
    paths: SimulatorPaths,
}

impl TestProject {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let paths = init_simulator(dir.path(), &InitOptions { force: false })?;
        Ok(Self { dir, paths })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> &SimulatorPaths {
        &self.paths
    }
}
